//! Immutable runtime event records emitted by the infrastructure watch
//! stream, and the fan-out dispatcher that routes them to registered
//! handlers.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// A pod- or container-level lifecycle notice.
///
/// `container_name` of `None` means the event is pod-scoped. Timestamps keep
/// the source platform's string format and are never reformatted. Equality
/// and hashing are structural over all fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuntimeEvent {
    pub pod_name: String,

    #[serde(default)]
    pub container_name: Option<String>,

    pub reason: String,

    pub message: String,

    #[serde(default)]
    pub creation_timestamp: Option<String>,

    #[serde(default)]
    pub last_timestamp: Option<String>,
}

impl RuntimeEvent {
    pub fn is_pod_scoped(&self) -> bool {
        self.container_name.is_none()
    }
}

/// Platform action tag attached to container-level events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContainerAction {
    Created,
    Started,
    Died,
    OutOfMemory,
    Destroyed,
    Other(String),
}

impl From<&str> for ContainerAction {
    fn from(action: &str) -> Self {
        match action {
            "create" => ContainerAction::Created,
            "start" => ContainerAction::Started,
            "die" => ContainerAction::Died,
            "oom" => ContainerAction::OutOfMemory,
            "destroy" => ContainerAction::Destroyed,
            other => ContainerAction::Other(other.to_string()),
        }
    }
}

/// Handler for pod-scoped events.
///
/// Handlers may see duplicated or relatively reordered events across watch
/// streams and must hand off non-trivial work instead of blocking the
/// dispatch thread.
pub trait PodEventHandler: Send + Sync {
    fn handle(&self, event: &RuntimeEvent);
}

/// Handler for container-scoped events.
pub trait ContainerEventHandler: Send + Sync {
    fn handle(&self, action: &ContainerAction, event: &RuntimeEvent);
}

/// Routes decoded runtime events to every registered handler.
///
/// Fan-out, not a pipeline: all handlers see every event, with no ordering
/// guarantee across handlers. Registration is safe concurrently with
/// in-flight dispatch; the handler list is snapshotted before invocation.
#[derive(Default)]
pub struct EventDispatcher {
    pod_handlers: RwLock<Vec<Arc<dyn PodEventHandler>>>,
    container_handlers: RwLock<Vec<Arc<dyn ContainerEventHandler>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_pod_handler(&self, handler: Arc<dyn PodEventHandler>) {
        self.pod_handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(handler);
    }

    pub fn register_container_handler(&self, handler: Arc<dyn ContainerEventHandler>) {
        self.container_handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(handler);
    }

    pub fn unregister_pod_handler(&self, handler: &Arc<dyn PodEventHandler>) {
        self.pod_handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|registered| !Arc::ptr_eq(registered, handler));
    }

    pub fn unregister_container_handler(&self, handler: &Arc<dyn ContainerEventHandler>) {
        self.container_handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|registered| !Arc::ptr_eq(registered, handler));
    }

    pub fn dispatch_pod_event(&self, event: &RuntimeEvent) {
        let handlers: Vec<_> = self
            .pod_handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for handler in handlers {
            handler.handle(event);
        }
    }

    pub fn dispatch_container_event(&self, action: &ContainerAction, event: &RuntimeEvent) {
        let handlers: Vec<_> = self
            .container_handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for handler in handlers {
            handler.handle(action, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_event(container: Option<&str>) -> RuntimeEvent {
        RuntimeEvent {
            pod_name: "workspace-pod".to_string(),
            container_name: container.map(str::to_string),
            reason: "Started".to_string(),
            message: "Started container".to_string(),
            creation_timestamp: Some("2024-01-15T10:00:00Z".to_string()),
            last_timestamp: None,
        }
    }

    struct CountingPodHandler {
        seen: AtomicUsize,
    }

    impl PodEventHandler for CountingPodHandler {
        fn handle(&self, _event: &RuntimeEvent) {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CountingContainerHandler {
        seen: AtomicUsize,
    }

    impl ContainerEventHandler for CountingContainerHandler {
        fn handle(&self, _action: &ContainerAction, _event: &RuntimeEvent) {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_all_pod_handlers_receive_every_event() {
        let dispatcher = EventDispatcher::new();
        let first = Arc::new(CountingPodHandler { seen: AtomicUsize::new(0) });
        let second = Arc::new(CountingPodHandler { seen: AtomicUsize::new(0) });
        dispatcher.register_pod_handler(first.clone());
        dispatcher.register_pod_handler(second.clone());

        dispatcher.dispatch_pod_event(&sample_event(None));
        dispatcher.dispatch_pod_event(&sample_event(None));

        assert_eq!(first.seen.load(Ordering::SeqCst), 2);
        assert_eq!(second.seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_container_events_carry_the_action() {
        let dispatcher = EventDispatcher::new();
        let handler = Arc::new(CountingContainerHandler { seen: AtomicUsize::new(0) });
        dispatcher.register_container_handler(handler.clone());

        dispatcher.dispatch_container_event(
            &ContainerAction::from("die"),
            &sample_event(Some("dev")),
        );

        assert_eq!(handler.seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unregistered_handler_stops_receiving_events() {
        let dispatcher = EventDispatcher::new();
        let handler = Arc::new(CountingPodHandler { seen: AtomicUsize::new(0) });
        let registered: Arc<dyn PodEventHandler> = handler.clone();
        dispatcher.register_pod_handler(registered.clone());

        dispatcher.dispatch_pod_event(&sample_event(None));
        dispatcher.unregister_pod_handler(&registered);
        dispatcher.dispatch_pod_event(&sample_event(None));

        assert_eq!(handler.seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_without_handlers_is_a_no_op() {
        let dispatcher = EventDispatcher::new();
        dispatcher.dispatch_pod_event(&sample_event(None));
    }

    struct RegisteringHandler {
        dispatcher: Arc<EventDispatcher>,
    }

    impl PodEventHandler for RegisteringHandler {
        fn handle(&self, _event: &RuntimeEvent) {
            self.dispatcher
                .register_pod_handler(Arc::new(CountingPodHandler { seen: AtomicUsize::new(0) }));
        }
    }

    #[test]
    fn test_registration_during_dispatch_does_not_deadlock() {
        let dispatcher = Arc::new(EventDispatcher::new());
        dispatcher.register_pod_handler(Arc::new(RegisteringHandler {
            dispatcher: dispatcher.clone(),
        }));

        dispatcher.dispatch_pod_event(&sample_event(None));
    }

    #[test]
    fn test_structural_equality_deduplicates_events() {
        let mut seen = HashSet::new();
        assert!(seen.insert(sample_event(Some("dev"))));
        assert!(!seen.insert(sample_event(Some("dev"))));
        assert!(seen.insert(sample_event(None)));
    }

    #[test]
    fn test_action_mapping() {
        assert_eq!(ContainerAction::from("start"), ContainerAction::Started);
        assert_eq!(ContainerAction::from("oom"), ContainerAction::OutOfMemory);
        assert_eq!(
            ContainerAction::from("health_status"),
            ContainerAction::Other("health_status".to_string())
        );
    }
}
