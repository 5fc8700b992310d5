//! Interfaces of the external collaborators the runtime core consumes: the
//! installer catalog and the workspace control surface. Backends supply the
//! real implementations; an in-memory registry is provided for tooling and
//! tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::RuntimeResult;
use crate::model::ServerConfig;

/// Installer property holding comma-separated `KEY=VALUE` environment pairs.
pub const ENVIRONMENT_PROPERTY: &str = "environment";

/// A named unit of post-start machine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installer {
    pub id: String,

    #[serde(default)]
    pub properties: HashMap<String, String>,

    /// Servers the installer contributes, keyed by server name.
    #[serde(default)]
    pub servers: HashMap<String, ServerConfig>,
}

impl Installer {
    pub fn bare(id: &str) -> Self {
        Self {
            id: id.to_string(),
            properties: HashMap::new(),
            servers: HashMap::new(),
        }
    }
}

/// Catalog resolving installer ids into dependency-ordered installers.
#[async_trait]
pub trait InstallerRegistry: Send + Sync {
    async fn resolve_ordered(&self, ids: &[String]) -> RuntimeResult<Vec<Installer>>;
}

/// Coarse workspace lifecycle states reported by the status-event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkspaceStatus {
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// Mutable view of a workspace held by the control collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    pub id: String,

    #[serde(default)]
    pub attributes: HashMap<String, String>,

    pub status: WorkspaceStatus,
}

/// Control surface for reading, updating and stopping workspaces.
#[async_trait]
pub trait WorkspaceControl: Send + Sync {
    async fn get_workspace(&self, id: &str) -> RuntimeResult<WorkspaceSnapshot>;

    async fn update_workspace(&self, snapshot: &WorkspaceSnapshot) -> RuntimeResult<()>;

    async fn stop_workspace(&self, id: &str) -> RuntimeResult<()>;
}

/// In-memory installer catalog.
///
/// Ids resolve in the requested order; ids without a registered entry
/// resolve to bare installers so dry runs work against a partial catalog.
#[derive(Debug, Default)]
pub struct StaticInstallerRegistry {
    installers: HashMap<String, Installer>,
}

impl StaticInstallerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, installer: Installer) {
        self.installers.insert(installer.id.clone(), installer);
    }
}

#[async_trait]
impl InstallerRegistry for StaticInstallerRegistry {
    async fn resolve_ordered(&self, ids: &[String]) -> RuntimeResult<Vec<Installer>> {
        Ok(ids
            .iter()
            .map(|id| {
                self.installers
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| Installer::bare(id))
            })
            .collect())
    }
}
