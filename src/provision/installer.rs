use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;

use super::ConfigurationProvisioner;
use crate::core::{RuntimeError, RuntimeResult};
use crate::infra::{InstallerRegistry, ENVIRONMENT_PROPERTY};
use crate::model::{NormalizedEnvironment, WorkspaceEnvironmentSpec};

/// Label prefix describing declared servers, consumed downstream for
/// service/route discovery.
pub const SERVER_LABEL_PREFIX: &str = "org.workspace.server";

/// Applies installer-contributed configuration to each machine's container:
/// environment variables, exposed server ports and server-description
/// labels, in installer dependency order.
pub struct InstallerConfigProvisioner {
    registry: Arc<dyn InstallerRegistry>,
}

impl InstallerConfigProvisioner {
    pub fn new(registry: Arc<dyn InstallerRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ConfigurationProvisioner for InstallerConfigProvisioner {
    fn name(&self) -> &str {
        "installer-config"
    }

    async fn provision(
        &self,
        spec: &WorkspaceEnvironmentSpec,
        env: &mut NormalizedEnvironment,
    ) -> RuntimeResult<()> {
        for (machine_name, machine) in &spec.machines {
            if machine.installers.is_empty() {
                continue;
            }
            let installers = self.registry.resolve_ordered(&machine.installers).await?;
            let container = env.container_mut(machine_name).ok_or_else(|| {
                RuntimeError::Validation(format!(
                    "machine '{}' has no container in the normalized environment",
                    machine_name
                ))
            })?;

            for installer in installers {
                if let Some(raw) = installer.properties.get(ENVIRONMENT_PROPERTY) {
                    merge_environment(raw, &installer.id, &mut container.env);
                }
                for (server_name, server) in &installer.servers {
                    container.exposed_ports.insert(server.port);
                    container.labels.insert(
                        format!("{}.{}.ref", SERVER_LABEL_PREFIX, server.port),
                        server_name.clone(),
                    );
                    container.labels.insert(
                        format!("{}.{}.protocol", SERVER_LABEL_PREFIX, server.port),
                        server.protocol.clone(),
                    );
                }
                debug!(
                    "applied installer '{}' to machine '{}'",
                    installer.id, machine_name
                );
            }
        }
        Ok(())
    }
}

/// Merges comma-separated `KEY=VALUE` pairs into the container env map.
///
/// Pairs split on the first `=` only, so values may contain `=`. Malformed
/// pairs are skipped with a warning, never fatal.
fn merge_environment(
    raw: &str,
    installer_id: &str,
    env: &mut std::collections::HashMap<String, String>,
) {
    for pair in raw.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                env.insert(key.to_string(), value.to_string());
            }
            _ => warn!(
                "skipping malformed environment entry '{}' declared by installer '{}'",
                pair, installer_id
            ),
        }
    }
}
