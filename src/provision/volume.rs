use async_trait::async_trait;
use log::debug;

use super::ConfigurationProvisioner;
use crate::core::{RuntimeError, RuntimeResult, Settings};
use crate::model::{
    NormalizedEnvironment, PodVolume, VolumeClaimConfig, VolumeMount, WorkspaceEnvironmentSpec,
};

/// Volume provisioning configuration.
#[derive(Debug, Clone)]
pub struct VolumeOptions {
    pub enabled: bool,
    pub claim_name: String,
    pub claim_size: String,
    pub access_mode: String,
    pub mount_path: String,
    /// Installer id marking a machine as carrying the workspace agent.
    pub agent_installer_id: String,
}

impl VolumeOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            enabled: settings.volumes_enabled,
            claim_name: settings.claim_name.clone(),
            claim_size: settings.claim_size.clone(),
            access_mode: settings.claim_access_mode.clone(),
            mount_path: settings.projects_mount_path.clone(),
            agent_installer_id: settings.agent_installer_id.clone(),
        }
    }
}

/// Injects the shared projects volume into every machine that carries the
/// workspace agent: one stable named claim, a mount at the configured path
/// and the pod-level volume wiring.
///
/// When volume support is disabled the unit is a strict no-op.
pub struct WorkspaceVolumeProvisioner {
    options: VolumeOptions,
}

impl WorkspaceVolumeProvisioner {
    pub fn new(options: VolumeOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl ConfigurationProvisioner for WorkspaceVolumeProvisioner {
    fn name(&self) -> &str {
        "workspace-volume"
    }

    async fn provision(
        &self,
        spec: &WorkspaceEnvironmentSpec,
        env: &mut NormalizedEnvironment,
    ) -> RuntimeResult<()> {
        if !self.options.enabled {
            return Ok(());
        }

        for (machine_name, machine) in &spec.machines {
            let carries_agent = machine
                .installers
                .iter()
                .any(|id| id == &self.options.agent_installer_id);
            if !carries_agent {
                continue;
            }

            env.ensure_claim(VolumeClaimConfig {
                name: self.options.claim_name.clone(),
                size: self.options.claim_size.clone(),
                access_mode: self.options.access_mode.clone(),
            });
            env.ensure_pod_volume(PodVolume {
                name: self.options.claim_name.clone(),
                claim: self.options.claim_name.clone(),
            });

            let container = env.container_mut(machine_name).ok_or_else(|| {
                RuntimeError::Validation(format!(
                    "machine '{}' has no container in the normalized environment",
                    machine_name
                ))
            })?;
            container.mounts.push(VolumeMount {
                volume: self.options.claim_name.clone(),
                mount_path: self.options.mount_path.clone(),
            });
            debug!(
                "mounted claim '{}' at '{}' in machine '{}'",
                self.options.claim_name, self.options.mount_path, machine_name
            );
        }
        Ok(())
    }
}
