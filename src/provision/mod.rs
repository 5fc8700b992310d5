//! The configuration provisioner pipeline: an ordered list of transformer
//! units, each mutating the normalized environment in place before the
//! backend launcher consumes it.

mod installer;
mod volume;

pub use installer::InstallerConfigProvisioner;
pub use volume::{VolumeOptions, WorkspaceVolumeProvisioner};

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::{RuntimeError, RuntimeResult};
use crate::model::{NormalizedEnvironment, WorkspaceEnvironmentSpec};

/// One transformer unit of the provisioning pipeline.
#[async_trait]
pub trait ConfigurationProvisioner: Send + Sync {
    /// Stable unit name used in failure diagnostics.
    fn name(&self) -> &str;

    async fn provision(
        &self,
        spec: &WorkspaceEnvironmentSpec,
        env: &mut NormalizedEnvironment,
    ) -> RuntimeResult<()>;
}

/// Runs registered provisioners in order, stopping at the first failure.
///
/// No rollback is attempted; the caller discards the half-mutated
/// environment.
#[derive(Default)]
pub struct ProvisionerPipeline {
    provisioners: Vec<Arc<dyn ConfigurationProvisioner>>,
}

impl ProvisionerPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, provisioner: Arc<dyn ConfigurationProvisioner>) {
        self.provisioners.push(provisioner);
    }

    pub async fn provision(
        &self,
        spec: &WorkspaceEnvironmentSpec,
        env: &mut NormalizedEnvironment,
    ) -> RuntimeResult<()> {
        for provisioner in &self.provisioners {
            if let Err(source) = provisioner.provision(spec, env).await {
                return Err(RuntimeError::Provisioning {
                    unit: provisioner.name().to_string(),
                    source: Box::new(source),
                });
            }
        }
        Ok(())
    }
}
