use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Where a container's image comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildSource {
    /// A pullable image reference.
    Image(String),

    /// Inline build content carried in the recipe.
    Inline { content: String, content_type: String },
}

/// Backend-specific configuration of one workspace container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    pub build: BuildSource,

    #[serde(default)]
    pub exposed_ports: BTreeSet<u16>,

    /// Environment variables, key unique, last write wins.
    #[serde(default)]
    pub env: HashMap<String, String>,

    #[serde(default)]
    pub labels: HashMap<String, String>,

    /// Memory limit in bytes, strictly positive when set.
    #[serde(default)]
    pub mem_limit_bytes: Option<i64>,

    #[serde(default)]
    pub mounts: Vec<VolumeMount>,
}

impl ContainerConfig {
    pub fn new(build: BuildSource) -> Self {
        Self {
            build,
            exposed_ports: BTreeSet::new(),
            env: HashMap::new(),
            labels: HashMap::new(),
            mem_limit_bytes: None,
            mounts: Vec::new(),
        }
    }
}

/// A persistent volume claim referenced by the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeClaimConfig {
    pub name: String,
    pub size: String,
    pub access_mode: String,
}

/// A claim-backed mount inside one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    /// Name of the pod-level volume this mount references.
    pub volume: String,
    pub mount_path: String,
}

/// Pod-level wiring from a named volume to its backing claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodVolume {
    pub name: String,
    pub claim: String,
}

/// Mutable, backend-specific runtime model produced by a parser and
/// transformed in place by the provisioner pipeline. Discarded after the
/// start operation; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEnvironment {
    pub containers: HashMap<String, ContainerConfig>,

    /// Claims keyed by name; insertion is idempotent.
    #[serde(default)]
    pub claims: HashMap<String, VolumeClaimConfig>,

    #[serde(default)]
    pub pod_volumes: Vec<PodVolume>,
}

impl NormalizedEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn container_mut(&mut self, machine_name: &str) -> Option<&mut ContainerConfig> {
        self.containers.get_mut(machine_name)
    }

    /// Adds the claim if no claim with the same name exists yet.
    pub fn ensure_claim(&mut self, claim: VolumeClaimConfig) {
        self.claims.entry(claim.name.clone()).or_insert(claim);
    }

    /// Adds the pod-level volume wiring if not already present.
    pub fn ensure_pod_volume(&mut self, volume: PodVolume) {
        if !self.pod_volumes.iter().any(|v| v.name == volume.name) {
            self.pod_volumes.push(volume);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_claim_is_idempotent() {
        let mut env = NormalizedEnvironment::new();
        let claim = VolumeClaimConfig {
            name: "claim-projects".to_string(),
            size: "10Gi".to_string(),
            access_mode: "ReadWriteOnce".to_string(),
        };

        env.ensure_claim(claim.clone());
        env.ensure_claim(VolumeClaimConfig {
            size: "20Gi".to_string(),
            ..claim.clone()
        });

        assert_eq!(env.claims.len(), 1);
        assert_eq!(env.claims["claim-projects"].size, "10Gi");
    }

    #[test]
    fn test_ensure_pod_volume_deduplicates_by_name() {
        let mut env = NormalizedEnvironment::new();
        let volume = PodVolume {
            name: "projects".to_string(),
            claim: "claim-projects".to_string(),
        };

        env.ensure_pod_volume(volume.clone());
        env.ensure_pod_volume(volume);

        assert_eq!(env.pod_volumes.len(), 1);
    }
}
