use serde::{Deserialize, Serialize};

/// Runtime lifecycle settings, loaded from a TOML file.
///
/// Every field carries a default so a partial (or empty) file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Idle duration in milliseconds after which a workspace is stopped.
    /// A non-positive value disables activity tracking entirely.
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: i64,

    /// Period in milliseconds between idle-reclamation scan passes.
    #[serde(default = "default_scan_period_ms")]
    pub scan_period_ms: u64,

    /// Whether persistent volumes are provisioned for workspace machines.
    #[serde(default = "default_volumes_enabled")]
    pub volumes_enabled: bool,

    /// Name of the shared persistent volume claim.
    #[serde(default = "default_claim_name")]
    pub claim_name: String,

    /// Requested size of the claim, as a resource-quantity string.
    #[serde(default = "default_claim_size")]
    pub claim_size: String,

    /// Access mode requested for the claim.
    #[serde(default = "default_claim_access_mode")]
    pub claim_access_mode: String,

    /// Path at which the projects volume is mounted inside containers.
    #[serde(default = "default_projects_mount_path")]
    pub projects_mount_path: String,

    /// Installer id that marks a machine as carrying the workspace agent.
    #[serde(default = "default_agent_installer_id")]
    pub agent_installer_id: String,

    /// Default log filter for the binary.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_idle_timeout_ms() -> i64 {
    3_600_000
}

fn default_scan_period_ms() -> u64 {
    60_000
}

fn default_volumes_enabled() -> bool {
    true
}

fn default_claim_name() -> String {
    "claim-workspace-projects".to_string()
}

fn default_claim_size() -> String {
    "10Gi".to_string()
}

fn default_claim_access_mode() -> String {
    "ReadWriteOnce".to_string()
}

fn default_projects_mount_path() -> String {
    "/projects".to_string()
}

fn default_agent_installer_id() -> String {
    "org.workspace.ws-agent".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            idle_timeout_ms: default_idle_timeout_ms(),
            scan_period_ms: default_scan_period_ms(),
            volumes_enabled: default_volumes_enabled(),
            claim_name: default_claim_name(),
            claim_size: default_claim_size(),
            claim_access_mode: default_claim_access_mode(),
            projects_mount_path: default_projects_mount_path(),
            agent_installer_id: default_agent_installer_id(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = toml::from_str(&content)?;
        Ok(settings)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "").unwrap();

        let settings = Settings::load(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.idle_timeout_ms, 3_600_000);
        assert_eq!(settings.projects_mount_path, "/projects");
        assert!(settings.volumes_enabled);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let mut settings = Settings::default();
        settings.idle_timeout_ms = 0;
        settings.claim_name = "claim-test".to_string();
        settings.save(path.to_str().unwrap()).unwrap();

        let reloaded = Settings::load(path.to_str().unwrap()).unwrap();
        assert_eq!(reloaded.idle_timeout_ms, 0);
        assert_eq!(reloaded.claim_name, "claim-test");
    }

    #[test]
    fn test_partial_file_overrides_only_named_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "scan_period_ms = 5000\nvolumes_enabled = false\n").unwrap();

        let settings = Settings::load(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.scan_period_ms, 5000);
        assert!(!settings.volumes_enabled);
        assert_eq!(settings.claim_size, "10Gi");
    }
}
