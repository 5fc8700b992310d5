use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Machine attribute holding an explicit memory limit in bytes.
pub const MEMORY_LIMIT_ATTRIBUTE: &str = "memoryLimitBytes";

/// Declarative, backend-agnostic description of a workspace environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceEnvironmentSpec {
    pub machines: HashMap<String, MachineConfig>,
    pub recipe: Recipe,
}

/// Per-machine section of a workspace environment spec.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Installer ids applied to the machine, resolved in dependency order.
    #[serde(default)]
    pub installers: Vec<String>,

    /// Servers the machine declares, keyed by server name.
    #[serde(default)]
    pub servers: HashMap<String, ServerConfig>,

    /// Free-form attributes, e.g. [`MEMORY_LIMIT_ATTRIBUTE`].
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

/// A server declared by a machine or contributed by an installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,

    #[serde(default = "default_protocol")]
    pub protocol: String,

    #[serde(default)]
    pub path: Option<String>,
}

fn default_protocol() -> String {
    "http".to_string()
}

/// Raw build/run instructions plus the tags used to select a parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(rename = "type")]
    pub type_tag: String,

    pub content_type: String,

    pub content: String,
}

impl WorkspaceEnvironmentSpec {
    /// Machine names joined for diagnostics, in stable order.
    pub fn machine_names(&self) -> String {
        let mut names: Vec<&str> = self.machines.keys().map(String::as_str).collect();
        names.sort_unstable();
        names.join(", ")
    }
}
