//! Recipe parsers turning a declarative workspace spec into the normalized
//! runtime model, selected from a registry by recipe type tag.

mod dockerfile;
mod dockerimage;

pub use dockerfile::{DockerfileEnvironmentParser, DOCKERFILE_CONTENT_TYPE, DOCKERFILE_RECIPE_TYPE};
pub use dockerimage::{
    DockerimageEnvironmentParser, DOCKERIMAGE_CONTENT_TYPE, DOCKERIMAGE_RECIPE_TYPE,
};

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{RuntimeError, RuntimeResult};
use crate::model::{
    MachineConfig, NormalizedEnvironment, WorkspaceEnvironmentSpec, MEMORY_LIMIT_ATTRIBUTE,
};

/// Parses one recipe type into a normalized environment.
pub trait EnvironmentParser: Send + Sync {
    /// Recipe type tag this parser accepts.
    fn recipe_type(&self) -> &str;

    /// Recipe content type this parser accepts.
    fn content_type(&self) -> &str;

    fn parse(&self, spec: &WorkspaceEnvironmentSpec) -> RuntimeResult<NormalizedEnvironment>;
}

/// Parser lookup by recipe type tag.
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn EnvironmentParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Registry pre-populated with the built-in parsers.
    pub fn with_default_parsers() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DockerfileEnvironmentParser));
        registry.register(Arc::new(DockerimageEnvironmentParser));
        registry
    }

    pub fn register(&mut self, parser: Arc<dyn EnvironmentParser>) {
        self.parsers
            .insert(parser.recipe_type().to_string(), parser);
    }

    pub fn get(&self, recipe_type: &str) -> RuntimeResult<Arc<dyn EnvironmentParser>> {
        self.parsers.get(recipe_type).cloned().ok_or_else(|| {
            RuntimeError::Validation(format!(
                "no parser registered for recipe type '{}'",
                recipe_type
            ))
        })
    }

    /// Looks up the parser for the spec's recipe and runs it.
    pub fn parse(&self, spec: &WorkspaceEnvironmentSpec) -> RuntimeResult<NormalizedEnvironment> {
        self.get(&spec.recipe.type_tag)?.parse(spec)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_default_parsers()
    }
}

/// Checks the recipe tags against what a parser declares.
pub(crate) fn check_recipe(
    parser: &dyn EnvironmentParser,
    spec: &WorkspaceEnvironmentSpec,
) -> RuntimeResult<()> {
    if spec.recipe.type_tag != parser.recipe_type() {
        return Err(RuntimeError::Validation(format!(
            "recipe type '{}' does not match expected type '{}'",
            spec.recipe.type_tag,
            parser.recipe_type()
        )));
    }
    if spec.recipe.content_type != parser.content_type() {
        return Err(RuntimeError::Validation(format!(
            "recipe content type '{}' does not match expected content type '{}'",
            spec.recipe.content_type,
            parser.content_type()
        )));
    }
    Ok(())
}

/// Validates the exactly-one-machine topology and returns the single entry.
///
/// This is the only accessor single-container parsers use, so no machine is
/// ever referenced before the topology has been validated.
pub(crate) fn single_machine(
    spec: &WorkspaceEnvironmentSpec,
) -> RuntimeResult<(&String, &MachineConfig)> {
    let mut entries = spec.machines.iter();
    let Some(first) = entries.next() else {
        return Err(RuntimeError::Validation(
            "environment must declare at least one machine".to_string(),
        ));
    };
    if entries.next().is_some() {
        return Err(RuntimeError::Validation(format!(
            "a single-container recipe must declare exactly one machine, found: {}",
            spec.machine_names()
        )));
    }
    Ok(first)
}

/// Reads the machine's explicit memory limit attribute as integer bytes.
///
/// The value at this layer is a raw byte count, not a human-size string.
pub(crate) fn machine_memory_limit(
    machine_name: &str,
    machine: &MachineConfig,
) -> RuntimeResult<Option<i64>> {
    let Some(raw) = machine.attributes.get(MEMORY_LIMIT_ATTRIBUTE) else {
        return Ok(None);
    };
    let bytes: i64 = raw.parse().map_err(|_| {
        RuntimeError::Validation(format!(
            "machine '{}' declares a non-numeric memory limit '{}'",
            machine_name, raw
        ))
    })?;
    if bytes <= 0 {
        return Err(RuntimeError::Validation(format!(
            "machine '{}' declares a non-positive memory limit {}",
            machine_name, bytes
        )));
    }
    Ok(Some(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Recipe;

    fn spec_with_machines(names: &[&str]) -> WorkspaceEnvironmentSpec {
        let machines = names
            .iter()
            .map(|name| (name.to_string(), MachineConfig::default()))
            .collect();
        WorkspaceEnvironmentSpec {
            machines,
            recipe: Recipe {
                type_tag: DOCKERFILE_RECIPE_TYPE.to_string(),
                content_type: DOCKERFILE_CONTENT_TYPE.to_string(),
                content: "FROM alpine:3.18".to_string(),
            },
        }
    }

    #[test]
    fn test_unknown_recipe_type_is_rejected() {
        let registry = ParserRegistry::with_default_parsers();
        let mut spec = spec_with_machines(&["dev"]);
        spec.recipe.type_tag = "compose".to_string();

        let err = registry.parse(&spec).unwrap_err();
        assert!(matches!(err, RuntimeError::Validation(_)));
        assert!(err.to_string().contains("compose"));
    }

    #[test]
    fn test_single_machine_rejects_empty_topology() {
        let spec = spec_with_machines(&[]);
        let err = single_machine(&spec).unwrap_err();
        assert!(err.to_string().contains("at least one machine"));
    }

    #[test]
    fn test_single_machine_names_every_offender() {
        let spec = spec_with_machines(&["dev", "db"]);
        let err = single_machine(&spec).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("db"));
        assert!(message.contains("dev"));
    }

    #[test]
    fn test_memory_limit_parses_raw_bytes() {
        let mut machine = MachineConfig::default();
        machine
            .attributes
            .insert(MEMORY_LIMIT_ATTRIBUTE.to_string(), "2147483648".to_string());

        let limit = machine_memory_limit("dev", &machine).unwrap();
        assert_eq!(limit, Some(2_147_483_648));
    }

    #[test]
    fn test_memory_limit_rejects_human_size_strings() {
        let mut machine = MachineConfig::default();
        machine
            .attributes
            .insert(MEMORY_LIMIT_ATTRIBUTE.to_string(), "2Gi".to_string());

        let err = machine_memory_limit("dev", &machine).unwrap_err();
        assert!(err.to_string().contains("dev"));
    }

    #[test]
    fn test_memory_limit_rejects_non_positive_values() {
        let mut machine = MachineConfig::default();
        machine
            .attributes
            .insert(MEMORY_LIMIT_ATTRIBUTE.to_string(), "0".to_string());

        assert!(machine_memory_limit("dev", &machine).is_err());
    }
}
