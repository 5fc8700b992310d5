use super::{check_recipe, machine_memory_limit, single_machine, EnvironmentParser};
use crate::core::{RuntimeError, RuntimeResult};
use crate::model::{BuildSource, ContainerConfig, NormalizedEnvironment, WorkspaceEnvironmentSpec};

pub const DOCKERIMAGE_RECIPE_TYPE: &str = "dockerimage";
pub const DOCKERIMAGE_CONTENT_TYPE: &str = "text/x-dockerimage";

/// Parses single-container recipes whose content is a pullable image
/// reference.
pub struct DockerimageEnvironmentParser;

impl EnvironmentParser for DockerimageEnvironmentParser {
    fn recipe_type(&self) -> &str {
        DOCKERIMAGE_RECIPE_TYPE
    }

    fn content_type(&self) -> &str {
        DOCKERIMAGE_CONTENT_TYPE
    }

    fn parse(&self, spec: &WorkspaceEnvironmentSpec) -> RuntimeResult<NormalizedEnvironment> {
        check_recipe(self, spec)?;
        let (machine_name, machine) = single_machine(spec)?;

        let image = spec.recipe.content.trim();
        if image.is_empty() {
            return Err(RuntimeError::Validation(
                "dockerimage recipe content must be a non-empty image reference".to_string(),
            ));
        }

        let mut container = ContainerConfig::new(BuildSource::Image(image.to_string()));
        for server in machine.servers.values() {
            container.exposed_ports.insert(server.port);
        }
        container.mem_limit_bytes = machine_memory_limit(machine_name, machine)?;

        let mut env = NormalizedEnvironment::new();
        env.containers.insert(machine_name.clone(), container);
        Ok(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MachineConfig, Recipe};
    use std::collections::HashMap;

    fn dockerimage_spec(content: &str) -> WorkspaceEnvironmentSpec {
        let mut machines = HashMap::new();
        machines.insert("dev".to_string(), MachineConfig::default());
        WorkspaceEnvironmentSpec {
            machines,
            recipe: Recipe {
                type_tag: DOCKERIMAGE_RECIPE_TYPE.to_string(),
                content_type: DOCKERIMAGE_CONTENT_TYPE.to_string(),
                content: content.to_string(),
            },
        }
    }

    #[test]
    fn test_parse_sets_image_build_source() {
        let env = DockerimageEnvironmentParser
            .parse(&dockerimage_spec("  registry.local/dev/tools:latest \n"))
            .unwrap();

        assert_eq!(
            env.containers["dev"].build,
            BuildSource::Image("registry.local/dev/tools:latest".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_empty_image_reference() {
        let err = DockerimageEnvironmentParser
            .parse(&dockerimage_spec("   "))
            .unwrap_err();
        assert!(err.to_string().contains("image reference"));
    }

    #[test]
    fn test_parse_applies_the_same_topology_rules() {
        let mut spec = dockerimage_spec("alpine:3.18");
        spec.machines
            .insert("extra".to_string(), MachineConfig::default());

        let err = DockerimageEnvironmentParser.parse(&spec).unwrap_err();
        assert!(err.to_string().contains("exactly one machine"));
    }
}
