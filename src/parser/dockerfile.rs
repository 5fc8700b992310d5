use super::{check_recipe, machine_memory_limit, single_machine, EnvironmentParser};
use crate::core::RuntimeResult;
use crate::model::{BuildSource, ContainerConfig, NormalizedEnvironment, WorkspaceEnvironmentSpec};

pub const DOCKERFILE_RECIPE_TYPE: &str = "dockerfile";
pub const DOCKERFILE_CONTENT_TYPE: &str = "text/x-dockerfile";

/// Parses single-container recipes whose content is an inline Dockerfile.
pub struct DockerfileEnvironmentParser;

impl EnvironmentParser for DockerfileEnvironmentParser {
    fn recipe_type(&self) -> &str {
        DOCKERFILE_RECIPE_TYPE
    }

    fn content_type(&self) -> &str {
        DOCKERFILE_CONTENT_TYPE
    }

    fn parse(&self, spec: &WorkspaceEnvironmentSpec) -> RuntimeResult<NormalizedEnvironment> {
        check_recipe(self, spec)?;
        let (machine_name, machine) = single_machine(spec)?;

        let mut container = ContainerConfig::new(BuildSource::Inline {
            content: spec.recipe.content.clone(),
            content_type: spec.recipe.content_type.clone(),
        });
        for server in machine.servers.values() {
            container.exposed_ports.insert(server.port);
        }
        container.mem_limit_bytes = machine_memory_limit(machine_name, machine)?;

        let mut env = NormalizedEnvironment::new();
        env.containers.insert(machine_name.clone(), container);
        Ok(env)
    }
}
