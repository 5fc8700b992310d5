pub mod runtime;
pub mod workspace;

pub use runtime::{
    BuildSource, ContainerConfig, NormalizedEnvironment, PodVolume, VolumeClaimConfig, VolumeMount,
};
pub use workspace::{
    MachineConfig, Recipe, ServerConfig, WorkspaceEnvironmentSpec, MEMORY_LIMIT_ATTRIBUTE,
};
