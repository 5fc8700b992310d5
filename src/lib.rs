//! Workspace runtime lifecycle management: parsing declarative workspace
//! environments into backend runtime configurations, provisioning them
//! through an ordered transformer pipeline, correlating infrastructure
//! runtime events to registered handlers, and reclaiming idle workspaces.

pub mod activity;
pub mod core;
pub mod events;
pub mod infra;
pub mod model;
pub mod parser;
pub mod provision;
pub mod size;

pub use crate::core::{RuntimeError, RuntimeResult, Settings};
pub use activity::{
    ActivityCheckScheduler, WorkspaceActivityTracker, STOPPED_BY_ACTIVITY_CHECKER_ATTRIBUTE,
};
pub use events::{
    ContainerAction, ContainerEventHandler, EventDispatcher, PodEventHandler, RuntimeEvent,
};
pub use infra::{
    Installer, InstallerRegistry, StaticInstallerRegistry, WorkspaceControl, WorkspaceSnapshot,
    WorkspaceStatus,
};
pub use model::{NormalizedEnvironment, WorkspaceEnvironmentSpec};
pub use parser::{EnvironmentParser, ParserRegistry};
pub use provision::{
    ConfigurationProvisioner, InstallerConfigProvisioner, ProvisionerPipeline, VolumeOptions,
    WorkspaceVolumeProvisioner,
};
