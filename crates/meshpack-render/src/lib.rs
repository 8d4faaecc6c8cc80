//! Meshpack Render - Manifest composition pipeline
//!
//! Turns an application version, a flavor and the caller's selections into
//! the exact set of resources to install:
//! - Input validation against layers, options and declared parameters
//! - Single-pass template expansion of the input bundle (MiniJinja)
//! - Values coalescing with spec < layer < params < user precedence
//! - Manifest acquisition from charts, archives or ordered installation steps
//! - Required-label filtering

pub mod acquire;
pub mod coalesce;
pub mod dependency;
pub mod engine;
pub mod error;
pub mod expand;
pub mod filter;
pub mod filters;
pub mod local;
pub mod renderer;
pub mod sources;
pub mod validate;

pub use acquire::{INSTALLATION_STEP_LABEL, get_manifests_from_application_spec};
pub use coalesce::compute_value_overrides;
pub use dependency::{DependencyValidator, NoopValidator};
pub use engine::{Engine, EngineBuilder};
pub use error::{
    BoxError, RenderError, Result, SourceError, TemplateError, TemplateErrorKind, ValuesOrigin,
};
pub use expand::exec_input_values_templates;
pub use filter::filter_by_label;
pub use local::{DEFAULT_KUBE_VERSION, LocalArchiveFetcher, LocalChartRenderer};
#[allow(deprecated)]
pub use renderer::compute_resources_for_application;
pub use renderer::{ManifestRenderer, ManifestRendererBuilder};
pub use sources::{ArchiveFetcher, ChartRenderer, ChartSource};
pub use validate::validate_inputs;
