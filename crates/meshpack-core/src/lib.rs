//! Meshpack Core - Core types for composing application install manifests
//!
//! This crate provides the foundational types used throughout meshpack:
//! - `ApplicationSpec`: Versions, flavors, layers, options and parameters
//! - `ValuesInputs`: The per-request input bundle
//! - `Values`: Nested values documents with deep merge support
//! - `Manifests` / `UnstructuredResources`: Rendered output and its structured form

pub mod application;
pub mod archive;
pub mod error;
pub mod inputs;
pub mod manifest;
pub mod resource;
pub mod values;

pub use application::{
    ApplicationSpec, CustomizationLayer, Flavor, GithubChartRef, InstallationSpec,
    InstallationStep, InstallationSteps, LayerOption, Parameter, ResourceDependency, StepSource,
    TgzLocation, VersionedApplicationSpec,
};
pub use error::{CoreError, Result};
pub use inputs::{LayerInput, ResourceRef, ValuesInputs};
pub use manifest::{Manifest, Manifests};
pub use resource::{UnstructuredResource, UnstructuredResources};
pub use values::Values;
