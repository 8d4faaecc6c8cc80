//! CLI commands

pub mod template;
pub mod validate;

use clap::Args;
use meshpack_core::{ApplicationSpec, CoreError, Flavor, ResourceDependency, ValuesInputs, VersionedApplicationSpec};
use meshpack_render::BoxError;
use std::path::PathBuf;

use crate::error::{CliError, Result};
use crate::util::parse_key_value;

/// Which application version and flavor to use, and the user's selections
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Application spec file
    pub spec: PathBuf,

    /// Application version
    #[arg(long = "version")]
    pub version: String,

    /// Flavor of the version
    #[arg(long)]
    pub flavor: String,

    /// Select an option for a layer (layer=option)
    #[arg(long = "layer")]
    pub layers: Vec<String>,

    /// Set a parameter (name=value)
    #[arg(long = "param")]
    pub params: Vec<String>,
}

/// A loaded application version together with the selected flavor
pub struct Selection {
    pub application: String,
    pub version: VersionedApplicationSpec,
    pub flavor: Flavor,
}

impl SelectionArgs {
    /// Load the spec file and pick the requested version and flavor
    pub fn load(&self) -> Result<Selection> {
        let spec = ApplicationSpec::from_file(&self.spec).map_err(|e| match e {
            CoreError::SpecNotFound { .. } | CoreError::Io(_) => CliError::Io {
                message: e.to_string(),
            },
            other => CliError::spec(
                format!("failed to load {}", self.spec.display()),
                Some(other.to_string()),
            ),
        })?;

        let Some(version) = spec.version(&self.version) else {
            let available: Vec<&str> = spec.versions.iter().map(|v| v.version.as_str()).collect();
            return Err(CliError::spec(
                format!("version '{}' not found in application '{}'", self.version, spec.name),
                Some(format!("available versions: {}", available.join(", "))),
            ));
        };

        let Some(flavor) = version.flavor(&self.flavor) else {
            let available: Vec<&str> = version.flavors.iter().map(|f| f.name.as_str()).collect();
            return Err(CliError::spec(
                format!("flavor '{}' not found in version '{}'", self.flavor, version.version),
                Some(format!("available flavors: {}", available.join(", "))),
            ));
        };

        tracing::debug!(
            application = %spec.name,
            version = %version.version,
            flavor = %flavor.name,
            "loaded application spec"
        );

        Ok(Selection {
            application: spec.name.clone(),
            version: version.clone(),
            flavor: flavor.clone(),
        })
    }

    /// Start an input bundle carrying the flavor and the parsed selections
    ///
    /// The version's own values document becomes the spec-defined values.
    pub fn inputs(&self, selection: &Selection, name: &str, namespace: &str) -> Result<ValuesInputs> {
        let mut inputs = ValuesInputs::new(name, namespace)
            .with_flavor(selection.flavor.clone())
            .with_spec_values(selection.version.values_yaml.clone());

        for layer in &self.layers {
            let (layer_id, option_id) = parse_key_value(layer, "--layer", "layer=option")?;
            inputs = inputs.with_layer(layer_id, option_id);
        }
        for param in &self.params {
            let (name, value) = parse_key_value(param, "--param", "name=value")?;
            inputs = inputs.with_param(name, value);
        }

        Ok(inputs)
    }
}

/// Dependency hook for local runs: there is no cluster to check against
pub fn log_dependencies(dependencies: &[ResourceDependency]) -> std::result::Result<(), BoxError> {
    for dependency in dependencies {
        tracing::debug!(?dependency, "not checking resource dependency without a cluster");
    }
    Ok(())
}
