//! Application spec definition and loading
//!
//! An [`ApplicationSpec`] is the YAML document describing an installable
//! application: a list of versions, each with exactly one installation
//! source, a set of flavors (customization profiles), declared parameters and
//! the labels the rendered resources must carry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{CoreError, Result};

/// An application with all of its published versions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    /// Application name
    pub name: String,

    /// Description
    #[serde(default)]
    pub description: Option<String>,

    /// Published versions
    #[serde(default)]
    pub versions: Vec<VersionedApplicationSpec>,
}

impl ApplicationSpec {
    /// Load an application spec from a YAML file
    ///
    /// Relative archive paths in the file are resolved against the file's
    /// directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoreError::SpecNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let mut spec = Self::from_yaml(&content)?;
        if let Some(base) = path.parent() {
            spec.rebase_local_uris(base);
        }
        Ok(spec)
    }

    /// Parse an application spec from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Find a version by its version string
    pub fn version(&self, version: &str) -> Option<&VersionedApplicationSpec> {
        self.versions.iter().find(|v| v.version == version)
    }

    /// Rebase relative local archive paths of every version onto `base`
    pub fn rebase_local_uris(&mut self, base: &Path) {
        for version in &mut self.versions {
            version.rebase_local_uris(base);
        }
    }
}

/// One installable version of an application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedApplicationSpec {
    /// Version string (free form, e.g. "latest" or "2.1.0")
    pub version: String,

    /// Where the manifests come from
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub installation_spec: Option<InstallationSpec>,

    /// Values document shipped with the version
    #[serde(default)]
    pub values_yaml: String,

    /// Customization profiles
    #[serde(default)]
    pub flavors: Vec<Flavor>,

    /// Version-level parameters
    #[serde(default)]
    pub parameters: Vec<Parameter>,

    /// Labels every installed resource must carry
    #[serde(default)]
    pub required_labels: BTreeMap<String, String>,
}

impl VersionedApplicationSpec {
    /// Find a flavor by name
    pub fn flavor(&self, name: &str) -> Option<&Flavor> {
        self.flavors.iter().find(|f| f.name == name)
    }

    /// Rebase relative local archive paths onto `base`
    pub fn rebase_local_uris(&mut self, base: &Path) {
        match &mut self.installation_spec {
            Some(InstallationSpec::HelmArchive(location))
            | Some(InstallationSpec::ManifestsArchive(location)) => location.rebase(base),
            Some(InstallationSpec::InstallationSteps(steps)) => {
                for step in &mut steps.steps {
                    if let Some(StepSource::HelmArchive(location))
                    | Some(StepSource::ManifestsArchive(location)) = &mut step.source
                    {
                        location.rebase(base);
                    }
                }
            }
            Some(InstallationSpec::GithubChart(_)) | None => {}
        }
    }
}

/// Installation source of a version
///
/// Written in YAML as a single-key mapping, e.g. `helmArchive: {uri: ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InstallationSpec {
    /// A chart directory inside a GitHub repository
    GithubChart(GithubChartRef),
    /// A packaged chart archive
    HelmArchive(TgzLocation),
    /// An archive of already-rendered manifests
    ManifestsArchive(TgzLocation),
    /// Ordered, named installation steps
    InstallationSteps(InstallationSteps),
}

/// Source of a single installation step; steps never nest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepSource {
    GithubChart(GithubChartRef),
    HelmArchive(TgzLocation),
    ManifestsArchive(TgzLocation),
}

/// Reference to a chart inside a GitHub repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubChartRef {
    pub org: String,
    pub repo: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    #[serde(default)]
    pub directory: String,
}

impl fmt::Display for GithubChartRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "github.com/{}/{}@{}", self.org, self.repo, self.git_ref)?;
        if !self.directory.is_empty() {
            write!(f, ":{}", self.directory)?;
        }
        Ok(())
    }
}

/// Location of a `.tgz` archive
///
/// The URI is a plain path, a `file://` URI or a remote URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TgzLocation {
    pub uri: String,
}

impl TgzLocation {
    fn rebase(&mut self, base: &Path) {
        if self.uri.is_empty() || self.uri.contains("://") || Path::new(&self.uri).is_absolute() {
            return;
        }
        self.uri = base.join(&self.uri).display().to_string();
    }
}

/// Ordered installation steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationSteps {
    #[serde(default)]
    pub steps: Vec<InstallationStep>,
}

/// One named installation step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationStep {
    /// Step name, stamped on every resource the step produces
    #[serde(default)]
    pub name: String,

    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub source: Option<StepSource>,
}

/// A customization profile composed of ordered layers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flavor {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub customization_layers: Vec<CustomizationLayer>,

    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Flavor {
    /// Number of layers that must receive a selection
    pub fn required_layer_count(&self) -> usize {
        self.customization_layers
            .iter()
            .filter(|layer| !layer.optional)
            .count()
    }

    /// Find a declared layer by id
    pub fn layer(&self, layer_id: &str) -> Result<&CustomizationLayer> {
        self.customization_layers
            .iter()
            .find(|layer| layer.id == layer_id)
            .ok_or_else(|| CoreError::LayerNotFound {
                layer: layer_id.to_string(),
                flavor: self.name.clone(),
            })
    }

    /// Resolve a `(layer, option)` selection against this flavor
    pub fn get_layer_option(&self, layer_id: &str, option_id: &str) -> Result<&LayerOption> {
        self.layer(layer_id)?.option(option_id)
    }
}

/// An installation dimension, e.g. "observability"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationLayer {
    pub id: String,

    #[serde(default)]
    pub display_name: Option<String>,

    /// Skipped silently when no option is selected
    #[serde(default)]
    pub optional: bool,

    #[serde(default)]
    pub options: Vec<LayerOption>,

    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl CustomizationLayer {
    /// Find an option by id within this layer
    pub fn option(&self, option_id: &str) -> Result<&LayerOption> {
        self.options
            .iter()
            .find(|option| option.id == option_id)
            .ok_or_else(|| CoreError::OptionNotFound {
                layer: self.id.clone(),
                option: option_id.to_string(),
            })
    }
}

/// One concrete choice within a layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerOption {
    pub id: String,

    #[serde(default)]
    pub display_name: Option<String>,

    /// Values overlay (templatable YAML text)
    #[serde(default)]
    pub helm_values: String,

    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub resource_dependencies: Vec<ResourceDependency>,

    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// A resource an option needs to exist before install
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceDependency {
    #[serde(rename_all = "camelCase")]
    Secret {
        name: String,
        #[serde(default)]
        namespace: Option<String>,
    },
    CustomResourceDefinition { name: String },
}

/// A declared input parameter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Informative default shown to users
    #[serde(default)]
    pub default: Option<String>,

    #[serde(default)]
    pub required: bool,
}
