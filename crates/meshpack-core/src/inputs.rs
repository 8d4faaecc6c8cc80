//! Per-request render inputs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::application::Flavor;

/// A `(layer, option)` selection made by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerInput {
    pub layer_id: String,
    pub option_id: String,
}

impl LayerInput {
    pub fn new(layer_id: impl Into<String>, option_id: impl Into<String>) -> Self {
        Self {
            layer_id: layer_id.into(),
            option_id: option_id.into(),
        }
    }
}

/// Reference to a named, namespaced resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub name: String,
    pub namespace: String,
}

/// The working state of one render request
///
/// Built fresh per request and threaded by value through the pipeline. It is
/// also the data context for template expressions inside its own text
/// fields, so its serialized field names (`name`, `installNamespace`,
/// `meshRef.name`, `params.<key>`, ...) are what templates refer to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuesInputs {
    /// Release name
    pub name: String,

    /// Target namespace
    pub install_namespace: String,

    /// Selected customization profile
    pub flavor: Flavor,

    /// Layer selections, in caller order
    #[serde(default)]
    pub layers: Vec<LayerInput>,

    /// The mesh the application is installed into
    #[serde(default)]
    pub mesh_ref: ResourceRef,

    /// User-supplied values overrides
    #[serde(default)]
    pub user_defined_values: String,

    /// Values shipped with the application version
    #[serde(default)]
    pub spec_defined_values: String,

    /// Parameter values, keyed by (possibly dotted) parameter name
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl ValuesInputs {
    /// Create inputs for a release with an empty flavor
    pub fn new(name: impl Into<String>, install_namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            install_namespace: install_namespace.into(),
            ..Self::default()
        }
    }

    /// Set the selected flavor
    pub fn with_flavor(mut self, flavor: Flavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// Add a layer selection
    pub fn with_layer(mut self, layer_id: impl Into<String>, option_id: impl Into<String>) -> Self {
        self.layers.push(LayerInput::new(layer_id, option_id));
        self
    }

    /// Set a parameter value
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Set the spec-defined values text
    pub fn with_spec_values(mut self, values: impl Into<String>) -> Self {
        self.spec_defined_values = values.into();
        self
    }

    /// Set the user-defined values text
    pub fn with_user_values(mut self, values: impl Into<String>) -> Self {
        self.user_defined_values = values.into();
        self
    }

    /// Set the mesh reference
    pub fn with_mesh(mut self, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.mesh_ref = ResourceRef {
            name: name.into(),
            namespace: namespace.into(),
        };
        self
    }
}
