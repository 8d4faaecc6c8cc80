//! Rendered manifests and their conversion to structured resources
//!
//! A [`Manifest`] is one rendered text file that may hold several YAML
//! documents. [`Manifests`] keeps them in production order.

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::{CoreError, Result};
use crate::resource::{UnstructuredResource, UnstructuredResources};

/// One rendered text manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Source name (template path, archive entry, or `kind/name`)
    pub name: String,
    /// Raw YAML text, possibly multi-document
    pub content: String,
}

impl Manifest {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Parse every non-empty document of this manifest
    pub fn resources(&self) -> Result<Vec<UnstructuredResource>> {
        let mut resources = Vec::new();

        for (index, document) in serde_yaml::Deserializer::from_str(&self.content).enumerate() {
            let value = JsonValue::deserialize(document).map_err(|e| CoreError::InvalidManifest {
                name: self.name.clone(),
                message: format!("document {}: {}", index, e),
            })?;

            // Empty and comment-only documents
            if value.is_null() {
                continue;
            }

            if !value.is_object() {
                return Err(CoreError::InvalidManifest {
                    name: self.name.clone(),
                    message: format!("document {} is not a mapping", index),
                });
            }

            resources.push(UnstructuredResource::from_value(value)?);
        }

        Ok(resources)
    }
}

/// An ordered set of manifests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifests(pub Vec<Manifest>);

impl Manifests {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Convert to a flat resource list, preserving manifest and document order
    pub fn resource_list(&self) -> Result<UnstructuredResources> {
        let mut resources = Vec::new();
        for manifest in &self.0 {
            resources.extend(manifest.resources()?);
        }
        Ok(UnstructuredResources(resources))
    }

    /// Build one manifest per resource, named `kind/name`
    pub fn from_resources(resources: &[UnstructuredResource]) -> Result<Self> {
        resources
            .iter()
            .map(|resource| {
                let content =
                    serde_yaml::to_string(resource.inner()).map_err(|e| CoreError::Serialize {
                        message: e.to_string(),
                    })?;
                let name = format!(
                    "{}/{}",
                    resource.kind().unwrap_or("Unknown"),
                    resource.name().unwrap_or("unnamed")
                );
                Ok(Manifest::new(name, content))
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    pub fn push(&mut self, manifest: Manifest) {
        self.0.push(manifest);
    }

    pub fn extend(&mut self, other: Manifests) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Manifest> {
        self.0.iter()
    }
}

impl From<Vec<Manifest>> for Manifests {
    fn from(manifests: Vec<Manifest>) -> Self {
        Self(manifests)
    }
}
