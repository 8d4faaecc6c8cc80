//! Generic Kubernetes-style resources

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::error::{CoreError, Result};

/// A structured resource of any kind, held as a JSON object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnstructuredResource(JsonValue);

impl UnstructuredResource {
    /// Wrap a JSON object; anything else is rejected
    pub fn from_value(value: JsonValue) -> Result<Self> {
        if value.is_object() {
            Ok(Self(value))
        } else {
            Err(CoreError::InvalidManifest {
                name: "<resource>".to_string(),
                message: "resource must be a mapping".to_string(),
            })
        }
    }

    pub fn kind(&self) -> Option<&str> {
        self.0.get("kind").and_then(JsonValue::as_str)
    }

    pub fn api_version(&self) -> Option<&str> {
        self.0.get("apiVersion").and_then(JsonValue::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata_str("name")
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata_str("namespace")
    }

    /// Identity key: `kind/namespace/name` (namespace omitted when unset)
    pub fn key(&self) -> String {
        let kind = self.kind().unwrap_or("Unknown");
        let name = self.name().unwrap_or("unnamed");
        match self.namespace() {
            Some(ns) => format!("{}/{}/{}", kind, ns, name),
            None => format!("{}/{}", kind, name),
        }
    }

    /// String labels under `metadata.labels`
    pub fn labels(&self) -> BTreeMap<String, String> {
        self.0
            .get("metadata")
            .and_then(|m| m.get("labels"))
            .and_then(JsonValue::as_object)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace `metadata.labels`, creating `metadata` if absent
    pub fn set_labels(&mut self, labels: BTreeMap<String, String>) {
        let labels = labels
            .into_iter()
            .map(|(k, v)| (k, JsonValue::String(v)))
            .collect();
        if let Some(metadata) = self.metadata_mut() {
            metadata.insert("labels".to_string(), JsonValue::Object(labels));
        }
    }

    /// Set (or overwrite) a single label
    pub fn set_label(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let mut labels = self.labels();
        labels.insert(key.into(), value.into());
        self.set_labels(labels);
    }

    /// True if every `key=value` pair of `required` is present
    pub fn has_labels(&self, required: &BTreeMap<String, String>) -> bool {
        let labels = self.labels();
        required
            .iter()
            .all(|(k, v)| labels.get(k).is_some_and(|actual| actual == v))
    }

    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    pub fn into_inner(self) -> JsonValue {
        self.0
    }

    fn metadata_str(&self, field: &str) -> Option<&str> {
        self.0
            .get("metadata")
            .and_then(|m| m.get(field))
            .and_then(JsonValue::as_str)
    }

    fn metadata_mut(&mut self) -> Option<&mut serde_json::Map<String, JsonValue>> {
        let root = self.0.as_object_mut()?;
        let metadata = root
            .entry("metadata")
            .or_insert_with(|| JsonValue::Object(serde_json::Map::new()));
        if !metadata.is_object() {
            *metadata = JsonValue::Object(serde_json::Map::new());
        }
        metadata.as_object_mut()
    }
}

/// An ordered list of resources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnstructuredResources(pub Vec<UnstructuredResource>);

impl UnstructuredResources {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Keep only resources carrying every required label
    pub fn with_labels(self, required: &BTreeMap<String, String>) -> Self {
        Self(
            self.0
                .into_iter()
                .filter(|resource| resource.has_labels(required))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UnstructuredResource> {
        self.0.iter()
    }

    /// Render as a multi-document YAML stream
    pub fn to_yaml_stream(&self) -> Result<String> {
        let mut out = String::new();
        for resource in &self.0 {
            let doc = serde_yaml::to_string(resource.inner()).map_err(|e| CoreError::Serialize {
                message: e.to_string(),
            })?;
            out.push_str("---\n");
            out.push_str(&doc);
        }
        Ok(out)
    }
}

impl From<Vec<UnstructuredResource>> for UnstructuredResources {
    fn from(resources: Vec<UnstructuredResource>) -> Self {
        Self(resources)
    }
}

impl IntoIterator for UnstructuredResources {
    type Item = UnstructuredResource;
    type IntoIter = std::vec::IntoIter<UnstructuredResource>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a UnstructuredResources {
    type Item = &'a UnstructuredResource;
    type IntoIter = std::slice::Iter<'a, UnstructuredResource>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(name: &str, labels: JsonValue) -> UnstructuredResource {
        UnstructuredResource::from_value(json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": {"name": name, "labels": labels}
        }))
        .unwrap()
    }

    fn required(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_accessors() {
        let r = UnstructuredResource::from_value(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "web", "namespace": "app"}
        }))
        .unwrap();

        assert_eq!(r.kind(), Some("Deployment"));
        assert_eq!(r.api_version(), Some("apps/v1"));
        assert_eq!(r.key(), "Deployment/app/web");
        assert!(r.labels().is_empty());
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(UnstructuredResource::from_value(json!(["a"])).is_err());
    }

    #[test]
    fn test_set_label_creates_metadata() {
        let mut r = UnstructuredResource::from_value(json!({"kind": "ConfigMap"})).unwrap();
        r.set_label("step", "crds");

        assert_eq!(r.labels().get("step").unwrap(), "crds");
    }

    #[test]
    fn test_set_label_preserves_existing() {
        let mut r = resource("web", json!({"app": "web"}));
        r.set_label("step", "one");

        assert_eq!(r.labels(), required(&[("app", "web"), ("step", "one")]));
    }

    #[test]
    fn test_with_labels() {
        let resources = UnstructuredResources(vec![
            resource("a", json!({"tier": "frontend"})),
            resource("b", json!({"tier": "backend"})),
            resource("c", json!({"tier": "frontend", "extra": "x"})),
            resource("d", json!({})),
            resource("e", json!({"tier": "frontend"})),
        ]);

        let filtered = resources.with_labels(&required(&[("tier", "frontend")]));
        let names: Vec<&str> = filtered.iter().filter_map(|r| r.name()).collect();

        assert_eq!(names, ["a", "c", "e"]);
        assert_eq!(filtered.0[1].labels().get("extra").unwrap(), "x");
    }

    #[test]
    fn test_with_labels_requires_exact_value() {
        let resources = UnstructuredResources(vec![resource("a", json!({"tier": "Frontend"}))]);
        assert!(resources.with_labels(&required(&[("tier", "frontend")])).is_empty());
    }
}
