use meshpack_core::{UnstructuredResources, VersionedApplicationSpec};

/// Keep only resources carrying every label the version requires
///
/// Without required labels the input is returned unchanged. An empty result
/// is not an error.
pub fn filter_by_label(
    spec: &VersionedApplicationSpec,
    resources: UnstructuredResources,
) -> UnstructuredResources {
    if spec.required_labels.is_empty() {
        return resources;
    }

    tracing::info!(labels = ?spec.required_labels, "filtering installed resources by label");
    for resource in resources.iter() {
        if !resource.has_labels(&spec.required_labels) {
            tracing::debug!(
                resource = %resource.key(),
                "dropping resource without required labels"
            );
        }
    }
    resources.with_labels(&spec.required_labels)
}
