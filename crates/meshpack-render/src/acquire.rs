//! Manifest acquisition
//!
//! Dispatches on the installation source of a version. Chart sources are
//! rendered with the coalesced values document; manifest archives are
//! fetched as-is. Ordered steps acquire each step's source in turn and stamp
//! every produced resource with [`INSTALLATION_STEP_LABEL`].

use meshpack_core::{
    InstallationSpec, InstallationSteps, Manifests, StepSource, ValuesInputs,
    VersionedApplicationSpec,
};
use std::collections::BTreeSet;

use crate::coalesce::compute_value_overrides;
use crate::error::{RenderError, Result};
use crate::sources::{ArchiveFetcher, ChartRenderer, ChartSource};

/// Label naming the installation step that produced a resource
pub const INSTALLATION_STEP_LABEL: &str = "meshpack.io/installation-step";

/// Acquire the manifests for `spec`'s installation source
pub async fn get_manifests_from_application_spec(
    charts: &dyn ChartRenderer,
    archives: &dyn ArchiveFetcher,
    inputs: &ValuesInputs,
    spec: &VersionedApplicationSpec,
) -> Result<Manifests> {
    match &spec.installation_spec {
        Some(InstallationSpec::GithubChart(chart)) => {
            render_chart(charts, ChartSource::Github(chart), inputs).await
        }
        Some(InstallationSpec::HelmArchive(location)) => {
            render_chart(charts, ChartSource::Archive(&location.uri), inputs).await
        }
        Some(InstallationSpec::ManifestsArchive(location)) => {
            fetch_archive(archives, &location.uri, inputs).await
        }
        Some(InstallationSpec::InstallationSteps(steps)) => {
            get_manifests_from_steps(charts, archives, steps, inputs).await
        }
        None => Err(RenderError::MissingInstallSpec),
    }
}

async fn get_manifests_from_steps(
    charts: &dyn ChartRenderer,
    archives: &dyn ArchiveFetcher,
    steps: &InstallationSteps,
    inputs: &ValuesInputs,
) -> Result<Manifests> {
    check_step_names(steps)?;

    let mut combined = Manifests::new();
    for step in &steps.steps {
        tracing::debug!(step = %step.name, "acquiring installation step");

        let manifests = match &step.source {
            Some(StepSource::GithubChart(chart)) => {
                render_chart(charts, ChartSource::Github(chart), inputs).await?
            }
            Some(StepSource::HelmArchive(location)) => {
                render_chart(charts, ChartSource::Archive(&location.uri), inputs).await?
            }
            Some(StepSource::ManifestsArchive(location)) => {
                fetch_archive(archives, &location.uri, inputs).await?
            }
            None => return Err(RenderError::MissingInstallSpec),
        };

        let mut resources = manifests
            .resource_list()
            .map_err(RenderError::FailedToConvertManifests)?;
        for resource in resources.0.iter_mut() {
            resource.set_label(INSTALLATION_STEP_LABEL, step.name.as_str());
        }

        tracing::debug!(step = %step.name, resources = resources.len(), "labeled step resources");
        combined.extend(
            Manifests::from_resources(&resources.0).map_err(RenderError::FailedToConvertManifests)?,
        );
    }

    Ok(combined)
}

/// Step names must be present and unique (case-sensitive)
fn check_step_names(steps: &InstallationSteps) -> Result<()> {
    if steps.steps.is_empty() {
        return Err(RenderError::NoInstallationSteps);
    }

    let mut seen = BTreeSet::new();
    for (index, step) in steps.steps.iter().enumerate() {
        if step.name.is_empty() {
            return Err(RenderError::UnnamedInstallationStep { index });
        }
        if !seen.insert(step.name.as_str()) {
            return Err(RenderError::DuplicateStepName {
                name: step.name.clone(),
            });
        }
    }

    Ok(())
}

async fn render_chart(
    charts: &dyn ChartRenderer,
    source: ChartSource<'_>,
    inputs: &ValuesInputs,
) -> Result<Manifests> {
    let values = compute_value_overrides(inputs)?;
    tracing::info!(source = %source, values = %values, "rendering with values");

    match charts
        .render(source, &values, &inputs.name, &inputs.install_namespace, "")
        .await
    {
        Ok(manifests) => Ok(manifests),
        Err(cause) => {
            tracing::error!(
                source = %source,
                values = %values,
                release_name = %inputs.name,
                namespace = %inputs.install_namespace,
                kube_version = "",
                error = %cause,
                "error rendering manifests"
            );
            Err(RenderError::failed_to_render(source.to_string(), values, inputs, cause))
        }
    }
}

async fn fetch_archive(
    archives: &dyn ArchiveFetcher,
    uri: &str,
    inputs: &ValuesInputs,
) -> Result<Manifests> {
    archives.fetch_manifests(uri).await.map_err(|cause| {
        tracing::error!(
            manifests_archive = uri,
            release_name = %inputs.name,
            namespace = %inputs.install_namespace,
            error = %cause,
            "error fetching manifests archive"
        );
        RenderError::failed_to_render(uri, "", inputs, cause)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use async_trait::async_trait;
    use meshpack_core::{GithubChartRef, InstallationStep, Manifest, TgzLocation};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingCharts {
        calls: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl ChartRenderer for RecordingCharts {
        async fn render(
            &self,
            source: ChartSource<'_>,
            values: &str,
            release_name: &str,
            _namespace: &str,
            kube_version: &str,
        ) -> std::result::Result<Manifests, SourceError> {
            assert_eq!(kube_version, "");
            self.calls
                .lock()
                .unwrap()
                .push((source.to_string(), values.to_string()));
            if self.fail {
                return Err(SourceError::failed("chart exploded"));
            }
            let content =
                format!("kind: ConfigMap\nmetadata:\n  name: {}-{}\n", release_name, source);
            Ok(Manifests::from(vec![Manifest::new("cm.yaml", content)]))
        }
    }

    #[derive(Default)]
    struct RecordingArchives {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ArchiveFetcher for RecordingArchives {
        async fn fetch_manifests(&self, uri: &str) -> std::result::Result<Manifests, SourceError> {
            self.calls.lock().unwrap().push(uri.to_string());
            Ok(Manifests::from(vec![Manifest::new(
                "crd.yaml",
                "kind: CustomResourceDefinition\nmetadata:\n  name: a\n  labels:\n    keep: me\n---\nkind: CustomResourceDefinition\nmetadata:\n  name: b\n",
            )]))
        }
    }

    fn spec(installation_spec: Option<InstallationSpec>) -> VersionedApplicationSpec {
        VersionedApplicationSpec {
            version: "v1".to_string(),
            installation_spec,
            ..VersionedApplicationSpec::default()
        }
    }

    fn step(name: &str, source: StepSource) -> InstallationStep {
        InstallationStep {
            name: name.to_string(),
            source: Some(source),
        }
    }

    fn archive(uri: &str) -> TgzLocation {
        TgzLocation {
            uri: uri.to_string(),
        }
    }

    fn steps(steps: Vec<InstallationStep>) -> Option<InstallationSpec> {
        Some(InstallationSpec::InstallationSteps(InstallationSteps { steps }))
    }

    #[tokio::test]
    async fn test_helm_archive_rendered_with_coalesced_values() {
        let charts = RecordingCharts::default();
        let archives = RecordingArchives::default();
        let inputs = ValuesInputs::new("demo", "app").with_spec_values("replicaCount: 1");
        let spec = spec(Some(InstallationSpec::HelmArchive(archive("/charts/web.tgz"))));

        let manifests = get_manifests_from_application_spec(&charts, &archives, &inputs, &spec)
            .await
            .unwrap();

        assert_eq!(manifests.len(), 1);
        assert_eq!(
            *charts.calls.lock().unwrap(),
            vec![("/charts/web.tgz".to_string(), "replicaCount: 1\n".to_string())]
        );
        assert!(archives.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_manifests_archive_fetched_without_values() {
        let charts = RecordingCharts::default();
        let archives = RecordingArchives::default();
        let inputs = ValuesInputs::new("demo", "app").with_user_values("not: [valid");
        let spec = spec(Some(InstallationSpec::ManifestsArchive(archive("file:///m.tgz"))));

        let manifests = get_manifests_from_application_spec(&charts, &archives, &inputs, &spec)
            .await
            .unwrap();

        assert_eq!(manifests.resource_list().unwrap().len(), 2);
        assert!(charts.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_install_spec() {
        let err = get_manifests_from_application_spec(
            &RecordingCharts::default(),
            &RecordingArchives::default(),
            &ValuesInputs::new("demo", "app"),
            &spec(None),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RenderError::MissingInstallSpec));
    }

    #[tokio::test]
    async fn test_render_failure_carries_request_context() {
        let charts = RecordingCharts {
            fail: true,
            ..RecordingCharts::default()
        };
        let chart = GithubChartRef {
            org: "solo-io".into(),
            repo: "charts".into(),
            git_ref: "v1".into(),
            directory: "web".into(),
        };
        let inputs = ValuesInputs::new("demo", "app").with_spec_values("a: b");
        let spec = spec(Some(InstallationSpec::GithubChart(chart)));

        let err = get_manifests_from_application_spec(
            &charts,
            &RecordingArchives::default(),
            &inputs,
            &spec,
        )
        .await
        .unwrap_err();

        match err {
            RenderError::FailedToRenderManifests {
                source_ref,
                values,
                release_name,
                namespace,
                cause,
            } => {
                assert_eq!(source_ref, "github.com/solo-io/charts@v1:web");
                assert_eq!(values, "a: b\n");
                assert_eq!(release_name, "demo");
                assert_eq!(namespace, "app");
                assert_eq!(cause.to_string(), "chart exploded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_steps_labeled_in_order() {
        let charts = RecordingCharts::default();
        let archives = RecordingArchives::default();
        let spec = spec(steps(vec![
            step("crds", StepSource::ManifestsArchive(archive("/crds.tgz"))),
            step("control-plane", StepSource::HelmArchive(archive("cp"))),
            step("app", StepSource::HelmArchive(archive("web"))),
        ]));

        let manifests = get_manifests_from_application_spec(
            &charts,
            &archives,
            &ValuesInputs::new("demo", "app"),
            &spec,
        )
        .await
        .unwrap();

        let resources = manifests.resource_list().unwrap();
        let labeled: Vec<(String, String)> = resources
            .iter()
            .map(|r| {
                (
                    r.name().unwrap_or_default().to_string(),
                    r.labels()[INSTALLATION_STEP_LABEL].clone(),
                )
            })
            .collect();
        assert_eq!(
            labeled,
            vec![
                ("a".to_string(), "crds".to_string()),
                ("b".to_string(), "crds".to_string()),
                ("demo-cp".to_string(), "control-plane".to_string()),
                ("demo-web".to_string(), "app".to_string()),
            ]
        );
        assert_eq!(resources.iter().next().unwrap().labels()["keep"], "me");
    }

    #[tokio::test]
    async fn test_duplicate_step_fails_before_acquisition() {
        let charts = RecordingCharts::default();
        let archives = RecordingArchives::default();
        let spec = spec(steps(vec![
            step("a", StepSource::ManifestsArchive(archive("/one.tgz"))),
            step("a", StepSource::HelmArchive(archive("two"))),
        ]));

        let err = get_manifests_from_application_spec(
            &charts,
            &archives,
            &ValuesInputs::new("demo", "app"),
            &spec,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RenderError::DuplicateStepName { ref name } if name == "a"));
        assert!(charts.calls.lock().unwrap().is_empty());
        assert!(archives.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_step_names_case_sensitive() {
        let spec = spec(steps(vec![
            step("App", StepSource::HelmArchive(archive("one"))),
            step("app", StepSource::HelmArchive(archive("two"))),
        ]));

        let manifests = get_manifests_from_application_spec(
            &RecordingCharts::default(),
            &RecordingArchives::default(),
            &ValuesInputs::new("demo", "app"),
            &spec,
        )
        .await
        .unwrap();

        assert_eq!(manifests.len(), 2);
    }

    #[test]
    fn test_step_name_checks() {
        let empty = InstallationSteps::default();
        assert!(matches!(check_step_names(&empty), Err(RenderError::NoInstallationSteps)));

        let unnamed = InstallationSteps {
            steps: vec![
                step("a", StepSource::HelmArchive(archive("x"))),
                step("", StepSource::HelmArchive(archive("y"))),
            ],
        };
        assert!(matches!(
            check_step_names(&unnamed),
            Err(RenderError::UnnamedInstallationStep { index: 1 })
        ));
    }

    #[tokio::test]
    async fn test_step_without_source() {
        let spec = spec(steps(vec![InstallationStep {
            name: "empty".to_string(),
            source: None,
        }]));

        let err = get_manifests_from_application_spec(
            &RecordingCharts::default(),
            &RecordingArchives::default(),
            &ValuesInputs::new("demo", "app"),
            &spec,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RenderError::MissingInstallSpec));
    }
}
