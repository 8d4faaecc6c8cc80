//! The render pipeline orchestrator

use meshpack_core::{Manifests, UnstructuredResources, ValuesInputs, VersionedApplicationSpec};
use std::sync::Arc;

use crate::acquire;
use crate::coalesce;
use crate::dependency::{DependencyValidator, NoopValidator};
use crate::engine::Engine;
use crate::error::{RenderError, Result};
use crate::expand;
use crate::filter;
use crate::local::{LocalArchiveFetcher, LocalChartRenderer};
use crate::sources::{ArchiveFetcher, ChartRenderer};
use crate::validate;

/// Computes the exact install resources of an application version
///
/// The pipeline is fixed and stops at the first error:
/// validate → expand templates → acquire manifests → convert → filter by label.
/// Every stage is also callable on its own.
#[derive(Clone)]
pub struct ManifestRenderer {
    validator: Arc<dyn DependencyValidator>,
    charts: Arc<dyn ChartRenderer>,
    archives: Arc<dyn ArchiveFetcher>,
    engine: Engine,
}

impl ManifestRenderer {
    /// Renderer with the local chart renderer and archive fetcher
    pub fn new(validator: impl DependencyValidator + 'static) -> Self {
        Self::builder().validator(validator).build()
    }

    pub fn builder() -> ManifestRendererBuilder {
        ManifestRendererBuilder::default()
    }

    /// Run the whole pipeline
    pub async fn compute_resources_for_application(
        &self,
        inputs: ValuesInputs,
        spec: &VersionedApplicationSpec,
    ) -> Result<UnstructuredResources> {
        let resources = self.compute_unfiltered_resources(inputs, spec).await?;
        Ok(self.filter_by_label(spec, resources))
    }

    /// Run every stage except the label filter
    pub async fn compute_unfiltered_resources(
        &self,
        inputs: ValuesInputs,
        spec: &VersionedApplicationSpec,
    ) -> Result<UnstructuredResources> {
        tracing::debug!(
            name = %inputs.name,
            namespace = %inputs.install_namespace,
            version = %spec.version,
            flavor = %inputs.flavor.name,
            "computing resources for application"
        );

        self.validate_inputs(&inputs, spec)?;
        let inputs = self.exec_input_values_templates(inputs)?;
        let manifests = self.get_manifests_from_application_spec(&inputs, spec).await?;

        manifests
            .resource_list()
            .map_err(RenderError::FailedToConvertManifests)
    }

    pub fn validate_inputs(&self, inputs: &ValuesInputs, spec: &VersionedApplicationSpec) -> Result<()> {
        validate::validate_inputs(inputs, spec, self.validator.as_ref())
    }

    pub fn exec_input_values_templates(&self, inputs: ValuesInputs) -> Result<ValuesInputs> {
        expand::exec_input_values_templates(&self.engine, inputs)
            .map_err(RenderError::FailedRenderValueTemplates)
    }

    pub fn compute_value_overrides(&self, inputs: &ValuesInputs) -> Result<String> {
        coalesce::compute_value_overrides(inputs)
    }

    pub async fn get_manifests_from_application_spec(
        &self,
        inputs: &ValuesInputs,
        spec: &VersionedApplicationSpec,
    ) -> Result<Manifests> {
        acquire::get_manifests_from_application_spec(
            self.charts.as_ref(),
            self.archives.as_ref(),
            inputs,
            spec,
        )
        .await
    }

    pub fn filter_by_label(
        &self,
        spec: &VersionedApplicationSpec,
        resources: UnstructuredResources,
    ) -> UnstructuredResources {
        filter::filter_by_label(spec, resources)
    }
}

impl Default for ManifestRenderer {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ManifestRenderer`]
pub struct ManifestRendererBuilder {
    validator: Arc<dyn DependencyValidator>,
    charts: Option<Arc<dyn ChartRenderer>>,
    archives: Arc<dyn ArchiveFetcher>,
    engine: Engine,
}

impl Default for ManifestRendererBuilder {
    fn default() -> Self {
        Self {
            validator: Arc::new(NoopValidator),
            charts: None,
            archives: Arc::new(LocalArchiveFetcher),
            engine: Engine::default(),
        }
    }
}

impl ManifestRendererBuilder {
    /// Hook called with each selected option's resource dependencies
    pub fn validator(mut self, validator: impl DependencyValidator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    pub fn chart_renderer(mut self, charts: impl ChartRenderer + 'static) -> Self {
        self.charts = Some(Arc::new(charts));
        self
    }

    pub fn archive_fetcher(mut self, archives: impl ArchiveFetcher + 'static) -> Self {
        self.archives = Arc::new(archives);
        self
    }

    /// Engine used to expand templates in the input bundle
    ///
    /// Also renders charts unless a chart renderer is set.
    pub fn engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub fn build(self) -> ManifestRenderer {
        let charts = match self.charts {
            Some(charts) => charts,
            None => Arc::new(LocalChartRenderer::with_engine(self.engine.clone())),
        };
        ManifestRenderer {
            validator: self.validator,
            charts,
            archives: self.archives,
            engine: self.engine,
        }
    }
}

/// Run the pipeline with local collaborators and no dependency validation
#[deprecated(note = "use ManifestRenderer::compute_resources_for_application")]
pub async fn compute_resources_for_application(
    inputs: ValuesInputs,
    spec: &VersionedApplicationSpec,
) -> Result<UnstructuredResources> {
    ManifestRenderer::new(NoopValidator)
        .compute_resources_for_application(inputs, spec)
        .await
}
