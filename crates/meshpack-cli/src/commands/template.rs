//! Template command - render an application version locally

use console::style;
use meshpack_core::Values;
use meshpack_render::ManifestRenderer;
use std::path::PathBuf;

use super::{SelectionArgs, log_dependencies};
use crate::error::Result;

pub struct TemplateOptions {
    pub name: String,
    pub selection: SelectionArgs,
    pub values_files: Vec<PathBuf>,
    pub namespace: String,
    pub mesh: Option<String>,
    pub mesh_namespace: Option<String>,
    pub no_filter: bool,
    pub show_values: bool,
}

pub async fn run(options: TemplateOptions) -> Result<()> {
    let selection = options.selection.load()?;
    let mut inputs = options
        .selection
        .inputs(&selection, &options.name, &options.namespace)?;

    if let Some(mesh) = &options.mesh {
        let mesh_namespace = options.mesh_namespace.as_deref().unwrap_or(mesh.as_str());
        inputs = inputs.with_mesh(mesh.as_str(), mesh_namespace);
    }

    // -f files are merged in order, later files winning
    if !options.values_files.is_empty() {
        let mut files = Vec::with_capacity(options.values_files.len());
        for path in &options.values_files {
            files.push(Values::from_file(path)?);
            tracing::debug!(file = %path.display(), "loaded user values");
        }
        inputs = inputs.with_user_values(Values::merge_all(files).to_yaml()?);
    }

    let renderer = ManifestRenderer::new(log_dependencies);

    if options.show_values {
        renderer.validate_inputs(&inputs, &selection.version)?;
        let expanded = renderer.exec_input_values_templates(inputs.clone())?;
        let values = renderer.compute_value_overrides(&expanded)?;
        eprintln!("{}", style("# Computed Values").cyan().bold());
        eprintln!("{}", values.trim_end());
    }

    let resources = if options.no_filter {
        renderer
            .compute_unfiltered_resources(inputs, &selection.version)
            .await?
    } else {
        renderer
            .compute_resources_for_application(inputs, &selection.version)
            .await?
    };

    if resources.is_empty() {
        eprintln!(
            "{} no resources rendered for {} {}",
            style("⚠").yellow(),
            selection.application,
            selection.version.version
        );
    }

    print!("{}", resources.to_yaml_stream()?);
    Ok(())
}
