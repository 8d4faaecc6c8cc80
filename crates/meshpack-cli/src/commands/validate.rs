//! Validate command - check selections and parameters without rendering

use console::style;
use meshpack_render::ManifestRenderer;

use super::{SelectionArgs, log_dependencies};
use crate::error::Result;

pub fn run(selection_args: &SelectionArgs) -> Result<()> {
    let selection = selection_args.load()?;
    let inputs = selection_args.inputs(&selection, &selection.application, "default")?;

    ManifestRenderer::new(log_dependencies).validate_inputs(&inputs, &selection.version)?;

    println!(
        "{} Inputs are valid for {} {} (flavor {})",
        style("✓").green(),
        selection.application,
        selection.version.version,
        selection.flavor.name
    );
    Ok(())
}
