use std::path::Path;

use anyhow::Context;
use stackpack_core::Manifest;
use stackpack_core::config::SettingsOverrides;
use stackpack_planner::{Plan, Resolver, TracingSink};

use crate::Format;

pub fn plan(path: &str, format: Format, overrides: &SettingsOverrides) -> anyhow::Result<()> {
    let plan = build(Path::new(path), overrides)?;
    println!("{}", render(&plan, format)?);

    let warnings = plan.warnings().count();
    if warnings > 0 {
        tracing::warn!(warnings, "plan produced with warnings");
    }
    Ok(())
}

/// Load the manifest, apply overrides (CLI wins), and run the planner.
pub fn build(path: &Path, overrides: &SettingsOverrides) -> anyhow::Result<Plan> {
    let manifest = Manifest::from_file(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let settings = manifest.settings()?.apply(overrides)?;
    let descriptors = manifest.descriptors()?;

    tracing::info!(
        manifest = %path.display(),
        version = manifest.version(),
        resources = descriptors.len(),
        "Planning manifest"
    );

    let plan = Resolver::new(settings).resolve(&descriptors, &mut TracingSink)?;
    Ok(plan)
}

pub fn render(plan: &Plan, format: Format) -> anyhow::Result<String> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(plan)?),
        Format::Text => Ok(stackpack_planner::report::format_plan(plan)),
    }
}
