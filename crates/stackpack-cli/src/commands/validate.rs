use std::path::Path;

use anyhow::Context;
use stackpack_core::Manifest;

pub fn validate(path: &str) -> anyhow::Result<()> {
    let path = Path::new(path);
    let summary = check(path)?;
    println!("✓ {} is valid ({summary})", path.display());
    Ok(())
}

/// Parse the manifest and check settings and descriptors.
pub fn check(path: &Path) -> anyhow::Result<String> {
    let manifest = Manifest::from_file(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let settings = manifest.settings()?;
    let descriptors = manifest.descriptors()?;
    let refs: usize = descriptors.iter().map(|d| d.forward_refs.len()).sum();

    Ok(format!(
        "version {}, {} resources, {} references, capacities {}/{}",
        manifest.version(),
        descriptors.len(),
        refs,
        settings.resource_capacity,
        settings.edge_capacity
    ))
}
