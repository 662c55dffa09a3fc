// src/cli/licenses.rs
// License listing command

use anyhow::Result;
use herald::{DescriptorFile, LicenseRegistry, Settings};
use std::path::Path;

/// Print the `/licenses` listing for the producers in `descriptors`
pub fn run_licenses(settings: &Settings, descriptors: &Path, json: bool) -> Result<()> {
    let file = DescriptorFile::load(descriptors)?;
    println!("{}", render_licenses(file, settings.show_non_informing, json)?);
    Ok(())
}

fn render_licenses(file: DescriptorFile, show_non_informing: bool, json: bool) -> Result<String> {
    let mut registry = LicenseRegistry::new(show_non_informing);
    for descriptor in file.producers {
        registry.register(descriptor);
    }

    if json {
        Ok(serde_json::to_string_pretty(&registry.entries())?)
    } else {
        Ok(registry.listing().join("\n"))
    }
}
