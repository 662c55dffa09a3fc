// src/cli/info.rs
// Per-producer info command

use anyhow::{Result, bail};
use herald::{DescriptorFile, LicenseRegistry};
use std::path::Path;

/// Print the info block of the producer called `name` in `descriptors`
pub fn run_info(descriptors: &Path, name: &str) -> Result<()> {
    let file = DescriptorFile::load(descriptors)?;
    println!("{}", render_info(file, name)?);
    Ok(())
}

fn render_info(file: DescriptorFile, name: &str) -> Result<String> {
    // Visibility only affects the listing; every loaded producer answers its info command
    let mut registry = LicenseRegistry::new(true);
    for descriptor in file.producers {
        registry.register(descriptor);
    }

    match registry.find(name) {
        Some(descriptor) => Ok(descriptor.info_lines().join("\n")),
        None => bail!("no producer named '{}' in descriptor file", name),
    }
}
