// src/license.rs
// Producer descriptors and the server-wide license registry

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{HeraldError, Result};

/// What a producer declares about itself (name, license, where to find the source)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerDescriptor {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    /// Whether every connecting user must be told about this producer
    #[serde(default)]
    pub inform_user: bool,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub license_terms: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    /// Info command name; defaults to the lowercased producer name
    #[serde(default)]
    pub command: Option<String>,
}

impl ProducerDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(HeraldError::Descriptor("producer name must not be empty".to_string()));
        }
        if self.inform_user && self.license.is_none() {
            return Err(HeraldError::Descriptor(format!(
                "{} asks to inform users but declares no license",
                self.name
            )));
        }
        Ok(())
    }

    /// Name of the info command, e.g. "worldguard" for `/worldguard info`
    pub fn command_alias(&self) -> String {
        self.command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| c.trim_start_matches('/').to_lowercase())
            .unwrap_or_else(|| self.name.to_lowercase())
    }

    /// The line shown to a connecting user
    pub fn announcement_text(&self) -> String {
        match &self.license {
            Some(license) => format!(
                "{} is licensed under {}. More info: /{} info",
                self.name,
                license,
                self.command_alias()
            ),
            None => format!("{} is running on this server", self.name),
        }
    }

    /// Key/value pairs for `/<alias> info`, in display order; blank values skipped
    pub fn info_fields(&self) -> Vec<(&'static str, String)> {
        let authors = self.authors.join(", ");
        let fields = [
            ("Name", Some(self.name.clone())),
            ("Version", self.version.clone()),
            ("Authors", Some(authors)),
            ("Description", self.description.clone()),
            ("Website", self.website.clone()),
            ("Source", self.source.clone()),
            ("License", self.license.clone()),
            ("License Terms", self.license_terms.clone()),
        ];
        fields
            .into_iter()
            .filter_map(|(key, value)| value.filter(|v| !v.trim().is_empty()).map(|v| (key, v)))
            .collect()
    }

    /// Rendered info block, one string per output line
    pub fn info_lines(&self) -> Vec<String> {
        self.info_fields()
            .into_iter()
            .map(|(key, value)| {
                if value.lines().count() > 1 {
                    format!("{key}:\n{value}")
                } else {
                    format!("{key}: {value}")
                }
            })
            .collect()
    }
}

/// A TOML file holding `[[producer]]` tables
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DescriptorFile {
    #[serde(default, rename = "producer")]
    pub producers: Vec<ProducerDescriptor>,
}

impl DescriptorFile {
    pub fn parse(contents: &str) -> Result<Self> {
        let file: Self = toml::from_str(contents)?;
        for descriptor in &file.producers {
            descriptor.validate()?;
        }
        Ok(file)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }
}

/// One row of the `/licenses` listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicenseEntry {
    pub name: String,
    pub license: String,
    pub info_command: String,
}

/// Every loaded producer's descriptor, in load order
#[derive(Debug, Clone, Default)]
pub struct LicenseRegistry {
    descriptors: Vec<ProducerDescriptor>,
    show_non_informing: bool,
}

impl LicenseRegistry {
    pub fn new(show_non_informing: bool) -> Self {
        Self {
            descriptors: Vec::new(),
            show_non_informing,
        }
    }

    pub fn register(&mut self, descriptor: ProducerDescriptor) {
        self.descriptors.push(descriptor);
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Look a producer up by name or info command alias, ignoring case
    pub fn find(&self, query: &str) -> Option<&ProducerDescriptor> {
        let query = query.trim().trim_start_matches('/');
        self.descriptors
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(query) || d.command_alias().eq_ignore_ascii_case(query))
    }

    /// Producers that declare a license and are eligible for listing
    pub fn entries(&self) -> Vec<LicenseEntry> {
        self.descriptors
            .iter()
            .filter(|d| d.inform_user || self.show_non_informing)
            .filter_map(|d| {
                d.license.as_ref().map(|license| LicenseEntry {
                    name: d.name.clone(),
                    license: license.clone(),
                    info_command: format!("/{} info", d.command_alias()),
                })
            })
            .collect()
    }

    /// Rendered `/licenses` output
    pub fn listing(&self) -> Vec<String> {
        let entries = self.entries();
        if entries.is_empty() {
            return vec!["No plugins with licenses found!".to_string()];
        }
        let mut lines = Vec::with_capacity(entries.len() + 1);
        lines.push("Licenses of plugins on this server:".to_string());
        lines.extend(
            entries
                .iter()
                .map(|e| format!("- {}: {} | More info: {}", e.name, e.license, e.info_command)),
        );
        lines
    }
}
