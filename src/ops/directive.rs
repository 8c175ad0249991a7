//! Insertion directives.
//!
//! A directive is the fixed text a run makes sure every manifest carries: one
//! dependency line for `[dependencies]` and, optionally, a block of lines for
//! `[features]`. Directives come from a built-in [`Preset`], from the command
//! line, or from a small TOML file:
//!
//! ```toml
//! dependency = 'hotpath = { version = "0.7", optional = true }'
//! features = [
//!     'hotpath = ["dep:hotpath", "hotpath/hotpath"]',
//!     '',
//!     'hotpath-off = ["hotpath/hotpath-off"]',
//! ]
//! ```
//!
//! Lines are matched verbatim when a manifest is cleaned up, so every
//! constructor validates them up front.

use crate::error::{InjectError, Result};
use clap::ValueEnum;
use std::fs;
use std::path::Path;
use toml_edit::{DocumentMut, Item};

/// Built-in directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Optional `hotpath` profiler with its feature switches
    Hotpath,
    /// Optional `channels-console` dependency and an empty feature slot
    ChannelsConsole,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hotpath => "hotpath",
            Self::ChannelsConsole => "channels-console",
        }
    }
}

/// The dependency line and feature block to inject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    dependency: String,
    features: Option<Vec<String>>,
}

impl Directive {
    /// Creates a validated directive.
    ///
    /// `features = None` leaves `[features]` alone entirely. An empty string in
    /// the block stands for a blank line.
    ///
    /// # Errors
    ///
    /// `InvalidDirective` if a line is empty (dependency only), spans several
    /// lines, looks like a section header, or is not valid TOML in its table.
    pub fn new(dependency: impl Into<String>, features: Option<Vec<String>>) -> Result<Self> {
        let directive = Self {
            dependency: dependency.into(),
            features,
        };
        directive.validate()?;
        Ok(directive)
    }

    /// Returns the directive of a built-in preset.
    pub fn preset(preset: Preset) -> Self {
        let (dependency, features): (&str, &[&str]) = match preset {
            Preset::Hotpath => (
                r#"hotpath = { version = "0.7", optional = true }"#,
                &[
                    r#"hotpath = ["dep:hotpath", "hotpath/hotpath"]"#,
                    r#"hotpath-alloc = ["hotpath/hotpath-alloc"]"#,
                    "",
                    r#"hotpath-off = ["hotpath/hotpath-off"]"#,
                ],
            ),
            Preset::ChannelsConsole => (
                r#"channels-console = { version = "0.2", optional = true, features=['tokio', 'futures'] }"#,
                &[""],
            ),
        };

        Self {
            dependency: dependency.to_string(),
            features: Some(features.iter().map(|line| line.to_string()).collect()),
        }
    }

    /// Parses a directive from TOML text.
    ///
    /// `dependency` is a required string; `features` an optional array of
    /// strings.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let doc: DocumentMut = input.parse()?;

        let dependency = doc
            .get("dependency")
            .and_then(Item::as_str)
            .ok_or_else(|| {
                InjectError::InvalidDirective("missing string key `dependency`".to_string())
            })?;

        let features = match doc.get("features") {
            None => None,
            Some(item) => {
                let array = item.as_array().ok_or_else(|| {
                    InjectError::InvalidDirective("`features` must be an array".to_string())
                })?;
                let lines = array
                    .iter()
                    .map(|value| {
                        value.as_str().map(str::to_owned).ok_or_else(|| {
                            InjectError::InvalidDirective(
                                "`features` entries must be strings".to_string(),
                            )
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Some(lines)
            }
        };

        Self::new(dependency, features)
    }

    /// Loads a directive file.
    pub fn load(path: &Path) -> Result<Self> {
        log::debug!("Loading directive from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            InjectError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read {}: {}", path.display(), e),
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn dependency(&self) -> &str {
        &self.dependency
    }

    pub fn features(&self) -> Option<&[String]> {
        self.features.as_deref()
    }

    /// Returns true if `line` is one of the lines this directive inserts.
    pub fn contains_line(&self, line: &str) -> bool {
        line == self.dependency
            || self
                .features()
                .is_some_and(|block| block.iter().any(|f| f == line))
    }

    fn validate(&self) -> Result<()> {
        if self.dependency.trim().is_empty() {
            return Err(InjectError::InvalidDirective(
                "dependency line cannot be empty".to_string(),
            ));
        }

        let lines =
            std::iter::once(&self.dependency).chain(self.features().unwrap_or_default());
        for line in lines {
            if line.contains(['\n', '\r']) {
                return Err(InjectError::InvalidDirective(format!(
                    "line must not contain a line break: {:?}",
                    line
                )));
            }
            if line.starts_with('[') {
                return Err(InjectError::InvalidDirective(format!(
                    "line must not be a section header: {}",
                    line
                )));
            }
        }

        // The lines end up under these two tables; they must read as TOML there.
        let mut sample = format!("[dependencies]\n{}\n", self.dependency);
        if let Some(block) = self.features() {
            sample.push_str("[features]\n");
            for line in block {
                sample.push_str(line);
                sample.push('\n');
            }
        }

        let doc: DocumentMut = sample.parse().map_err(|e: toml_edit::TomlError| {
            InjectError::InvalidDirective(format!("not valid manifest TOML: {}", e.message()))
        })?;

        let declared = doc
            .get("dependencies")
            .and_then(Item::as_table)
            .map_or(0, |table| table.len());
        if declared != 1 {
            return Err(InjectError::InvalidDirective(format!(
                "dependency line must declare exactly one dependency: {}",
                self.dependency
            )));
        }

        Ok(())
    }
}
