use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::diagnostics::{Diagnostic, Reporter};

/// Key whose value lists `;`-separated exclude substrings
const EXCLUDE_KEY: &str = "exclude";

/// Source table and exclude patterns read from the INI-style config file
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// label -> path, first-seen order, last value wins
    pub sources: IndexMap<String, PathBuf>,
    pub excludes: Vec<String>,
}

impl ConfigFile {
    /// Load the config file at `path`.
    ///
    /// A missing file is not an error: it yields an empty configuration and
    /// a `ConfigUnavailable` diagnostic. A file that exists but cannot be
    /// read is.
    pub fn load(path: &Path, reporter: &dyn Reporter) -> Result<Self> {
        if !path.is_file() {
            reporter.report(&Diagnostic::ConfigUnavailable {
                path: path.to_path_buf(),
            });
            return Ok(Self::default());
        }

        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        // UTF-8 with BOM sniffing; malformed bytes become U+FFFD
        let (content, _, _) = encoding_rs::UTF_8.decode(&bytes);
        Ok(Self::parse_ini_content(&content))
    }

    /// Parse INI content from string
    pub fn parse_ini_content(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let trimmed = line.trim();

            // Skip empty lines and comments
            if trimmed.is_empty() || trimmed.starts_with(';') {
                continue;
            }

            // Section headers carry no meaning here
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                continue;
            }

            let Some(eq_pos) = trimmed.find('=') else {
                continue;
            };
            let key = trimmed[..eq_pos].trim();
            let value = trimmed[eq_pos + 1..].trim();
            if key.is_empty() {
                continue;
            }

            if key.eq_ignore_ascii_case(EXCLUDE_KEY) {
                config.excludes.extend(
                    value
                        .split(';')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string),
                );
            } else {
                config.sources.insert(key.to_string(), PathBuf::from(value));
            }
        }

        config
    }

    /// Render the parsed configuration for `--show-config`
    pub fn describe(&self, path: &Path) -> String {
        let mut out = format!("Configuration file: {}\n", path.display());

        if self.sources.is_empty() {
            out.push_str("\nNo sources configured.\n");
        } else {
            out.push_str(&format!("\nSources ({}):\n", self.sources.len()));
            for (label, source_path) in &self.sources {
                let status = if source_path.is_file() {
                    "found"
                } else {
                    "not found"
                };
                out.push_str(&format!(
                    "  {} = {} ({})\n",
                    label,
                    source_path.display(),
                    status
                ));
            }
        }

        if !self.excludes.is_empty() {
            out.push_str(&format!("\nExclude patterns ({}):\n", self.excludes.len()));
            for pattern in &self.excludes {
                out.push_str(&format!("  {}\n", pattern));
            }
        }

        out
    }
}
