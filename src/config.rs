use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::ValueEnum;
use encoding_rs::{Encoding, WINDOWS_1251};

use crate::cli::Cli;
use crate::config_file::ConfigFile;
use crate::normalize::fold_case;

/// Lines buffered per source before they are handed to the aggregator
pub const DEFAULT_BATCH_SIZE: usize = 100_000;
pub const DEFAULT_CONFIG_PATH: &str = "config.ini";
pub const DEFAULT_OUTPUT_PATH: &str = "res.txt";

/// Main configuration struct for a merge run
#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub input: InputConfig,
    pub filter: FilterConfig,
    pub output: OutputConfig,
    pub performance: PerformanceConfig,
}

/// Input configuration
#[derive(Debug, Clone)]
pub struct InputConfig {
    pub sources: Vec<SourceEntry>,
    pub encoding: &'static Encoding,
}

/// Output configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub write_bom: bool,
}

/// Performance configuration
#[derive(Debug, Clone)]
pub struct PerformanceConfig {
    /// Worker threads; 0 means one per CPU core
    pub threads: usize,
    pub batch_size: usize,
}

/// Color output mode for diagnostics
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// One configured input file and the label stamped on its records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    label: Arc<str>,
    path: PathBuf,
}

impl SourceEntry {
    pub fn new(label: impl Into<Arc<str>>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Shared handle to the label, cloned into every record of this source
    pub fn label_arc(&self) -> &Arc<str> {
        &self.label
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Why a cleaned line was kept or dropped by the substring filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterVerdict {
    Accept,
    Excluded,
    NotIncluded,
}

/// Include/exclude substrings, matched case-insensitively.
///
/// Built once before ingestion and only ever shared by reference afterwards.
/// Needles are stored pre-folded so each line is folded at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    include: Option<String>,
    include_folded: Option<String>,
    excludes: Vec<String>,
    excludes_folded: Vec<String>,
}

impl FilterConfig {
    /// Empty or whitespace-only include filters count as absent; exclude
    /// patterns are trimmed and empty ones dropped.
    pub fn new<I, S>(include: Option<&str>, excludes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let include = include
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let excludes: Vec<String> = excludes
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        Self {
            include_folded: include.as_deref().map(fold_case),
            excludes_folded: excludes.iter().map(|p| fold_case(p)).collect(),
            include,
            excludes,
        }
    }

    pub fn include(&self) -> Option<&str> {
        self.include.as_deref()
    }

    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_none() && self.excludes.is_empty()
    }

    /// Exclusion is checked before inclusion
    pub fn verdict(&self, cleaned: &str) -> FilterVerdict {
        if self.is_empty() {
            return FilterVerdict::Accept;
        }

        let folded = fold_case(cleaned);
        if self
            .excludes_folded
            .iter()
            .any(|pattern| folded.contains(pattern.as_str()))
        {
            return FilterVerdict::Excluded;
        }

        match &self.include_folded {
            Some(include) if !folded.contains(include.as_str()) => FilterVerdict::NotIncluded,
            _ => FilterVerdict::Accept,
        }
    }

    /// Include check alone, used by the final pass before sorting
    pub fn includes(&self, cleaned: &str) -> bool {
        match &self.include_folded {
            Some(include) => fold_case(cleaned).contains(include.as_str()),
            None => true,
        }
    }
}

impl MergeConfig {
    /// Combine command-line options with the parsed config file
    pub fn from_cli(cli: &Cli, file: ConfigFile) -> Self {
        let ConfigFile { sources, excludes } = file;

        Self {
            input: InputConfig {
                sources: sources
                    .into_iter()
                    .map(|(label, path)| SourceEntry::new(label, path))
                    .collect(),
                encoding: cli.encoding,
            },
            filter: FilterConfig::new(cli.filter.as_deref(), excludes),
            output: OutputConfig {
                path: cli.output.clone(),
                write_bom: cli.bom,
            },
            performance: PerformanceConfig {
                threads: cli.threads,
                batch_size: cli.batch_size,
            },
        }
    }
}

impl PerformanceConfig {
    /// Worker count for a run over `sources` inputs, never more than there
    /// are sources to process.
    pub fn effective_threads(&self, sources: usize) -> usize {
        let requested = if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        };
        requested.min(sources)
    }

    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            input: InputConfig {
                sources: Vec::new(),
                encoding: WINDOWS_1251,
            },
            filter: FilterConfig::default(),
            output: OutputConfig {
                path: PathBuf::from(DEFAULT_OUTPUT_PATH),
                write_bom: false,
            },
            performance: PerformanceConfig {
                threads: 0,
                batch_size: DEFAULT_BATCH_SIZE,
            },
        }
    }
}
