// Core library for the logmerge tool

pub use config::{ColorMode, FilterConfig, MergeConfig, SourceEntry};
pub use config_file::ConfigFile;
pub use diagnostics::{CollectingReporter, Diagnostic, NullReporter, Reporter, StderrReporter};
pub use normalize::{normalize_line, NormalizedRecord};
pub use runner::{ingest_all, run_merge, MergeSummary};
pub use stats::ProcessingStats;

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod config_file;
pub mod diagnostics;
pub mod ingest;
pub mod normalize;
pub mod readers;
pub mod runner;
pub mod sort;
pub mod stats;
pub mod writer;
