// Command-line interface definitions

use clap::Parser;
use encoding_rs::Encoding;
use std::path::PathBuf;

use crate::config::{ColorMode, DEFAULT_BATCH_SIZE, DEFAULT_CONFIG_PATH, DEFAULT_OUTPUT_PATH};

#[derive(Parser, Debug)]
#[command(name = "logmerge")]
#[command(about = "Merge date-prefixed log files into one chronologically sorted file")]
#[command(
    long_about = "Merge date-prefixed log files into one chronologically sorted file\n\nEvery source listed in the config file is read in parallel. Lines must start with an\n8-digit date followed by ';'. Accepted lines are cleaned of control characters, tagged\nwith their source label and sorted by date and time.\n\nCONFIG FILE (config.ini):\n  ; comment\n  app = logs/app.txt\n  db  = logs/db.txt\n  exclude = heartbeat; ping\n\nEXAMPLES:\n  logmerge\n  logmerge timeout\n  logmerge -c merge.ini -o merged.txt --stats"
)]
#[command(version)]
pub struct Cli {
    /// Keep only lines containing this text (case insensitive)
    pub filter: Option<String>,

    /// Config file listing `label = path` sources and `exclude` patterns
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_PATH, help_heading = "Input Options")]
    pub config: PathBuf,

    /// Encoding of the source files; a byte-order mark takes precedence
    #[arg(long = "encoding", default_value = "windows-1251", value_parser = parse_encoding, help_heading = "Input Options")]
    pub encoding: &'static Encoding,

    /// Output file, overwritten on every run
    #[arg(short = 'o', long = "output", default_value = DEFAULT_OUTPUT_PATH, help_heading = "Output Options")]
    pub output: PathBuf,

    /// Start the output file with a UTF-8 byte-order mark
    #[arg(long = "bom", help_heading = "Output Options")]
    pub bom: bool,

    /// Number of ingest threads (0 = one per CPU core)
    #[arg(short = 'j', long = "threads", default_value_t = 0, help_heading = "Performance Options")]
    pub threads: usize,

    /// Lines buffered per source before handing them to the collector
    #[arg(long = "batch-size", default_value_t = DEFAULT_BATCH_SIZE, value_parser = parse_batch_size, help_heading = "Performance Options")]
    pub batch_size: usize,

    /// Print line and source counters when done
    #[arg(long = "stats", help_heading = "Display Options")]
    pub stats: bool,

    /// Print the parsed configuration and exit
    #[arg(long = "show-config", help_heading = "Display Options")]
    pub show_config: bool,

    /// Reduce output (-q hides progress, -qq also hides warnings)
    #[arg(short = 'q', long = "quiet", action = clap::ArgAction::Count, help_heading = "Display Options")]
    pub quiet: u8,

    /// Use plain `logmerge:` prefixes instead of emoji
    #[arg(long = "no-emoji", help_heading = "Display Options")]
    pub no_emoji: bool,

    /// When to color diagnostics
    #[arg(long = "color", value_enum, default_value = "auto", help_heading = "Display Options")]
    pub color: ColorMode,
}

impl Cli {
    /// The include filter, if one was given and is not blank
    pub fn effective_filter(&self) -> Option<&str> {
        self.filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }
}

/// Resolve an encoding label such as `windows-1251`, `cp866` or `utf-8`
pub fn parse_encoding(label: &str) -> Result<&'static Encoding, String> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| format!("unknown encoding '{}'", label))
}

fn parse_batch_size(value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err("batch size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
