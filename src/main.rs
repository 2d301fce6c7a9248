use std::io::{self, Write};
use std::process;

use clap::Parser;

use logmerge::cli::Cli;
use logmerge::diagnostics::Severity;
use logmerge::{run_merge, ConfigFile, Diagnostic, MergeConfig, Reporter, StderrReporter};

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitCode {
    Success = 0,
    GeneralError = 1,
}

impl ExitCode {
    fn exit(self) -> ! {
        process::exit(self as i32)
    }
}

fn main() {
    // clap exits with status 2 on usage errors
    let cli = Cli::parse();
    let reporter = StderrReporter::new(cli.quiet, cli.no_emoji, cli.color);

    if let Some(filter) = cli.effective_filter() {
        reporter.report(&Diagnostic::FilterActive {
            filter: filter.to_string(),
        });
    }

    let config_file = match ConfigFile::load(&cli.config, &reporter) {
        Ok(file) => file,
        Err(e) => {
            reporter.report_fatal(&format!("{:#}", e));
            ExitCode::GeneralError.exit();
        }
    };

    if cli.show_config {
        print!("{}", config_file.describe(&cli.config));
        let _ = io::stdout().flush();
        ExitCode::Success.exit();
    }

    let config = MergeConfig::from_cli(&cli, config_file);

    match run_merge(&config, &reporter) {
        Ok(summary) => {
            if cli.stats {
                let line = reporter.format_message(Severity::Info, &summary.stats.format_stats());
                eprintln!("{}", line);
            }
            ExitCode::Success.exit();
        }
        Err(e) => {
            reporter.report_fatal(&format!("{:#}", e));
            ExitCode::GeneralError.exit();
        }
    }
}
