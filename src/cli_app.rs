//! Top-level CLI definition and dispatch.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use thiserror::Error;

use file_byte_counter::core::config::Config;
use file_byte_counter::core::errors::FbcError;
use file_byte_counter::counter::PathTemplate;
use file_byte_counter::fixtures::FixtureWriter;
use file_byte_counter::logger::activity::ActivityLog;
use file_byte_counter::tally::{FileOutcome, MissingFilePolicy, Tally, TallyReport};

/// File Byte Counter: reads a numbered file set and reports its total size.
#[derive(Debug, Parser)]
#[command(
    name = "fbc",
    author,
    version,
    about = "File Byte Counter - disk read test",
    long_about = None
)]
pub struct Cli {
    /// Override config file path (default: ./fbc.toml when present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Per-file results and a run summary on stderr.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Suppress the `generate` and `config validate` confirmations; the
    /// `count` report is always printed.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute; `count` when omitted.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Read every file in the set and print the total byte count.
    Count(CountArgs),
    /// Write a random fixture set for `count` to read.
    Generate(GenerateArgs),
    /// Inspect the effective configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Overrides for the numbered file naming shared by `count` and `generate`.
#[derive(Debug, Clone, Args, Default)]
struct TemplateArgs {
    /// Directory holding the file set.
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,
    /// Filename prefix before the index.
    #[arg(long, value_name = "PREFIX")]
    prefix: Option<String>,
    /// Filename suffix after the index.
    #[arg(long, value_name = "SUFFIX")]
    suffix: Option<String>,
}

#[derive(Debug, Clone, Args, Default)]
struct CountArgs {
    #[command(flatten)]
    template: TemplateArgs,
    /// Number of files in the set.
    #[arg(long, value_name = "N")]
    count: Option<usize>,
    /// Contribution of an unreadable file: `sentinel` (1 byte) or `skip` (0).
    #[arg(long, value_name = "POLICY")]
    missing: Option<MissingFilePolicy>,
    /// Append JSONL activity records to this file.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
}

#[derive(Debug, Clone, Args, Default)]
struct GenerateArgs {
    #[command(flatten)]
    template: TemplateArgs,
    /// Number of files to write.
    #[arg(long, value_name = "N")]
    count: Option<usize>,
    /// Size of each file in bytes.
    #[arg(long, value_name = "BYTES")]
    size: Option<u64>,
    /// Append JSONL activity records to this file.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
}

#[derive(Debug, Clone, Args, Default)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print the config file path in use.
    Path,
    /// Print the effective configuration as TOML.
    Show,
    /// Validate the effective configuration.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    shell: CompletionShell,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input or configuration.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) => 3,
        }
    }
}

impl From<FbcError> for CliError {
    fn from(err: FbcError) -> Self {
        match err {
            FbcError::InvalidConfig { .. }
            | FbcError::MissingConfig { .. }
            | FbcError::ConfigParse { .. } => Self::User(err.to_string()),
            FbcError::Serialization { .. } => Self::Internal(err.to_string()),
            FbcError::Io { .. } | FbcError::Output { .. } => Self::Runtime(err.to_string()),
        }
    }
}

/// Dispatch CLI commands. No subcommand runs `count` with configured defaults.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        None => run_count(cli, &CountArgs::default()),
        Some(Command::Count(args)) => run_count(cli, args),
        Some(Command::Generate(args)) => run_generate(cli, args),
        Some(Command::Config(args)) => run_config(cli, args),
        Some(Command::Completions(args)) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// count
// ---------------------------------------------------------------------------

fn run_count(cli: &Cli, args: &CountArgs) -> Result<(), CliError> {
    let mut config = Config::load_unvalidated(cli.config.as_deref())?;
    apply_template_args(&mut config, &args.template);
    if let Some(count) = args.count {
        config.input.file_count = count;
    }
    if let Some(policy) = args.missing {
        config.input.missing_file = policy;
    }
    if let Some(log) = &args.log {
        config.logging.jsonl_log = Some(log.clone());
    }
    config.validate()?;

    let mut log = open_activity_log(&config)?;
    let tally = Tally::new(
        PathTemplate::from_input(&config.input),
        config.input.missing_file,
    );

    let report = {
        let mut stdout = io::stdout().lock();
        tally.run(&mut stdout, &mut log)?
    };
    log.flush();

    if cli.verbose {
        print_file_rows(&report);
        eprintln!(
            "fbc: {} files, {} failed, {} read in {}ms (missing_file={})",
            report.files().len(),
            report.failed_files(),
            format_bytes(report.counted_bytes()),
            report.elapsed().as_millis(),
            tally.policy(),
        );
    }
    Ok(())
}

fn print_file_rows(report: &TallyReport) {
    for row in report.files() {
        let path = row.path.display();
        match &row.outcome {
            FileOutcome::Counted(bytes) => {
                eprintln!("  {:>6}  {path}  {}", row.index, format!("{bytes} B").green());
            }
            FileOutcome::Failed(failure) => {
                eprintln!(
                    "  {:>6}  {path}  {} ({}, counted as {} B)",
                    row.index,
                    format!("{} failed", failure.stage).red(),
                    failure.kind.as_str(),
                    row.contribution,
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

fn run_generate(cli: &Cli, args: &GenerateArgs) -> Result<(), CliError> {
    let mut config = Config::load_unvalidated(cli.config.as_deref())?;
    apply_template_args(&mut config, &args.template);
    if let Some(count) = args.count {
        config.fixtures.file_count = count;
    }
    if let Some(size) = args.size {
        config.fixtures.file_size_bytes = size;
    }
    if let Some(log) = &args.log {
        config.logging.jsonl_log = Some(log.clone());
    }
    config.validate()?;

    let mut log = open_activity_log(&config)?;
    let writer =
        FixtureWriter::from_config(PathTemplate::from_input(&config.input), &config.fixtures);
    let report = writer.write_all(&mut log)?;
    log.flush();

    if !cli.quiet {
        let template = writer.template();
        println!(
            "Wrote {} files of {} to {} ({} .. {}) in {}ms",
            report.files_written,
            format_bytes(config.fixtures.file_size_bytes),
            template.directory().display(),
            template.file_name(0),
            template.file_name(report.files_written.saturating_sub(1)),
            report.elapsed.as_millis(),
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match args.command.as_ref().unwrap_or(&ConfigCommand::Show) {
        ConfigCommand::Path => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let state = if path.exists() {
                "present"
            } else {
                "absent, using defaults"
            };
            println!("{} ({state})", path.display());
        }
        ConfigCommand::Show => {
            let config = Config::load_unvalidated(cli.config.as_deref())?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(config.to_toml()?.as_bytes())?;
        }
        ConfigCommand::Validate => {
            let config = Config::load(cli.config.as_deref())?;
            if !cli.quiet {
                println!(
                    "{} {} (hash {})",
                    "config OK:".green(),
                    config.config_file.display(),
                    config.stable_hash()?
                );
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn apply_template_args(config: &mut Config, args: &TemplateArgs) {
    if let Some(dir) = &args.dir {
        config.input.directory.clone_from(dir);
    }
    if let Some(prefix) = &args.prefix {
        config.input.file_prefix.clone_from(prefix);
    }
    if let Some(suffix) = &args.suffix {
        config.input.file_suffix.clone_from(suffix);
    }
}

fn open_activity_log(config: &Config) -> Result<ActivityLog, CliError> {
    let log = ActivityLog::from_config(&config.logging);
    if log.is_enabled() {
        Ok(log.with_config_hash(config.stable_hash()?))
    } else {
        Ok(log)
    }
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    const GIB: u64 = 1024 * MIB;

    if bytes >= GIB {
        format!("{:.1} GB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_is_accepted() {
        let cli = Cli::try_parse_from(["fbc"]).expect("bare invocation must parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_global_flags_before_and_after_subcommand() {
        let before = Cli::try_parse_from([
            "fbc",
            "--config",
            "/tmp/fbc.toml",
            "--no-color",
            "-v",
            "count",
        ]);
        assert!(before.is_ok());

        let after = Cli::try_parse_from(["fbc", "count", "--no-color", "-q"]);
        assert!(after.is_ok());
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["fbc", "-v", "-q"]).is_err());
    }

    #[test]
    fn parses_subcommands() {
        let cases = [
            vec!["fbc", "count", "--dir", "data", "--count", "10"],
            vec!["fbc", "count", "--prefix", "chunk", "--suffix", ".bin"],
            vec!["fbc", "count", "--missing", "skip", "--log", "/tmp/a.jsonl"],
            vec!["fbc", "generate", "--count", "5", "--size", "1024"],
            vec!["fbc", "config", "path"],
            vec!["fbc", "config", "show"],
            vec!["fbc", "config", "validate"],
            vec!["fbc", "config"],
        ];

        for case in cases {
            let parsed = Cli::try_parse_from(case.clone());
            assert!(parsed.is_ok(), "failed to parse case: {case:?}");
        }
    }

    #[test]
    fn missing_policy_values_are_checked() {
        let parsed = Cli::try_parse_from(["fbc", "count", "--missing", "sentinel"]).unwrap();
        match parsed.command {
            Some(Command::Count(args)) => {
                assert_eq!(args.missing, Some(MissingFilePolicy::Sentinel));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["fbc", "count", "--missing", "zero"]).is_err());
    }

    #[test]
    fn count_rejects_non_numeric() {
        assert!(Cli::try_parse_from(["fbc", "count", "--count", "many"]).is_err());
        assert!(Cli::try_parse_from(["fbc", "generate", "--size", "-1"]).is_err());
    }

    #[test]
    fn completions_support_bash_zsh_and_fish() {
        for shell in ["bash", "zsh", "fish"] {
            let parsed = Cli::try_parse_from(["fbc", "completions", shell]);
            assert!(parsed.is_ok(), "failed shell parse for {shell}");
        }
    }

    #[test]
    fn template_args_override_config() {
        let mut config = Config::default();
        apply_template_args(
            &mut config,
            &TemplateArgs {
                dir: Some(PathBuf::from("bench")),
                prefix: None,
                suffix: Some(".bin".to_string()),
            },
        );
        assert_eq!(config.input.directory, PathBuf::from("bench"));
        assert_eq!(config.input.file_prefix, "file");
        assert_eq!(config.input.file_suffix, ".bin");
    }

    #[test]
    fn fbc_errors_map_to_exit_codes() {
        let err: CliError = FbcError::InvalidConfig {
            details: "bad".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), 1);

        let err: CliError = FbcError::Output {
            source: io::Error::new(io::ErrorKind::BrokenPipe, "closed"),
        }
        .into();
        assert_eq!(err.exit_code(), 2);

        let err: CliError = FbcError::io("files", io::Error::other("denied")).into();
        assert_eq!(err.exit_code(), 2);

        let err: CliError = FbcError::Serialization {
            context: "toml",
            details: "bad".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1000), "1000 B");
        assert_eq!(format_bytes(128 * 1024), "128.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024 / 2), "1.5 MB");
    }
}
