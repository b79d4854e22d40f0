//! Vitals CLI - Command-line interface for Vitals Resolver
//!
//! Commands:
//! - summary: Resolve a summary for one timeframe
//! - run: Answer JSON requests from stdin, one per line (streaming mode)
//! - workouts: Print the workout-history payload
//! - zones: Print the heart-rate-zone payload
//! - doctor: Diagnose data sources and configuration

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing_subscriber::EnvFilter;
use vitals_resolver::types::{ResolvedSummary, SummaryRequest};
use vitals_resolver::{
    mock, ResolveError, ResolverConfig, SourceResolver, SummaryEncoder, Timeframe,
    PRODUCER_NAME, RESOLVER_VERSION,
};

/// Vitals - health summaries from live sync, exports, or synthetic data
#[derive(Parser)]
#[command(name = "vitals")]
#[command(version = RESOLVER_VERSION)]
#[command(about = "Resolve health-metric summaries from local data sources", long_about = None)]
struct Cli {
    #[command(flatten)]
    sources: SourceArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding export.xml
    #[arg(long, global = true)]
    export_dir: Option<PathBuf>,

    /// Live-sync snapshot file
    #[arg(long, global = true)]
    live_sync: Option<PathBuf>,

    /// Export size ceiling in megabytes
    #[arg(long, global = true)]
    max_export_mb: Option<u64>,

    /// Export parse timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a summary for one timeframe
    Summary {
        /// today, week or month
        #[arg(short, long, default_value = "today")]
        timeframe: String,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Answer JSON requests from stdin (streaming mode)
    Run {
        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,

        /// Flush output after each response
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        flush: bool,
    },

    /// Print the workout-history payload
    Workouts,

    /// Print the heart-rate-zone payload
    Zones,

    /// Diagnose data sources and configuration
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable text
    Text,
    /// Single-line JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout only carries results
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), VitalsCliError> {
    let config = load_config(&cli.sources)?;

    match cli.command {
        Commands::Summary { timeframe, format } => cmd_summary(&config, &timeframe, &format),
        Commands::Run { format, flush } => cmd_run(&config, &format, flush),
        Commands::Workouts => print_json(&mock::workout_history()),
        Commands::Zones => print_json(&mock::heart_rate_zones()),
        Commands::Doctor { json } => cmd_doctor(&config, json),
    }
}

/// Defaults from $HOME, then the config file, then flags
fn load_config(args: &SourceArgs) -> Result<ResolverConfig, VitalsCliError> {
    let mut config = match &args.config {
        Some(path) => ResolverConfig::from_json(&fs::read_to_string(path)?)?,
        None => {
            let home = std::env::var_os("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            ResolverConfig::for_home(home)
        }
    };

    if let Some(dir) = &args.export_dir {
        config = config.with_export_dir(dir);
    }
    if let Some(path) = &args.live_sync {
        config = config.with_live_sync_path(path);
    }
    if let Some(mb) = args.max_export_mb {
        config = config.with_max_export_bytes(mb.saturating_mul(1024 * 1024));
    }
    if let Some(secs) = args.timeout_secs {
        config = config.with_parse_timeout(Duration::from_secs(secs));
    }

    config.validate()?;
    Ok(config)
}

fn cmd_summary(
    config: &ResolverConfig,
    timeframe: &str,
    format: &OutputFormat,
) -> Result<(), VitalsCliError> {
    // Reject bad input before any source is touched
    let timeframe: Timeframe = timeframe.parse()?;
    let resolved = SourceResolver::new(config).resolve(timeframe);
    println!("{}", format_output(&resolved, format)?);
    Ok(())
}

fn cmd_run(config: &ResolverConfig, format: &OutputFormat, flush: bool) -> Result<(), VitalsCliError> {
    let resolver = SourceResolver::new(config);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        // A bad request is answered with an error record; the stream continues
        let response = match SummaryRequest::from_json(trimmed).and_then(|r| r.timeframe()) {
            Ok(timeframe) => format_output(&resolver.resolve(timeframe), format)?,
            Err(e) => serde_json::to_string(&CliError::from(VitalsCliError::from(e)))?,
        };

        writeln!(stdout, "{}", response)?;
        if flush {
            stdout.flush()?;
        }
    }

    stdout.flush()?;
    Ok(())
}

fn cmd_doctor(config: &ResolverConfig, json: bool) -> Result<(), VitalsCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();
    let resolver = SourceResolver::new(config);

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} {}", PRODUCER_NAME, RESOLVER_VERSION),
    });

    checks.push(check_live_sync(&resolver, Utc::now()));
    checks.push(check_export(&resolver, config));

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: RESOLVER_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Vitals Doctor Report");
        println!("====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
        println!("\nMissing sources are not errors: summaries fall back to synthetic data.");
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(VitalsCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_live_sync(resolver: &SourceResolver, now: DateTime<Utc>) -> DoctorCheck {
    let reader = resolver.live_sync();
    let (status, message) = match reader.load(now) {
        Ok(snapshot) => (
            CheckStatus::Ok,
            format!(
                "fresh snapshot at {} (written {})",
                reader.path().display(),
                snapshot.timestamp.unwrap_or_default()
            ),
        ),
        Err(e) if e.is_data_issue() => (CheckStatus::Error, e.to_string()),
        Err(e) => (CheckStatus::Warning, e.to_string()),
    };

    DoctorCheck {
        name: "live_sync".to_string(),
        status,
        message,
    }
}

fn check_export(resolver: &SourceResolver, config: &ResolverConfig) -> DoctorCheck {
    let reader = resolver.export();
    let result = reader
        .locate()
        .and_then(|path| reader.checked_size(&path).map(|size| (path, size)));

    let (status, message) = match result {
        Ok((path, size)) => (
            CheckStatus::Ok,
            format!(
                "{} ({}, limit {}, timeout {:?})",
                path.display(),
                human_size(size),
                human_size(config.max_export_bytes),
                config.parse_timeout()
            ),
        ),
        Err(e) if e.is_data_issue() => (CheckStatus::Error, e.to_string()),
        Err(e) => (CheckStatus::Warning, e.to_string()),
    };

    DoctorCheck {
        name: "export".to_string(),
        status,
        message,
    }
}

// Helper functions

fn format_output(resolved: &ResolvedSummary, format: &OutputFormat) -> Result<String, VitalsCliError> {
    Ok(match format {
        OutputFormat::Text => SummaryEncoder::to_text(resolved),
        OutputFormat::Json => SummaryEncoder::to_json(resolved)?,
        OutputFormat::JsonPretty => SummaryEncoder::to_json_pretty(resolved)?,
    })
}

fn print_json(value: &serde_json::Value) -> Result<(), VitalsCliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn human_size(bytes: u64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    format!("{:.1} MB", bytes as f64 / MB)
}

// Error types

#[derive(Debug)]
enum VitalsCliError {
    Io(io::Error),
    Resolve(ResolveError),
    Json(serde_json::Error),
    DoctorFailed,
}

impl From<io::Error> for VitalsCliError {
    fn from(e: io::Error) -> Self {
        VitalsCliError::Io(e)
    }
}

impl From<ResolveError> for VitalsCliError {
    fn from(e: ResolveError) -> Self {
        VitalsCliError::Resolve(e)
    }
}

impl From<serde_json::Error> for VitalsCliError {
    fn from(e: serde_json::Error) -> Self {
        VitalsCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<VitalsCliError> for CliError {
    fn from(e: VitalsCliError) -> Self {
        match e {
            VitalsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            VitalsCliError::Resolve(ResolveError::InvalidArgument(msg)) => CliError {
                code: "INVALID_ARGUMENT".to_string(),
                message: msg,
                hint: Some("Use one of: today, week, month".to_string()),
            },
            VitalsCliError::Resolve(ResolveError::ConfigError(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Check the configuration file and flags".to_string()),
            },
            VitalsCliError::Resolve(e @ ResolveError::JsonError(_)) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Requests look like {\"timeframe\": \"week\"}".to_string()),
            },
            VitalsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            VitalsCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_flush(args: &[&str]) -> bool {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Run { flush, .. } => flush,
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_run_flushes_by_default() {
        assert!(run_flush(&["vitals", "run"]));
    }

    #[test]
    fn test_run_flush_can_be_disabled() {
        assert!(!run_flush(&["vitals", "run", "--flush", "false"]));
        assert!(run_flush(&["vitals", "run", "--flush", "true"]));
    }
}
