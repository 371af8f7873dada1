use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::glob;
use rotel_core::{
    AmplifierState, ChunkSource, Command, CommandSink, Controller, DEFAULT_BAUD_RATE,
    DEFAULT_CHUNK_SIZE, DEFAULT_DEVICE_NAME, ReplayOptions, SerialLink, SessionConfig,
    SessionReport,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("ROTEL_BUILD_COMMIT"),
    ", ",
    env!("ROTEL_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "rotel")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Serial control and protocol replay for Rotel amplifiers.",
    long_about = None,
    after_help = "Examples:\n  rotel capture replay capture.bin -o report.json\n  rotel encode source \"Optical 1\"\n  rotel serial monitor --port /dev/ttyUSB0"
)]
struct Cli {
    /// Log decoded tokens and written commands to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on raw byte captures of the amplifier's output.
    Capture {
        #[command(subcommand)]
        command: CaptureCommands,
    },
    /// Print the wire string for an amplifier command.
    Encode {
        #[command(subcommand)]
        action: EncodeAction,
    },
    /// Operations on a live serial link.
    Serial {
        #[command(subcommand)]
        command: SerialCommands,
    },
}

#[derive(Subcommand, Debug)]
enum CaptureCommands {
    /// Replay a capture through a session and write a JSON report.
    #[command(
        after_help = "Examples:\n  rotel capture replay capture.bin -o report.json\n  rotel capture replay capture.bin --stdout --chunk-size 1"
    )]
    Replay {
        /// Path to a raw byte capture
        input: PathBuf,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Bytes delivered to the decoder per chunk
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Device name recorded in the report
        #[arg(long, default_value = DEFAULT_DEVICE_NAME)]
        name: String,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,

        /// Exit with a non-zero code if protocol diagnostics are present
        #[arg(long)]
        strict: bool,

        /// List protocol diagnostics after the replay
        #[arg(long)]
        list_diagnostics: bool,
    },
}

#[derive(Subcommand, Debug)]
enum EncodeAction {
    PowerOn,
    PowerOff,
    /// Toggle mute
    Mute,
    VolumeUp,
    VolumeDown,
    /// Absolute volume as a fraction of full scale
    Volume {
        /// Level between 0.0 and 1.0
        level: f64,
    },
    /// Select an input by its front-panel name
    Source {
        /// e.g. "Optical 1", "CD", "Bluetooth"
        name: String,
    },
    /// Query a value from the amplifier
    Query {
        #[arg(value_enum)]
        what: QueryTarget,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum QueryTarget {
    /// Current power state
    Power,
    /// Power state after a transition
    PowerResolved,
    Volume,
    Source,
    Freq,
}

#[derive(Subcommand, Debug)]
enum SerialCommands {
    /// Query the amplifier and print its state as JSON lines on every change.
    Monitor {
        /// Serial device path
        #[arg(long)]
        port: String,

        /// Line speed
        #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
        baud: u32,

        /// Read timeout in milliseconds
        #[arg(long, default_value_t = 100)]
        timeout_ms: u64,

        /// Stop after this many seconds (runs until the port closes otherwise)
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Device name used in logs
        #[arg(long, default_value = DEFAULT_DEVICE_NAME)]
        name: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Capture { command } => match command {
            CaptureCommands::Replay {
                input,
                report,
                stdout,
                pretty,
                compact,
                chunk_size,
                name,
                quiet,
                strict,
                list_diagnostics,
            } => cmd_capture_replay(
                input,
                report,
                stdout,
                OutputFormat { pretty, compact },
                ReplayOptions { chunk_size, name },
                quiet,
                strict,
                list_diagnostics,
            ),
        },
        Commands::Encode { action } => cmd_encode(action),
        Commands::Serial { command } => match command {
            SerialCommands::Monitor {
                port,
                baud,
                timeout_ms,
                duration_secs,
                name,
            } => cmd_serial_monitor(
                &port,
                baud,
                Duration::from_millis(timeout_ms),
                duration_secs.map(Duration::from_secs),
                name,
            ),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

#[derive(Debug, Clone, Copy)]
struct OutputFormat {
    pretty: bool,
    compact: bool,
}

#[allow(clippy::too_many_arguments)]
fn cmd_capture_replay(
    input: PathBuf,
    report: Option<PathBuf>,
    stdout: bool,
    format: OutputFormat,
    options: ReplayOptions,
    quiet: bool,
    strict: bool,
    list_diagnostics: bool,
) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;
    if options.chunk_size == 0 {
        return Err(CliError::new(
            "chunk size must be at least 1",
            Some("use --chunk-size 1 to deliver one byte at a time".to_string()),
        ));
    }
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;
    let report = if stdout {
        None
    } else {
        Some(report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?)
    };

    if let Some(report_path) = report.as_ref() {
        let report_abs = report_path
            .parent()
            .map(|parent| {
                if parent.as_os_str().is_empty() {
                    fs::canonicalize(".")
                } else {
                    fs::canonicalize(parent)
                }
            })
            .transpose()
            .with_context(|| format!("Failed to resolve output path: {}", report_path.display()))?;
        if let Some(report_dir) = report_abs {
            let report_target = report_dir.join(
                report_path
                    .file_name()
                    .ok_or_else(|| anyhow::anyhow!("Invalid report path"))?,
            );
            if report_target == input_abs {
                return Err(CliError::new(
                    format!(
                        "report path must differ from input: {}",
                        report_path.display()
                    ),
                    Some("choose a different output path".to_string()),
                ));
            }
        }
    }

    let rep = rotel_core::replay_capture_file(&resolved_input, &options)
        .context("capture replay failed")?;
    let json = serialize_report(&rep, format)?;

    let Some(report) = report else {
        print!("{}", json);
        if list_diagnostics && !quiet {
            print_diagnostics(&rep);
        }
        return check_strict(&rep, strict);
    };

    if let Some(parent) = report.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }

    fs::write(&report, json)
        .with_context(|| format!("Failed to write report: {}", report.display()))?;

    if list_diagnostics && !quiet {
        print_diagnostics(&rep);
    }
    if !quiet {
        eprintln!("OK: report written -> {}", report.display());
    }
    check_strict(&rep, strict)
}

fn check_strict(rep: &SessionReport, strict: bool) -> Result<(), CliError> {
    if strict && !rep.diagnostics.is_empty() {
        return Err(CliError::new(
            "protocol diagnostics detected",
            Some("use --list-diagnostics to inspect".to_string()),
        ));
    }
    Ok(())
}

fn serialize_report(rep: &SessionReport, format: OutputFormat) -> Result<String, CliError> {
    if format.pretty && format.compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if format.pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn print_diagnostics(rep: &SessionReport) {
    eprintln!("Protocol diagnostics:");
    for summary in &rep.diagnostics {
        eprintln!(
            "  {} {} ({})",
            summary.severity, summary.id, summary.count
        );
    }
}

fn cmd_encode(action: EncodeAction) -> Result<(), CliError> {
    let command = match action {
        EncodeAction::PowerOn => Command::PowerOn,
        EncodeAction::PowerOff => Command::PowerOff,
        EncodeAction::Mute => Command::Mute,
        EncodeAction::VolumeUp => Command::VolumeUp,
        EncodeAction::VolumeDown => Command::VolumeDown,
        EncodeAction::Volume { level } => Command::set_volume_level(level).map_err(|err| {
            CliError::new(
                err.to_string(),
                Some("pass a fraction such as 0.42".to_string()),
            )
        })?,
        EncodeAction::Source { name } => Command::select_source(&name).map_err(|err| {
            CliError::new(
                err.to_string(),
                Some(format!(
                    "known sources: {}",
                    AmplifierState::source_list().join(", ")
                )),
            )
        })?,
        EncodeAction::Query { what } => match what {
            QueryTarget::Power => Command::GetCurrentPower,
            QueryTarget::PowerResolved => Command::GetPower,
            QueryTarget::Volume => Command::GetVolume,
            QueryTarget::Source => Command::GetCurrentSource,
            QueryTarget::Freq => Command::GetCurrentFreq,
        },
    };
    println!("{}", command.wire());
    Ok(())
}

#[derive(Serialize)]
struct MonitorLine<'a> {
    media_title: String,
    volume_level: Option<f64>,
    muted: bool,
    state: &'a AmplifierState,
}

fn print_state(state: &AmplifierState) -> Result<(), CliError> {
    let line = MonitorLine {
        media_title: state.media_title(),
        volume_level: state.volume_level(),
        muted: state.is_muted(),
        state,
    };
    let json = serde_json::to_string(&line).context("JSON serialization failed")?;
    println!("{}", json);
    Ok(())
}

fn cmd_serial_monitor(
    port: &str,
    baud: u32,
    timeout: Duration,
    duration: Option<Duration>,
    name: String,
) -> Result<(), CliError> {
    let mut link = SerialLink::open(port, baud, timeout).map_err(|err| {
        CliError::new(
            format!("cannot open serial port {}: {}", port, err),
            Some("check the device path and permissions".to_string()),
        )
    })?;
    let writer = link
        .writer()
        .context("Failed to open a write handle on the serial port")?;

    let mut controller = Controller::new(SessionConfig { name });
    controller.attach(writer);
    info!(port, baud, "monitor started");

    let deadline = duration.map(|duration| Instant::now() + duration);
    let mut last = controller.snapshot();
    print_state(&last)?;

    while deadline.is_none_or(|deadline| Instant::now() < deadline) {
        let Some(chunk) = link.next_chunk().context("Serial read failed")? else {
            break;
        };
        if chunk.is_empty() {
            continue;
        }
        controller.on_bytes(&chunk);
        drain_diagnostics(&mut controller);
        let state = controller.snapshot();
        if state != last {
            print_state(&state)?;
            last = state;
        }
    }

    controller.finish();
    drain_diagnostics(&mut controller);
    info!(
        port,
        diagnostics = controller.diagnostic_count(),
        "monitor stopped"
    );
    Ok(())
}

fn drain_diagnostics<S: CommandSink>(controller: &mut Controller<S>) {
    for diagnostic in controller.take_diagnostics() {
        eprintln!("diagnostic: {} {}", diagnostic.id(), diagnostic);
    }
}

fn validate_input_file(input: &PathBuf) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a raw byte capture of the amplifier output".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass a raw byte capture of the amplifier output".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &PathBuf) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.clone());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        ));
    }
    if matches.len() > 1 {
        let hint = "pass a single capture file, or run once per file".to_string();
        let listed = matches
            .iter()
            .take(3)
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let mut message = format!(
            "multiple files match pattern '{}' ({} matches); matches: {}",
            pattern,
            matches.len(),
            listed
        );
        if matches.len() > 3 {
            message.push_str(", ...");
        }
        return Err(CliError::new(message, Some(hint)));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
