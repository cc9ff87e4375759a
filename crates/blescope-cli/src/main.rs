use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use blescope_core::{DecodedPdu, DecoderState, RawPacket, SnifferMode, decode};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(name = "blescope")]
#[command(version)]
#[command(
    about = "Decoder for BLE link-layer sniffer capture logs.",
    long_about = None,
    after_help = "Examples:\n  blescope log decode capture.jsonl -o decoded.jsonl\n  blescope log decode capture.jsonl --stdout --text\n  blescope log decode capture.jsonl --mode scanning --stdout"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on sniffer capture logs (newline-delimited JSON).
    Log {
        #[command(subcommand)]
        command: LogCommands,
    },
}

#[derive(Subcommand, Debug)]
enum LogCommands {
    /// Decode a capture log into typed link-layer PDUs.
    #[command(
        after_help = "Examples:\n  blescope log decode capture.jsonl -o decoded.jsonl\n  blescope log decode capture.jsonl --stdout --pretty\n  blescope log decode capture.jsonl --stdout --text --mode advertising_ext"
    )]
    Decode {
        /// Path to a .jsonl capture log (one record per line)
        input: PathBuf,

        /// Initial sniffer mode for cross-packet correlation
        #[arg(long, default_value = "static", value_parser = parse_mode)]
        mode: SnifferMode,

        /// Decode each record in isolation (no cross-packet correlation)
        #[arg(long)]
        stateless: bool,

        /// Output path (JSON lines, or summaries with --text)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        output: Option<PathBuf>,

        /// Write decoded output to stdout
        #[arg(long, conflicts_with = "output")]
        stdout: bool,

        /// Pretty-print each decoded record as a JSON document
        #[arg(long, conflicts_with = "text")]
        pretty: bool,

        /// Human-readable summary lines instead of JSON
        #[arg(long)]
        text: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Log { command } => match command {
            LogCommands::Decode {
                input,
                mode,
                stateless,
                output,
                stdout,
                pretty,
                text,
                quiet,
            } => cmd_log_decode(input, mode, stateless, output, stdout, pretty, text, quiet),
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
        CliError::new(err.to_string(), None)
    }
}

fn cmd_log_decode(
    input: PathBuf,
    mode: SnifferMode,
    stateless: bool,
    output: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    text: bool,
    quiet: bool,
) -> Result<(), CliError> {
    validate_input_file(&input)?;
    let contents = fs::read_to_string(&input)
        .with_context(|| format!("Failed to read capture log: {}", input.display()))?;

    let mut state = (!stateless).then(|| DecoderState::new(mode));

    let mut rendered = String::new();
    let mut decoded = 0usize;
    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let pkt: RawPacket = serde_json::from_str(line).map_err(|err| {
            CliError::new(
                format!("invalid capture record on line {}: {}", idx + 1, err),
                Some("each line must be one JSON capture record".to_string()),
            )
        })?;
        let pdu = decode(&pkt, state.as_mut());
        rendered.push_str(&render_pdu(&pdu, pretty, text)?);
        rendered.push('\n');
        decoded += 1;
    }

    if stdout {
        print!("{}", rendered);
        return Ok(());
    }

    let output = output.expect("output required when not using stdout");
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(&output, rendered)
        .with_context(|| format!("Failed to write output: {}", output.display()))?;

    if !quiet {
        eprintln!("OK: {} records decoded -> {}", decoded, output.display());
    }
    Ok(())
}

fn render_pdu(pdu: &DecodedPdu, pretty: bool, text: bool) -> Result<String, CliError> {
    if text {
        return Ok(render::summary(pdu));
    }
    let json = if pretty {
        serde_json::to_string_pretty(pdu)
    } else {
        serde_json::to_string(pdu)
    };
    json.context("JSON serialization failed").map_err(Into::into)
}

fn validate_input_file(input: &PathBuf) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .jsonl capture log".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .jsonl capture log".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "jsonl" && ext != "json" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .jsonl capture log".to_string()),
        ));
    }
    Ok(())
}

fn parse_mode(value: &str) -> Result<SnifferMode, String> {
    Ok(match value {
        "static" => SnifferMode::Static,
        "advert_seek" => SnifferMode::AdvertSeek,
        "advert_hop" => SnifferMode::AdvertHop,
        "data" => SnifferMode::Data,
        "paused" => SnifferMode::Paused,
        "initiating" => SnifferMode::Initiating,
        "central" => SnifferMode::Central,
        "peripheral" => SnifferMode::Peripheral,
        "advertising" => SnifferMode::Advertising,
        "scanning" => SnifferMode::Scanning,
        "advertising_ext" => SnifferMode::AdvertisingExt,
        other => return Err(format!("unknown sniffer mode '{other}'")),
    })
}
