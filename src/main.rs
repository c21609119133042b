use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use markspace_lib::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_DEVICE, DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_SETTLE_DELAY,
};
use markspace_lib::{
    Challenge, HandshakeConfig, HandshakeReport, Interrogator, LineConfig, OsEntropy, TtyLine,
};

#[cfg(not(target_os = "linux"))]
compile_error!("interrogate needs Linux termios stick parity (CMSPAR)");

const LONG_ABOUT: &str = "\
Uses the Linux termios interface to interrogate a serial device and determine whether it speaks \
the mark/space parity protocol.

Two random 32-bit values are sent to the device, which must answer with their summation. \
A \"# Success -\" line is printed if the device passed the challenge and an \"Error -\" line \
if it did not.";

/// Interrogate a serial device for mark/space protocol support.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = LONG_ABOUT)]
struct Cli {
    /// The path to the serial modem to interrogate.
    #[arg(default_value = DEFAULT_DEVICE)]
    devname: PathBuf,
    /// Line speed in baud.
    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,
    /// Time limit for the whole exchange, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_HANDSHAKE_TIMEOUT.as_millis() as u64)]
    timeout_ms: u64,
    /// Pause after each parity change, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_SETTLE_DELAY.as_millis() as u64)]
    settle_ms: u64,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long)]
    log_file: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
}

/// Console diagnostics on stderr (stdout carries the "#" lines), plus an optional log file.
fn setup_logging(
    log_file: Option<&Path>,
    verbosity: &Verbosity<WarnLevel>,
) -> Result<Option<WorkerGuard>> {
    let (file_writer, guard) = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file at: {:?}", path))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(verbosity.tracing_level_filter().into())
                .from_env_lossy(),
        )
        .with(fmt::layer().with_writer(std::io::stderr).without_time())
        .with(file_writer.map(|writer| fmt::layer().with_writer(writer).with_ansi(false)))
        .init();

    Ok(guard)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let guard = setup_logging(cli.log_file.as_deref(), &cli.verbose)?;

    match run(&cli).await {
        Ok(report) => {
            println!("# Success - {}", report);
            Ok(())
        }
        Err(e) => {
            debug!("Interrogation failed: {:?}", e);
            eprintln!("Error - {:#}", e);
            drop(guard);
            process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<HandshakeReport> {
    let challenge =
        Challenge::generate(&mut OsEntropy).context("Failed to read random operands")?;
    let settle_delay = Duration::from_millis(cli.settle_ms);

    println!("# Interrogating serial device {}", cli.devname.display());

    let line_config = LineConfig {
        path: cli.devname.clone(),
        baud: cli.baud,
        settle_delay,
    };
    let line = TtyLine::open(&line_config)
        .with_context(|| format!("Failed to open serial device {}", cli.devname.display()))?;

    let config = HandshakeConfig {
        timeout: Duration::from_millis(cli.timeout_ms),
        settle_delay,
        ..HandshakeConfig::default()
    };

    println!(
        "# Sending operand1({}) and operand2({})",
        challenge.operand1, challenge.operand2
    );
    let mut interrogator = Interrogator::new(line, config);
    let report = interrogator.interrogate(challenge).await?;
    Ok(report)
}
