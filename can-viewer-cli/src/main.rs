//! CAN Viewer CLI Application
//!
//! Reads frames from a CAN interface, decodes them with a DBC file and
//! shows the ten most recent decoded messages as a live terminal table.

use anyhow::{Context, Result};
use can_viewer_decoder::Decoder;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

mod bus;
mod history;
mod monitor;
mod render;
mod shutdown;

use bus::{resolve_open_params, BusKind, BusSession};
use monitor::{Monitor, MonitorSettings};
use shutdown::CancelToken;

/// CAN Viewer - Live decoded CAN messages
#[derive(Parser, Debug)]
#[command(name = "can-viewer")]
#[command(about = "Show decoded CAN messages live in the terminal", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the DBC file
    #[arg(long, value_name = "FILE")]
    dbc: PathBuf,

    /// CAN interface kind (e.g. 'socketcan', 'pcan', 'bmcan')
    #[arg(long, value_name = "NAME")]
    interface: String,

    /// CAN channel (e.g. 'vcan0')
    #[arg(long, value_name = "NAME")]
    channel: String,

    /// CAN bitrate in bit/s
    #[arg(long, value_name = "BITRATE", default_value_t = 500_000)]
    bitrate: u32,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    log::info!("CAN Viewer v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", can_viewer_decoder::VERSION);

    let decoder = Decoder::from_dbc(&args.dbc).context("Failed to load DBC file")?;
    let stats = decoder.database_stats();
    log::info!(
        "Catalog ready: {} messages, {} signals",
        stats.num_messages,
        stats.num_signals
    );

    let cancel = CancelToken::new();
    cancel
        .install_interrupt_handler()
        .context("Failed to install interrupt handler")?;

    let params = resolve_open_params(BusKind::from_name(&args.interface), &args.channel, args.bitrate);
    log::debug!("Resolved bus parameters: {:?}", params);
    let bus = bus::open(&params).context("Failed to setup CAN interface")?;

    let mut monitor = Monitor::new(&decoder, io::stdout(), MonitorSettings::default());
    monitor
        .run(BusSession::new(bus), &cancel)
        .context("Monitor stopped")?;

    Ok(())
}

/// Initialize logging based on verbosity level
///
/// The table owns stdout, so logs go to stderr and default to warnings only.
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::{Builder, Target};
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .target(Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
