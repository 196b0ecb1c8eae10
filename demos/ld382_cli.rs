//! Command-line utility for LD382 (UFO) WiFi LED controllers.
//!
//! Scan the network, or connect to one or more controllers and apply the
//! requested settings in order: power on, power off, color, white, program.
//!
//! Run with: cargo run --example ld382_cli -- --help

use std::process;

use clap::Parser;
use futures::future::try_join_all;
use ld382::{
    Color, Controller, DEFAULT_PORT, Endpoint, EventStream, Options, ProgramMode, ScanOptions,
    Speed, Transmission, White, scan_with,
};

#[derive(Parser)]
#[command(name = "ld382")]
#[command(about = "UFO WiFi LED Controller Utility", long_about = None)]
struct Cli {
    /// Scan for LED controllers
    #[arg(short, long)]
    scan: bool,

    /// IP of the controller (repeatable)
    #[arg(short, long)]
    ip: Vec<String>,

    /// RGB color value, e.g. 255,0,0 for red
    #[arg(short, long)]
    color: Option<Color>,

    /// White level (0-255)
    #[arg(short, long)]
    white: Option<White>,

    /// Built-in program, e.g. seven_color_cross_fade
    #[arg(short, long)]
    program: Option<ProgramMode>,

    /// Program speed (0-255)
    #[arg(long, default_value = "16")]
    speed: Speed,

    /// Power on
    #[arg(long)]
    poweron: bool,

    /// Power off
    #[arg(long)]
    poweroff: bool,

    /// Suppress output
    #[arg(long)]
    quiet: bool,

    /// Debug mode
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn echo(&self, line: String) {
        if !self.quiet {
            println!("{line}");
        }
    }
}

/// Await one command; if it never reached the socket, report why the
/// connection went down.
async fn deliver(
    ip: &str,
    transmission: Transmission,
    events: &mut EventStream,
) -> Result<(), String> {
    if transmission.await.is_flushed() {
        return Ok(());
    }
    match events.closed().await {
        Err(e) => Err(format!("{ip}: {e}")),
        Ok(()) => Err(format!("{ip}: connection closed before the command was sent")),
    }
}

/// Connect to `ip`, apply every requested setting in order, then disconnect.
async fn apply(cli: &Cli, ip: &str) -> Result<(), String> {
    let (controller, mut events) =
        Controller::open(Endpoint::new(ip, DEFAULT_PORT, Options::no_retry()));

    match events.connected().await {
        Some(Ok(())) => {}
        Some(Err(e)) => return Err(e.to_string()),
        None => return Err(format!("{ip}: connection closed")),
    }

    if cli.poweron {
        cli.echo(format!("{ip} Power on"));
        deliver(ip, controller.power_on(), &mut events).await?;
    }
    if cli.poweroff {
        cli.echo(format!("{ip} Power off"));
        deliver(ip, controller.power_off(), &mut events).await?;
    }
    if let Some(color) = cli.color {
        cli.echo(format!(
            "{ip} RGB {},{},{}",
            color.red(),
            color.green(),
            color.blue()
        ));
        deliver(ip, controller.rgb(color), &mut events).await?;
    }
    if let Some(white) = cli.white {
        cli.echo(format!("{ip} White {}", white.value()));
        deliver(ip, controller.white(white), &mut events).await?;
    }
    if let Some(program) = cli.program {
        cli.echo(format!("{ip} Program {program} at speed {}", cli.speed.value()));
        deliver(ip, controller.builtin_program(program, cli.speed), &mut events).await?;
    }

    controller.disconnect();
    // wait for the socket to close so queued frames are not cut off
    events.closed().await.map_err(|e| format!("{ip}: {e}"))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.debug { "ld382=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if !cli.scan && cli.ip.is_empty() {
        eprintln!("Error: Provide an IP or use --scan");
        process::exit(1);
    }

    if cli.scan {
        println!("Scanning network for LED Controllers ...");
        match scan_with(&ScanOptions::default()).await {
            Ok(replies) => {
                for reply in replies {
                    println!("{}", reply.replace(',', "\t"));
                }
            }
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
        return;
    }

    // the first failing controller ends the run, like an error event would
    if let Err(e) = try_join_all(cli.ip.iter().map(|ip| apply(&cli, ip))).await {
        eprintln!("{e}");
        process::exit(1);
    }
}
