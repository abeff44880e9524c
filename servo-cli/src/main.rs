//! servo-ctl - single-axis servo controller
//!
//! Loads the configuration, claims the PWM pin and drives the servo from
//! standard input (`toggle`, `status`, `set <angle>`, `quit`) or, with
//! `--daemon`, just reports status until SIGINT/SIGTERM.
//!
//! ## Environment Variables
//! - `SERVO_CONFIG`: configuration file (default: config/config.json)
//! - `RUST_LOG`: log filter, overrides `--log-level` and `system.log_level`

mod command;

use anyhow::Context;
use clap::Parser;
use colored::*;
use servo_actuator::{
    Config, HardwareChannel, LogLevel, PwmDriver, ServoController, SignalShutdown, SimulatedPwm,
    DEFAULT_CONFIG_PATH,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use command::{Command, USAGE};

#[derive(Parser)]
#[command(name = "servo-ctl")]
#[command(author = "Servo Gate Contributors")]
#[command(version = "2026.10.18")]
#[command(about = "Single-axis servo controller (PWM)", long_about = None)]
struct Args {
    /// Configuration file (JSON)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, env = "SERVO_CONFIG")]
    config: PathBuf,

    /// Log level, overrides system.log_level
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Validate the configuration and exit without touching hardware
    #[arg(long, default_value_t = false)]
    check: bool,

    /// Use the simulated PWM driver instead of GPIO
    #[arg(long, default_value_t = false)]
    simulate: bool,

    /// No interactive prompt; report status until interrupted
    #[arg(long, default_value_t = false, conflicts_with = "check")]
    daemon: bool,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    init_tracing(args.log_level.unwrap_or(config.system.log_level));
    tracing::debug!(path = %args.config.display(), "configuration loaded");

    if args.check {
        print_summary(&config);
        return Ok(());
    }

    if args.simulate {
        drive(&config, SimulatedPwm::new(), args.daemon)
    } else {
        drive_gpio(&config, args.daemon)
    }
}

fn init_tracing(level: LogLevel) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.as_directive().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(feature = "rpi")]
fn drive_gpio(config: &Config, daemon: bool) -> anyhow::Result<()> {
    drive(config, servo_actuator::RpiPwm::new(), daemon)
}

#[cfg(not(feature = "rpi"))]
fn drive_gpio(config: &Config, daemon: bool) -> anyhow::Result<()> {
    tracing::warn!("built without the `rpi` feature, using simulated PWM");
    drive(config, SimulatedPwm::new(), daemon)
}

fn drive<D>(config: &Config, mut driver: D, daemon: bool) -> anyhow::Result<()>
where
    D: PwmDriver,
    D::Channel: 'static,
{
    let mut controller = ServoController::launch(config, &mut driver, &SignalShutdown)
        .context("failed to start servo controller")?;

    tracing::info!("servo controller ready: {}", controller.status());

    let result = if daemon {
        config
            .system
            .report_interval()
            .map(|interval| report_until_shutdown(&controller, interval))
            .map_err(anyhow::Error::from)
    } else {
        println!("{}", "=== Servo Controller ===".bold());
        println!("Press Ctrl+C to exit");
        interactive(&mut controller, io::stdin().lock(), io::stdout())
    };

    controller.cleanup();
    result
}

/// Reads commands until `quit` or end of input. Unrecognized lines print
/// the usage and leave the servo untouched.
fn interactive<C, R, W>(controller: &mut ServoController<C>, input: R, mut output: W) -> anyhow::Result<()>
where
    C: HardwareChannel,
    R: BufRead,
    W: Write,
{
    writeln!(output, "{}", USAGE)?;

    let mut lines = input.lines();
    loop {
        write!(output, "{} ", ">".cyan())?;
        output.flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        // escrita que falha já foi registrada no log pelo controlador
        match line.parse::<Command>() {
            Ok(Command::Toggle) => {
                if controller.toggle_position().is_ok() {
                    let state = if controller.is_open() { "open".green() } else { "closed".yellow() };
                    writeln!(output, "servo {}", state)?;
                }
            }
            Ok(Command::Status) => writeln!(output, "{}", controller.status())?,
            Ok(Command::Set(angle)) => {
                if let Ok(duty) = controller.set_position(angle) {
                    writeln!(
                        output,
                        "servo at {:.1}° (duty cycle {:.2}%)",
                        controller.state().current_angle,
                        duty.percent()
                    )?;
                }
            }
            Ok(Command::Help) => writeln!(output, "{}", USAGE)?,
            Ok(Command::Quit) => break,
            Err(e) => {
                writeln!(output, "{} {}", "invalid command:".yellow().bold(), e)?;
                writeln!(output, "{}", USAGE)?;
            }
        }
    }

    Ok(())
}

fn report_until_shutdown<C: HardwareChannel>(controller: &ServoController<C>, interval: Duration) {
    let flag = controller.shutdown_flag();

    while !flag.is_requested() {
        tracing::debug!("{}", controller.status());
        thread::sleep(interval);
    }
}

fn print_summary(config: &Config) {
    let servo = &config.servo;
    println!("{} configuration is valid", "OK".green().bold());
    println!("  GPIO pin:        {}", servo.gpio_pin);
    println!("  Frequency:       {} Hz", servo.frequency);
    println!(
        "  Pulse width:     {}-{} µs",
        servo.min_pulse_width, servo.max_pulse_width
    );
    println!(
        "  Positions:       closed {}° / open {}° / default {}°",
        servo.position_closed, servo.position_open, servo.default_position
    );
    println!("  Log level:       {}", config.system.log_level);
    println!("  Park on exit:    {}", config.system.park_on_shutdown);
}
