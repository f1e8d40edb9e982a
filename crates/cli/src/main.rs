//! APLIC interrupt harness CLI.
//!
//! Runs the interrupt test sequence against the simulated platform. It performs:
//! 1. **Configuration:** Built-in defaults, optionally overridden by a JSON file and command-line flags.
//! 2. **Run:** Every hart on its own thread; the boot hart runs the selected scenarios in order.
//! 3. **Verdict:** A per-scenario summary, then the first failing scenario's code as the exit status.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use aplic_core::Simulator;
use aplic_core::config::Config;
use aplic_core::sequencer::{Report, Scenario, ScenarioStatus};

/// Exit status when the configuration cannot be loaded or is invalid.
const EXIT_CONFIG: i32 = 0x02;

#[derive(Parser, Debug)]
#[command(
    name = "aplic-harness",
    author,
    version,
    about = "APLIC direct-mode interrupt test harness",
    long_about = "Configures the APLIC, CLINT, and bus-error units of the simulated platform, raises each \
                  interrupt kind in turn, and checks it is delivered exactly once.\n\nThe process exits with 0 \
                  when every scenario passes, otherwise with the failing scenario's code.\n\nExamples:\n  \
                  aplic-harness\n  aplic-harness --harts 4 -s software -s priority-drain\n  \
                  aplic-harness --config platform.json -vv"
)]
struct Cli {
    /// JSON configuration file; omitted fields keep their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of harts to simulate (overrides the configuration).
    #[arg(long)]
    harts: Option<usize>,

    /// Scenario to run; repeat to select several. Default: all, in order.
    #[arg(short, long = "scenario", value_name = "NAME")]
    scenarios: Vec<Scenario>,

    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli).unwrap_or_else(|msg| {
        error!("{msg}");
        eprintln!("Error: {msg}");
        process::exit(EXIT_CONFIG);
    });
    let simulator = Simulator::new(config).unwrap_or_else(|err| {
        eprintln!("Error: invalid configuration: {err}");
        process::exit(EXIT_CONFIG);
    });

    let scenarios = if cli.scenarios.is_empty() {
        Scenario::ALL.to_vec()
    } else {
        cli.scenarios
    };

    match simulator.run(&scenarios) {
        Ok(report) => {
            print_summary(&report);
            process::exit(report.exit_code());
        }
        Err(err) => {
            eprintln!("\n[!] FATAL: {err}");
            process::exit(err.exit_code());
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn load_config(cli: &Cli) -> Result<Config, String> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path).map_err(|e| e.to_string())?,
        None => Config::default(),
    };
    if let Some(harts) = cli.harts {
        config.platform.num_harts = harts;
    }
    Ok(config)
}

fn print_summary(report: &Report) {
    println!();
    for outcome in &report.outcomes {
        let verdict = match &outcome.status {
            ScenarioStatus::Passed => "OK".to_owned(),
            ScenarioStatus::Skipped(reason) => format!("SKIPPED ({reason})"),
            ScenarioStatus::Failed(err) => format!("FAILED {:#04x}: {err}", err.exit_code()),
        };
        println!("  {:<16} {verdict}", outcome.scenario.name());
    }
    println!("\n[*] Exit code {:#04x}", report.exit_code());
}
