//! meeflow CLI: Command-line interface for the mission-mint flow simulation

use clap::{Parser, Subcommand};
use meeflow_engine::{
    spawn_simulation, Config, LogEntry, RunState, Script, Sequencer, SimulationEvent, NODES,
};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Playback simulator for the MeeBot mission-mint flow
#[derive(Parser)]
#[command(name = "meeflow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the TUI (default when no command specified)
    Tui,

    /// Play the script without a UI, printing the system log
    Play {
        /// Delay between steps in milliseconds (overrides config)
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Output one JSON object per log entry
        #[arg(long)]
        json: bool,
    },

    /// Print the nodes and steps of the effective script
    Script {
        /// Output the steps as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write .meeflow/config.json with defaults
    Init,
}

fn main() {
    let cli = Cli::parse();

    // Log output would corrupt the TUI screen.
    if !matches!(cli.command, None | Some(Commands::Tui)) {
        init_tracing();
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let default_level = "warn";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> CliResult {
    let root = std::env::current_dir()?;
    let config_path = Config::path_in(&root);

    match cli.command {
        None | Some(Commands::Tui) => {
            let config = Config::load_or_default(&config_path)?;
            let script = config.script(&root)?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(meeflow_tui::run_tui(config, script))
        }
        Some(Commands::Play { delay_ms, json }) => {
            let mut config = load_config(&config_path)?;
            if let Some(delay_ms) = delay_ms {
                config.step_delay_ms = delay_ms;
                config.validate()?;
            }
            let script = config.script_or_builtin(&root);
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(cmd_play(&config, script, json))
        }
        Some(Commands::Script { json }) => {
            let config = load_config(&config_path)?;
            let script = config.script(&root)?;
            cmd_script(&script, json)
        }
        Some(Commands::Init) => cmd_init(&config_path),
    }
}

fn load_config(path: &Path) -> Result<Config, meeflow_engine::ConfigError> {
    let config = Config::load_or_default(path)?;
    debug!(path = %path.display(), ?config, "loaded config");
    Ok(config)
}

async fn cmd_play(config: &Config, script: Script, json: bool) -> CliResult {
    let sequencer = Sequencer::with_delay(script, config.step_delay());
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let handle = spawn_simulation(sequencer, event_tx);

    handle.start().await?;

    while let Some(event) = event_rx.recv().await {
        match event {
            SimulationEvent::Logged(entry) => print_entry(&entry, json)?,
            SimulationEvent::StateChanged {
                state: RunState::Finished,
            } => {
                // The closing log entry follows the state change.
                while let Ok(event) = event_rx.try_recv() {
                    if let SimulationEvent::Logged(entry) = event {
                        print_entry(&entry, json)?;
                    }
                }
                break;
            }
            _ => {}
        }
    }

    handle.shutdown().await;
    Ok(())
}

fn print_entry(entry: &LogEntry, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string(entry)?);
    } else {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

/// `[HH:MM:SS] LEVEL   message`
fn format_entry(entry: &LogEntry) -> String {
    let level = entry.severity.to_string().to_uppercase();
    format!("[{}] {level:<7} {}", entry.time_label(), entry.message)
}

fn cmd_script(script: &Script, json: bool) -> CliResult {
    if json {
        println!("{}", script.to_json()?);
        return Ok(());
    }

    println!("Nodes:");
    for (i, node) in NODES.iter().enumerate() {
        println!("  {}  {:<16} {}", i + 1, node.label, node.description);
    }

    println!();
    println!("Steps:");
    for (i, step) in script.steps().iter().enumerate() {
        let node = meeflow_engine::node(step.node).map_or("-", |n| n.label);
        println!(
            "  {:>2}. [{}] {:<7} {}",
            i + 1,
            node,
            step.severity.to_string(),
            step.message
        );
    }

    Ok(())
}

fn cmd_init(config_path: &Path) -> CliResult {
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    Config::default().save(config_path)?;
    println!("Created {}", config_path.display());
    Ok(())
}
