use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;
use wildrealms::cli::commands;
use wildrealms::config::biome::BiomeConfig;
use wildrealms::config::simulation::SimulationConfig;

#[derive(Parser)]
#[command(name = "wildrealms")]
#[command(about = "Wandering wildlife, discovery mini-game and pollution challenge for immersive biome scenes")]
#[command(version)]
struct Cli {
    /// Path to the configuration file (defaults apply if it does not exist)
    #[arg(short, long, default_value = "wildrealms.toml")]
    config: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve a scene over WebSocket
    Run {
        /// Preset biome (overrides the config file)
        #[arg(short, long)]
        biome: Option<String>,

        /// Serve a biome table loaded from a TOML file instead of a preset
        #[arg(long, conflicts_with = "biome")]
        biome_file: Option<PathBuf>,

        /// Scene seed, 0 for random (overrides the config file)
        #[arg(short, long)]
        seed: Option<u64>,

        /// WebSocket port (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run the steering engine headless and print statistics
    Simulate {
        #[command(flatten)]
        biome: BiomeArgs,

        /// Number of runs, one seed each
        #[arg(short, long, default_value_t = 8)]
        runs: u32,

        /// First seed
        #[arg(short, long, default_value_t = 1)]
        seed: u64,

        /// Simulated seconds per run
        #[arg(long, default_value_t = 300.0)]
        seconds: f32,

        /// Fixed frame step in seconds
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f32,

        /// Print statistics as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Play a challenge script with the given option indices
    Challenge {
        #[arg(short, long, default_value = "ocean")]
        biome: String,

        /// Option index for each step, in order
        choices: Vec<usize>,
    },

    /// Apply population scenarios by id or name, in order
    Population { scenarios: Vec<String> },

    /// Show a biome's species table
    Species {
        #[command(flatten)]
        biome: BiomeArgs,
    },
}

#[derive(clap::Args)]
struct BiomeArgs {
    /// Preset biome name
    #[arg(short, long, default_value = "ocean")]
    biome: String,

    /// Load the biome table from a TOML file instead of a preset
    #[arg(long)]
    biome_file: Option<PathBuf>,
}

impl BiomeArgs {
    fn load(&self) -> Result<BiomeConfig, String> {
        match &self.biome_file {
            Some(path) => BiomeConfig::from_file(path),
            None => BiomeConfig::preset(&self.biome).ok_or_else(|| {
                format!(
                    "Unknown biome '{}' (expected one of: {})",
                    self.biome,
                    BiomeConfig::preset_names().join(", ")
                )
            }),
        }
    }
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn exit_with(context: &str, e: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", context, e);
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match SimulationConfig::from_file_or_default(Path::new(&cli.config)) {
        Ok(c) => c,
        Err(e) => exit_with("Error loading config", e),
    };
    init_tracing(&config.log_level, cli.log_json);

    match cli.command {
        Commands::Run {
            biome,
            biome_file,
            seed,
            port,
        } => {
            if let Some(b) = biome {
                config.biome = b;
            }
            let custom = biome_file.map(|path| {
                BiomeConfig::from_file(&path).unwrap_or_else(|e| exit_with("Error loading biome", e))
            });
            if let Some(s) = seed {
                config.seed = s;
            }
            if let Some(p) = port {
                config.websocket_port = p;
            }
            if let Err(e) = config.validate() {
                exit_with("Invalid configuration", e);
            }
            if let Err(e) = commands::run_server(&config, custom).await {
                exit_with("Scene error", e);
            }
        }

        Commands::Simulate {
            biome,
            runs,
            seed,
            seconds,
            dt,
            json,
        } => {
            let biome = biome.load().unwrap_or_else(|e| exit_with("Error loading biome", e));
            match commands::simulate(&biome, seed, runs, seconds, dt) {
                Ok(results) if json => match serde_json::to_string_pretty(&results) {
                    Ok(text) => println!("{}", text),
                    Err(e) => exit_with("Cannot serialize statistics", e),
                },
                Ok(results) => commands::print_run_report(&results),
                Err(e) => exit_with("Simulation error", e),
            }
        }

        Commands::Challenge { biome, choices } => {
            if let Err(e) = commands::play_challenge(&biome, &choices) {
                exit_with("Challenge error", e);
            }
        }

        Commands::Population { scenarios } => {
            if let Err(e) = commands::run_population(&scenarios) {
                exit_with("Population error", e);
            }
        }

        Commands::Species { biome } => {
            let biome = biome.load().unwrap_or_else(|e| exit_with("Error loading biome", e));
            commands::list_species(&biome);
        }
    }
}
