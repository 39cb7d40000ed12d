// src/cli/commands.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Aquachain Miner CLI - Argon2id proof-of-work miner in Rust
#[derive(Parser, Debug)]
#[command(name = "aqua-miner-rs")]
#[command(version, about, long_about = None)]
pub struct Commands {
    /// The action to perform (start mining, run benchmarks, or generate config)
    #[command(subcommand)]
    pub action: Action,
}

/// Top-level commands for the miner application
#[derive(Subcommand, Debug)]
pub enum Action {
    /// Start mining operation with specified options
    Start(StartOptions),

    /// Measure CPU hashrate for the given Argon2id parameters
    Benchmark(BenchmarkOptions),

    /// Generate configuration file template
    Config(ConfigOptions),
}

/// Options for starting the mining operation
#[derive(Parser, Debug)]
pub struct StartOptions {
    /// Path to configuration file; defaults apply when it does not exist
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Number of mining workers (overrides config)
    #[arg(short, long)]
    pub devices: Option<usize>,

    /// Solo mine against a full node (overrides config)
    #[arg(long)]
    pub solo: bool,

    /// Node or pool getWork URL (overrides config)
    #[arg(short, long)]
    pub url: Option<String>,

    /// Argon2id parameters as t,m,l (overrides config)
    #[arg(long)]
    pub argon: Option<String>,

    /// Submit winners even with non-protocol argon parameters
    #[arg(long)]
    pub force_submit: bool,

    /// getWork polling interval, e.g. 3s or 0.5m (overrides config)
    #[arg(long)]
    pub refresh: Option<String>,
}

/// Options for running mining benchmarks
#[derive(Parser, Debug)]
pub struct BenchmarkOptions {
    /// Duration of benchmark in seconds
    #[arg(short, long, default_value_t = 60)]
    pub duration: u64,

    /// Number of threads to use
    #[arg(short, long, default_value_t = num_cpus::get())]
    pub threads: usize,

    /// Argon2id parameters as t,m,l
    #[arg(long, default_value = "1,1,1")]
    pub argon: String,
}

/// Options for generating configuration files
#[derive(Parser, Debug)]
pub struct ConfigOptions {
    /// Output file path
    #[arg(short, long, default_value = "config.toml")]
    pub output: PathBuf,

    /// Generate a solo mining template instead of a pool one
    #[arg(short, long)]
    pub solo: bool,
}
