// src/config/config.rs
use crate::{miner::params::ArgonParams, types::MiningMode, utils::error::MinerError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default node endpoint (local aquachain RPC)
pub const DEFAULT_NODE_URL: &str = "http://127.0.0.1:8543";

/// Main configuration structure for the mining application
///
/// Covers the node endpoints, worker count, search batch size, polling
/// intervals and Argon2id parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Solo (submit blocks to a full node) or pool (submit shares)
    #[serde(default)]
    pub mode: MiningMode,

    /// Where work is fetched from
    #[serde(default = "default_node_url")]
    pub getwork_url: String,

    /// Where winners are submitted (default: `getwork_url`)
    #[serde(default)]
    pub submit_url: Option<String>,

    /// Number of mining workers (one device each)
    /// (default: number of CPU cores)
    #[serde(default = "default_devices")]
    pub devices: usize,

    /// Nonces per device call
    /// (default: 32768)
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,

    /// getWork polling interval in milliseconds
    #[serde(default = "default_refresh_rate_ms")]
    pub refresh_rate_ms: u64,

    /// How often a parked worker re-checks for new pool work, in milliseconds
    #[serde(default = "default_reject_wait_ms")]
    pub reject_wait_ms: u64,

    /// Send winners even with non-protocol Argon2id parameters
    #[serde(default)]
    pub force_submit: bool,

    /// Argon2id parameters
    #[serde(default)]
    pub argon: ArgonConfig,
}

/// `[argon]` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgonConfig {
    /// Passes over memory
    #[serde(default = "one")]
    pub time_cost: u32,
    /// Memory in KiB
    #[serde(default = "one")]
    pub memory_cost: u32,
    /// Parallelism
    #[serde(default = "one")]
    pub lanes: u32,
}

impl Default for ArgonConfig {
    fn default() -> Self {
        ArgonParams::default().into()
    }
}

impl From<ArgonParams> for ArgonConfig {
    fn from(p: ArgonParams) -> Self {
        ArgonConfig {
            time_cost: p.time_cost,
            memory_cost: p.memory_cost,
            lanes: p.lanes,
        }
    }
}

impl From<ArgonConfig> for ArgonParams {
    fn from(c: ArgonConfig) -> Self {
        ArgonParams {
            time_cost: c.time_cost,
            memory_cost: c.memory_cost,
            lanes: c.lanes,
        }
    }
}

fn one() -> u32 {
    1
}

fn default_node_url() -> String {
    DEFAULT_NODE_URL.into()
}

fn default_devices() -> usize {
    num_cpus::get()
}

fn default_batch_size() -> u64 {
    8192 * 4
}

fn default_refresh_rate_ms() -> u64 {
    3000
}

fn default_reject_wait_ms() -> u64 {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mode: MiningMode::default(),
            getwork_url: default_node_url(),
            submit_url: None,
            devices: default_devices(),
            batch_size: default_batch_size(),
            refresh_rate_ms: default_refresh_rate_ms(),
            reject_wait_ms: default_reject_wait_ms(),
            force_submit: false,
            argon: ArgonConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Ok(Config)` - Successfully loaded and validated configuration
    /// * `Err(MinerError)` - If file couldn't be read, parsed or validated
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, MinerError> {
        let path = path.into();
        let config_str = std::fs::read_to_string(&path).map_err(|e| {
            MinerError::ConfigError(format!(
                "Failed to read config at {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::parse(&config_str)
    }

    /// Parses and validates TOML text
    pub fn parse(text: &str) -> Result<Self, MinerError> {
        let config: Config = toml::from_str(text)
            .map_err(|e| MinerError::ConfigError(format!("Invalid config format: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks URLs and sizes
    pub fn validate(&self) -> Result<(), MinerError> {
        for url in [Some(&self.getwork_url), self.submit_url.as_ref()]
            .into_iter()
            .flatten()
        {
            Url::parse(url)
                .map_err(|e| MinerError::ConfigError(format!("Invalid URL {}: {}", url, e)))?;
        }
        if self.devices == 0 {
            return Err(MinerError::ConfigError("devices must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(MinerError::ConfigError("batch_size must be at least 1".into()));
        }
        if self.refresh_rate_ms == 0 {
            return Err(MinerError::ConfigError("refresh_rate_ms must be at least 1".into()));
        }
        let argon = self.argon;
        if argon.time_cost == 0 || argon.memory_cost == 0 || argon.lanes == 0 {
            return Err(MinerError::ConfigError(
                "argon time_cost, memory_cost and lanes must all be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Endpoint winners are submitted to
    ///
    /// Solo mining always submits to the node work comes from.
    pub fn submit_endpoint(&self) -> &str {
        match (self.mode, &self.submit_url) {
            (MiningMode::Pool, Some(url)) => url,
            _ => &self.getwork_url,
        }
    }

    /// getWork polling interval
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_rate_ms)
    }

    /// Poll interval of a worker parked after a reject
    pub fn reject_wait(&self) -> Duration {
        Duration::from_millis(self.reject_wait_ms)
    }

    /// Generates a configuration template string
    ///
    /// # Arguments
    /// * `solo` - Template for solo mining instead of pool mining
    ///
    /// # Returns
    /// String containing a commented TOML configuration template
    pub fn generate_template(solo: bool) -> String {
        let mut template = String::new();
        template.push_str("# Aquachain Miner Configuration\n\n");
        if solo {
            template.push_str("# Submit blocks directly to a full node\n");
            template.push_str("mode = \"solo\"\n");
        } else {
            template.push_str("# Submit shares to a pool\n");
            template.push_str("mode = \"pool\"\n");
        }
        template.push_str(&format!("getwork_url = \"{}\"\n", DEFAULT_NODE_URL));
        if !solo {
            template.push_str("# submit_url = \"http://pool.example.com:8888/0xYourAddress/worker01\"\n");
        }
        template.push_str("# Number of mining workers (one device each)\n");
        template.push_str(&format!("devices = {}\n", default_devices()));
        template.push_str("# Nonces per device call\n");
        template.push_str(&format!("batch_size = {}\n", default_batch_size()));
        template.push_str("# getWork polling interval (ms)\n");
        template.push_str(&format!("refresh_rate_ms = {}\n", default_refresh_rate_ms()));
        template.push_str("# Re-check interval after a rejected share (ms)\n");
        template.push_str(&format!("reject_wait_ms = {}\n", default_reject_wait_ms()));
        template.push_str("# Submit even with non-protocol argon parameters\n");
        template.push_str("force_submit = false\n\n");
        template.push_str("# Argon2id parameters; the network only accepts 1/1/1\n");
        template.push_str("[argon]\n");
        template.push_str("time_cost = 1\n");
        template.push_str("memory_cost = 1\n");
        template.push_str("lanes = 1\n");
        template
    }
}

/// Parses a refresh interval such as `"3s"`, `"0.5s"` or `"1m"`
///
/// A bare number is taken as seconds.
pub fn parse_refresh_rate(text: &str) -> Result<Duration, MinerError> {
    let text = text.trim();
    let (number, scale) = if let Some(n) = text.strip_suffix('m') {
        (n, 60.0)
    } else if let Some(n) = text.strip_suffix('s') {
        (n, 1.0)
    } else {
        (text, 1.0)
    };

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| MinerError::InputError(format!("Invalid refresh rate: {}", text)))?;
    let seconds = value * scale;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(MinerError::InputError(format!(
            "Refresh rate must be positive: {}",
            text
        )));
    }
    Ok(Duration::from_secs_f64(seconds))
}

/// Parses `--argon t,m,l`
pub fn parse_argon(text: &str) -> Result<ArgonParams, MinerError> {
    let parts: Vec<u32> = text
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .map_err(|_| MinerError::InputError(format!("Invalid argon parameters: {}", text)))?;

    match parts.as_slice() {
        &[time_cost, memory_cost, lanes] if time_cost > 0 && memory_cost > 0 && lanes > 0 => {
            Ok(ArgonParams {
                time_cost,
                memory_cost,
                lanes,
            })
        }
        _ => Err(MinerError::InputError(format!(
            "Expected three positive values t,m,l: {}",
            text
        ))),
    }
}
