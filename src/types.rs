// src/types.rs
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where winning candidates are sent and how
///
/// The mode decides both the submission dispatch (blocking vs detached)
/// and the reject policy of the workers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MiningMode {
    /// Submit blocks directly to a full node, synchronously
    ///
    /// The finding worker blocks until the node answers, so two workers
    /// never race to submit conflicting blocks.
    #[clap(name = "solo")]
    Solo,

    /// Submit shares to a pool, fire-and-forget
    ///
    /// A rejected share parks the worker until the pool publishes new work.
    #[default]
    #[clap(name = "pool")]
    Pool,
}

impl MiningMode {
    /// True for solo mining
    pub fn is_solo(self) -> bool {
        self == MiningMode::Solo
    }

    /// Name of what a winning candidate is called in this mode
    pub fn found_noun(self) -> &'static str {
        match self {
            MiningMode::Solo => "block",
            MiningMode::Pool => "share",
        }
    }
}

impl fmt::Display for MiningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiningMode::Solo => write!(f, "solo"),
            MiningMode::Pool => write!(f, "pool"),
        }
    }
}

impl FromStr for MiningMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "solo" => Ok(MiningMode::Solo),
            "pool" => Ok(MiningMode::Pool),
            _ => Err(format!("Unknown mining mode: {}", s)),
        }
    }
}
