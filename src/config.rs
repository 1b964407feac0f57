use log::warn;
use std::env;
use std::str::FromStr;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_SEARCH_BUDGET: u64 = 1_000_000;

/// Knobs for the allocation search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverConfig {
    /// Maximum number of tentative placements the backtracking phase may try.
    /// Zero disables backtracking; a failed greedy pass is then final.
    pub search_budget: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            search_budget: DEFAULT_SEARCH_BUDGET,
        }
    }
}

impl SolverConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        Self {
            search_budget: parse_or("SEATING_SEARCH_BUDGET", DEFAULT_SEARCH_BUDGET),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub solver: SolverConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        Self {
            bind_addr: env::var("SEATING_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            solver: SolverConfig::from_env(),
        }
    }
}

fn load_dotenv() {
    let _ = dotenv::dotenv();
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_value<T: FromStr + Copy + std::fmt::Display>(key: &str, raw: &str, default: T) -> T {
    raw.trim().parse().unwrap_or_else(|_| {
        warn!("Ignoring unparseable {}={:?}; using {}", key, raw, default);
        default
    })
}
