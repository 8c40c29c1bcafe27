use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::eval::Heuristic;

/// Number of knight directions; the default area cap is five per direction.
const DIRECTIONS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum SearchVariant {
    Minimax,
    AlphaBeta,
}

impl FromStr for SearchVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "minimax" => Ok(SearchVariant::Minimax),
            "alphabeta" => Ok(SearchVariant::AlphaBeta),
            _ => Err(Error::UnknownSearch(s.to_string())),
        }
    }
}

impl TryFrom<String> for SearchVariant {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for SearchVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchVariant::Minimax => write!(f, "minimax"),
            SearchVariant::AlphaBeta => write!(f, "alphabeta"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum HeuristicKind {
    Liberties,
    Area,
}

impl FromStr for HeuristicKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "liberties" => Ok(HeuristicKind::Liberties),
            "area" => Ok(HeuristicKind::Area),
            _ => Err(Error::UnknownHeuristic(s.to_string())),
        }
    }
}

impl TryFrom<String> for HeuristicKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for HeuristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeuristicKind::Liberties => write!(f, "liberties"),
            HeuristicKind::Area => write!(f, "area"),
        }
    }
}

/// Decision-maker settings. Fixed for the lifetime of an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub search: SearchVariant,
    pub heuristic: HeuristicKind,
    /// Flood-fill plies for the area heuristic
    pub area_depth: usize,
    /// Upper bound on cells counted by the area heuristic
    pub area_cap: usize,
    /// Deepest iterative-deepening round
    pub max_depth: usize,
    pub cache_heuristic: bool,
    pub heuristic_cache_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchVariant::AlphaBeta,
            heuristic: HeuristicKind::Liberties,
            area_depth: 4,
            area_cap: DIRECTIONS * 5,
            max_depth: 50,
            cache_heuristic: true,
            heuristic_cache_limit: 1_000_000,
        }
    }
}

impl Config {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read config {}", path.display()),
            source,
        })?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.max_depth, "max_depth"),
            (self.area_depth, "area_depth"),
            (self.area_cap, "area_cap"),
        ];
        for (value, name) in checks {
            if value == 0 {
                return Err(Error::InvalidConfiguration {
                    message: format!("{} must be positive", name),
                });
            }
        }
        if self.cache_heuristic && self.heuristic_cache_limit == 0 {
            return Err(Error::InvalidConfiguration {
                message: "heuristic_cache_limit must be positive when caching".to_string(),
            });
        }
        Ok(())
    }

    pub fn evaluator(&self) -> Heuristic {
        match self.heuristic {
            HeuristicKind::Liberties => Heuristic::Liberties,
            HeuristicKind::Area => Heuristic::Area {
                depth: self.area_depth,
                cap: self.area_cap,
            },
        }
    }
}
