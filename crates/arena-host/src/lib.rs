//! Async host for Elimination Arena
//!
//! Drives the synchronous [`arena_logic::Orchestrator`] with the two
//! collaborators that need I/O: a [`narrator::Narrator`] that writes round
//! text and a [`mirror::LedgerMirror`] that records the game elsewhere.
//! Neither can fail a game.

use std::{path::Path, str::FromStr, time::Duration};

use arena_logic::{
    CatalogError, CommandError, GameConfig, GameRound, RoundCatalog, DEFAULT_CONTESTANT_COUNT,
    STARTING_BALANCE,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;
use url::Url;

pub mod mirror;
pub mod narrator;
pub mod session;

/// Error type for host operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("command failed: {0}")]
    Command(#[from] CommandError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NarratorKind {
    #[default]
    Fallback,
    Http,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct NarratorConfig {
    #[serde(default)]
    pub kind: NarratorKind,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_narrator_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            kind: NarratorKind::default(),
            endpoint: None,
            timeout_ms: default_narrator_timeout_ms(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorKind {
    #[default]
    None,
    Log,
    Http,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MirrorConfig {
    #[serde(default)]
    pub kind: MirrorKind,
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Configuration for an [session::GameSession], as read from YAML.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// 64 hex characters; random when absent
    #[serde(default)]
    pub seed: Option<String>,
    #[serde(default = "default_starting_balance")]
    pub starting_balance: f64,
    #[serde(default = "default_contestant_count")]
    pub contestant_count: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub narrator: NarratorConfig,
    #[serde(default)]
    pub mirror: MirrorConfig,
    /// Replaces the built-in catalog
    #[serde(default)]
    pub rounds: Option<Vec<GameRound>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            starting_balance: default_starting_balance(),
            contestant_count: default_contestant_count(),
            log_level: default_log_level(),
            narrator: NarratorConfig::default(),
            mirror: MirrorConfig::default(),
            rounds: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be {len} hex bytes: {value}")]
    InvalidHex {
        field: &'static str,
        len: usize,
        value: String,
    },
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: String },
    #[error("contestant_count must be at least 2 (got {0})")]
    TooFewContestants(usize),
    #[error("{field} is required when kind is http")]
    MissingEndpoint { field: &'static str },
    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid rounds: {0}")]
    Catalog(#[from] CatalogError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NarratorTarget {
    Template,
    Http(Url),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MirrorTarget {
    None,
    Log,
    Http(Url),
}

#[derive(Clone, Debug)]
pub struct ValidatedConfig {
    pub seed: [u8; 32],
    pub game: GameConfig,
    pub log_level: Level,
    pub narrator: NarratorTarget,
    pub narrator_timeout: Duration,
    pub mirror: MirrorTarget,
}

fn default_starting_balance() -> f64 {
    STARTING_BALANCE
}

fn default_contestant_count() -> usize {
    DEFAULT_CONTESTANT_COUNT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_narrator_timeout_ms() -> u64 {
    5_000
}

/// Decode a fixed-length hex string, with or without a `0x` prefix
pub fn parse_hex<const N: usize>(field: &'static str, value: &str) -> std::result::Result<[u8; N], ConfigError> {
    let invalid = || ConfigError::InvalidHex {
        field,
        len: N,
        value: value.to_string(),
    };
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits)
        .ok()
        .and_then(|bytes| <[u8; N]>::try_from(bytes).ok())
        .ok_or_else(invalid)
}

fn parse_endpoint(field: &'static str, endpoint: Option<&str>) -> std::result::Result<Url, ConfigError> {
    let value = endpoint.ok_or(ConfigError::MissingEndpoint { field })?;
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        source,
    })
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    pub fn validate(self) -> std::result::Result<ValidatedConfig, ConfigError> {
        let seed = match &self.seed {
            Some(hex) => parse_hex::<32>("seed", hex)?,
            None => rand::random(),
        };

        if !(self.starting_balance > 0.0) || !self.starting_balance.is_finite() {
            return Err(ConfigError::InvalidNonZero {
                field: "starting_balance",
                value: self.starting_balance.to_string(),
            });
        }
        if self.contestant_count < 2 {
            return Err(ConfigError::TooFewContestants(self.contestant_count));
        }
        if self.narrator.timeout_ms == 0 {
            return Err(ConfigError::InvalidNonZero {
                field: "narrator.timeout_ms",
                value: self.narrator.timeout_ms.to_string(),
            });
        }

        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        let catalog = match self.rounds {
            Some(rounds) => RoundCatalog::new(rounds)?,
            None => RoundCatalog::standard(),
        };

        let narrator = match self.narrator.kind {
            NarratorKind::Fallback => NarratorTarget::Template,
            NarratorKind::Http => NarratorTarget::Http(parse_endpoint(
                "narrator.endpoint",
                self.narrator.endpoint.as_deref(),
            )?),
        };
        let mirror = match self.mirror.kind {
            MirrorKind::None => MirrorTarget::None,
            MirrorKind::Log => MirrorTarget::Log,
            MirrorKind::Http => MirrorTarget::Http(parse_endpoint(
                "mirror.endpoint",
                self.mirror.endpoint.as_deref(),
            )?),
        };

        Ok(ValidatedConfig {
            seed,
            game: GameConfig {
                starting_balance: self.starting_balance,
                contestant_count: self.contestant_count,
                catalog,
            },
            log_level,
            narrator,
            narrator_timeout: Duration::from_millis(self.narrator.timeout_ms),
            mirror,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_logic::RoundType;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());

        let validated = config.validate().unwrap();
        assert_eq!(validated.game.contestant_count, 10);
        assert_eq!(validated.game.starting_balance, 1000.0);
        assert_eq!(validated.game.catalog, RoundCatalog::standard());
        assert_eq!(validated.log_level, Level::INFO);
        assert_eq!(validated.narrator, NarratorTarget::Template);
        assert_eq!(validated.narrator_timeout, Duration::from_secs(5));
        assert_eq!(validated.mirror, MirrorTarget::None);
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
seed: "0x0101010101010101010101010101010101010101010101010101010101010101"
starting_balance: 500
contestant_count: 6
log_level: debug
narrator:
  kind: http
  endpoint: http://localhost:9000/narrate
  timeout_ms: 250
mirror:
  kind: log
rounds:
  - type: marbles
    primary_stats: [intelligence]
    elimination_count: 2
    has_random_element: true
  - type: final-duel
    primary_stats: [strength, speed]
    elimination_count: 1
"#;
        let validated = serde_yaml::from_str::<Config>(yaml).unwrap().validate().unwrap();
        assert_eq!(validated.seed, [1u8; 32]);
        assert_eq!(validated.game.starting_balance, 500.0);
        assert_eq!(validated.game.catalog.len(), 2);
        assert_eq!(validated.game.catalog.rounds()[0].round_type, RoundType::Marbles);
        assert_eq!(validated.log_level, Level::DEBUG);
        assert_eq!(validated.narrator_timeout, Duration::from_millis(250));
        assert!(matches!(validated.narrator, NarratorTarget::Http(ref url) if url.path() == "/narrate"));
        assert_eq!(validated.mirror, MirrorTarget::Log);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_seed = Config {
            seed: Some("abc".into()),
            ..Default::default()
        };
        assert!(matches!(bad_seed.validate(), Err(ConfigError::InvalidHex { field: "seed", .. })));

        let few = Config {
            contestant_count: 1,
            ..Default::default()
        };
        assert!(matches!(few.validate(), Err(ConfigError::TooFewContestants(1))));

        let broke = Config {
            starting_balance: 0.0,
            ..Default::default()
        };
        assert!(matches!(broke.validate(), Err(ConfigError::InvalidNonZero { .. })));

        let level = Config {
            log_level: "loud".into(),
            ..Default::default()
        };
        assert!(matches!(level.validate(), Err(ConfigError::InvalidLogLevel { .. })));

        let no_endpoint = Config {
            mirror: MirrorConfig {
                kind: MirrorKind::Http,
                endpoint: None,
            },
            ..Default::default()
        };
        assert!(matches!(
            no_endpoint.validate(),
            Err(ConfigError::MissingEndpoint { field: "mirror.endpoint" })
        ));

        let empty_rounds = Config {
            rounds: Some(vec![]),
            ..Default::default()
        };
        assert!(matches!(
            empty_rounds.validate(),
            Err(ConfigError::Catalog(CatalogError::Empty))
        ));
    }

    #[test]
    fn test_hex_seed() {
        let seed = [0xabu8; 32];
        assert_eq!(parse_hex::<32>("seed", &hex::encode(seed)).unwrap(), seed);
        assert_eq!(parse_hex::<32>("seed", &format!("0x{}", "AB".repeat(32))).unwrap(), seed);
        assert!(parse_hex::<2>("x", "zzzz").is_err());
        assert!(parse_hex::<2>("x", "abc").is_err());
        assert!(parse_hex::<2>("x", "abcdef").is_err());
    }

    #[test]
    fn test_rejects_signed_hex_digits() {
        assert!(matches!(
            parse_hex::<32>("seed", &"+f".repeat(32)),
            Err(ConfigError::InvalidHex { field: "seed", len: 32, .. })
        ));
        assert!(parse_hex::<2>("x", "-f-f").is_err());

        let signed = Config {
            seed: Some("+f".repeat(32)),
            ..Default::default()
        };
        assert!(matches!(signed.validate(), Err(ConfigError::InvalidHex { .. })));
    }
}
