//! Service configuration.

use serde::{Deserialize, Serialize};

use tharsis_protocol::GameOptions;

use crate::error::ApiError;

/// Knobs for the game service. Every field has a default so a partial
/// config document deserializes cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Smallest table the service will open.
    #[serde(default = "default_min_players")]
    pub min_players: usize,

    /// Largest table the service will open.
    #[serde(default = "default_max_players")]
    pub max_players: usize,

    /// Expansion switches applied when a creation request leaves them
    /// unspecified.
    #[serde(default)]
    pub default_options: GameOptions,
}

fn default_min_players() -> usize {
    2
}

fn default_max_players() -> usize {
    5
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            min_players: default_min_players(),
            max_players: default_max_players(),
            default_options: GameOptions::default(),
        }
    }
}

impl ServiceConfig {
    /// Rejects table sizes outside the configured range.
    pub fn check_player_count(&self, count: usize) -> Result<(), ApiError> {
        if count < self.min_players || count > self.max_players {
            return Err(ApiError::Forbidden(format!(
                "player count {count} outside {}..={}",
                self.min_players, self.max_players
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_range_is_two_to_five() {
        let config = ServiceConfig::default();
        assert!(config.check_player_count(1).is_err());
        assert!(config.check_player_count(2).is_ok());
        assert!(config.check_player_count(5).is_ok());
        assert!(config.check_player_count(6).is_err());
    }

    #[test]
    fn partial_document_fills_defaults() {
        let config: ServiceConfig = serde_json::from_str(r#"{"max_players": 3}"#)
            .expect("partial config should deserialize");
        assert_eq!(config.min_players, 2);
        assert_eq!(config.max_players, 3);
        assert!(!config.default_options.turmoil);
    }
}
