//! Game tuning. Deserialized from an optional JSON blob handed over by the page;
//! every field falls back to its default.

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_RECITATION_SPEED_MS: u32 = 400; // ms per revealed character
pub const DEFAULT_ADVANCE_DELAY_MS: u32 = 1500;
pub const DEFAULT_HAND_SIZE: usize = 10;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub recitation_speed_ms: u32,
    /// Pause after a correct answer before the next round is dealt.
    pub advance_delay_ms: u32,
    pub hand_size: usize,
    pub min_speed_ms: u32,
    pub max_speed_ms: u32,
    /// `log` level name for the browser console ("error" .. "trace").
    pub log_level: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            recitation_speed_ms: DEFAULT_RECITATION_SPEED_MS,
            advance_delay_ms: DEFAULT_ADVANCE_DELAY_MS,
            hand_size: DEFAULT_HAND_SIZE,
            min_speed_ms: 50,
            max_speed_ms: 2000,
            log_level: "info".to_string(),
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: GameConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hand_size == 0 || self.hand_size > 10 {
            // Keyboard shortcuts only reach ten slots.
            return Err(invalid("hand_size", format!("{} is outside 1..=10", self.hand_size)));
        }
        if self.min_speed_ms == 0 || self.min_speed_ms > self.max_speed_ms {
            return Err(invalid(
                "min_speed_ms",
                format!("bounds {}..={} are empty", self.min_speed_ms, self.max_speed_ms),
            ));
        }
        if !self.speed_in_range(self.recitation_speed_ms) {
            return Err(invalid(
                "recitation_speed_ms",
                format!(
                    "{} is outside {}..={}",
                    self.recitation_speed_ms, self.min_speed_ms, self.max_speed_ms
                ),
            ));
        }
        self.level_filter()?;
        Ok(())
    }

    pub fn speed_in_range(&self, ms: u32) -> bool {
        (self.min_speed_ms..=self.max_speed_ms).contains(&ms)
    }

    pub fn level_filter(&self) -> Result<log::Level, ConfigError> {
        self.log_level
            .parse::<log::Level>()
            .map_err(|_| invalid("log_level", format!("unknown level {:?}", self.log_level)))
    }
}

fn invalid(name: &'static str, reason: String) -> ConfigError {
    ConfigError::InvalidSetting { name, reason }
}
