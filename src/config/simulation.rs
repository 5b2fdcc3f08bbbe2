use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: f32,
    #[serde(default = "default_websocket_port")]
    pub websocket_port: u16,
    #[serde(default = "default_websocket_bind")]
    pub websocket_bind: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Scene seed. 0 picks a random seed at startup.
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_biome")]
    pub biome: String,
    #[serde(default = "default_info_toast_seconds")]
    pub info_toast_seconds: f32,
    #[serde(default = "default_impact_flash_seconds")]
    pub impact_flash_seconds: f32,
}

fn default_tick_rate() -> f32 {
    60.0
}
fn default_websocket_port() -> u16 {
    8120
}
fn default_websocket_bind() -> String {
    "127.0.0.1".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_biome() -> String {
    "ocean".to_string()
}
fn default_info_toast_seconds() -> f32 {
    6.0
}
fn default_impact_flash_seconds() -> f32 {
    0.9
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            tick_rate_hz: default_tick_rate(),
            websocket_port: default_websocket_port(),
            websocket_bind: default_websocket_bind(),
            log_level: default_log_level(),
            seed: 0,
            biome: default_biome(),
            info_toast_seconds: default_info_toast_seconds(),
            impact_flash_seconds: default_impact_flash_seconds(),
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    /// Load the config file if it exists, otherwise fall back to defaults.
    pub fn from_file_or_default(path: &Path) -> Result<Self, String> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: SimulationConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if self.tick_rate_hz <= 0.0 || self.tick_rate_hz > 240.0 {
            errors.push(format!(
                "tick_rate_hz must be in (0.0, 240.0], got {}. Example: tick_rate_hz = 60.0",
                self.tick_rate_hz
            ));
        }

        if !(1024..=65535).contains(&self.websocket_port) {
            errors.push(format!(
                "websocket_port must be 1024-65535, got {}. Example: websocket_port = 8120",
                self.websocket_port
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        if self.info_toast_seconds <= 0.0 {
            errors.push(format!(
                "info_toast_seconds must be > 0.0, got {}. Example: info_toast_seconds = 6.0",
                self.info_toast_seconds
            ));
        }

        if self.impact_flash_seconds <= 0.0 {
            errors.push(format!(
                "impact_flash_seconds must be > 0.0, got {}. Example: impact_flash_seconds = 0.9",
                self.impact_flash_seconds
            ));
        }

        if self.biome.trim().is_empty() {
            errors.push("biome must not be empty. Example: biome = \"ocean\"".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}
