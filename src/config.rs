use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::validate::InputDefaults;
use crate::{DEFAULT_AGE_GROUP, DEFAULT_BUDGET, DEFAULT_LOCATION};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://localhost:8080".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/campaign_model.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub seed: Option<u64>,
    pub default_budget: f64,
    pub default_location: String,
    pub default_age_group: String,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            seed: None,
            default_budget: DEFAULT_BUDGET,
            default_location: DEFAULT_LOCATION.to_string(),
            default_age_group: DEFAULT_AGE_GROUP.to_string(),
        }
    }
}

impl ScoringConfig {
    pub fn input_defaults(&self) -> InputDefaults {
        InputDefaults {
            budget: self.default_budget,
            location: self.default_location.clone(),
            age_group: self.default_age_group.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 12,
            min_samples_split: 2,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub scoring: ScoringConfig,
    pub training: TrainingConfig,
}

impl AdvisorConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), String> {
        let config_path = path.or_else(default_config_path);
        let mut config = match config_path.as_ref() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(path)
                    .map_err(|err| format!("failed to read config: {}", err))?;
                toml::from_str(&contents).map_err(|err| format!("failed to parse config: {}", err))?
            }
            _ => AdvisorConfig::default(),
        };

        config.apply_env_overrides();
        Ok((config, config_path))
    }

    pub fn write(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| format!("failed to create config dir: {}", err))?;
        }
        let payload = toml::to_string_pretty(self)
            .map_err(|err| format!("failed to serialize config: {}", err))?;
        std::fs::write(path, payload).map_err(|err| format!("failed to write config: {}", err))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = env::var("ADVISOR_HOST") {
            if !host.trim().is_empty() {
                self.server.host = host;
            }
        }
        if let Ok(port) = env::var("ADVISOR_PORT") {
            if let Ok(value) = port.parse::<u16>() {
                self.server.port = value;
            }
        }
        if let Ok(origins) = env::var("CORS_ORIGINS") {
            let origins: Vec<String> = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
            if !origins.is_empty() {
                self.server.cors_origins = origins;
            }
        }
        if let Ok(path) = env::var("MODEL_PATH") {
            if !path.trim().is_empty() {
                self.model.path = PathBuf::from(path);
            }
        }
        if let Ok(seed) = env::var("SCORING_SEED") {
            if let Ok(value) = seed.parse::<u64>() {
                self.scoring.seed = Some(value);
            }
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    env::var("ADVISOR_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/advisor.toml")))
}
