use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use std::collections::HashSet;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_rounds: {0}. Must be at least 1")]
    InvalidMaxRounds(u32),

    #[error("Invalid per_engine_limit: {0}. Must be at least 1")]
    InvalidPerEngineLimit(usize),

    #[error("Invalid timeout for {0}: must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("At least one retrieval engine must be enabled")]
    NoEnginesEnabled,

    #[error("Retrieval engine listed twice: {0}")]
    DuplicateEngine(String),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .deepresearch/config.yaml (project config)
    /// 3. .deepresearch/local.yaml (project local overrides, optional)
    /// 4. Environment variables (DEEPRESEARCH_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment(".deepresearch/config.yaml")
            .merge(Yaml::file(".deepresearch/local.yaml"))
            .merge(Env::prefixed("DEEPRESEARCH_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Self::figment(path.as_ref())
            .merge(Env::prefixed("DEEPRESEARCH_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(path: impl AsRef<std::path::Path>) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let research = &config.research;
        if research.max_rounds == 0 {
            return Err(ConfigError::InvalidMaxRounds(research.max_rounds));
        }
        if research.per_engine_limit == 0 {
            return Err(ConfigError::InvalidPerEngineLimit(research.per_engine_limit));
        }
        if research.engine_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("research.engine_timeout_ms"));
        }
        if research.session_deadline_secs == 0 {
            return Err(ConfigError::ZeroTimeout("research.session_deadline_secs"));
        }
        if config.llm.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("llm.timeout_secs"));
        }
        if config.embedding.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("embedding.timeout_secs"));
        }

        // Validate engines
        if config.engines.enabled.is_empty() {
            return Err(ConfigError::NoEnginesEnabled);
        }
        let mut seen = HashSet::new();
        for engine in &config.engines.enabled {
            if !seen.insert(*engine) {
                return Err(ConfigError::DuplicateEngine(engine.to_string()));
            }
        }

        // Validate database config
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        // Validate logging config
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{EngineKind, LogFormat};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.research.min_evidence, 2);
        assert_eq!(config.research.max_rounds, 3);
        assert_eq!(config.research.per_engine_limit, 5);
        assert_eq!(config.engines.enabled, EngineKind::ALL.to_vec());
        assert_eq!(config.database.path, ".deepresearch/sessions.db");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
research:
  min_evidence: 4
  max_rounds: 5
engines:
  enabled: [keyword, vector]
  vector:
    collection: laws
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.research.min_evidence, 4);
        assert_eq!(config.research.max_rounds, 5);
        assert_eq!(config.research.per_engine_limit, 5);
        assert_eq!(config.engines.enabled, vec![EngineKind::Keyword, EngineKind::Vector]);
        assert_eq!(config.engines.vector.collection, "laws");
        assert_eq!(config.engines.vector.url, "http://localhost:6333");
        assert_eq!(config.logging.format, LogFormat::Json);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_zero_max_rounds() {
        let mut config = Config::default();
        config.research.max_rounds = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxRounds(0))
        ));
    }

    #[test]
    fn test_validate_zero_limit_and_timeouts() {
        let mut config = Config::default();
        config.research.per_engine_limit = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidPerEngineLimit(0))
        ));

        let mut config = Config::default();
        config.research.engine_timeout_ms = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::ZeroTimeout("research.engine_timeout_ms"))
        ));
    }

    #[test]
    fn test_validate_engine_list() {
        let mut config = Config::default();
        config.engines.enabled.clear();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::NoEnginesEnabled)
        ));

        config.engines.enabled = vec![EngineKind::Graph, EngineKind::Graph];
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::DuplicateEngine(name)) if name == "graph"
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_validate_empty_database_path() {
        let mut config = Config::default();
        config.database.path = String::new();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyDatabasePath)
        ));
    }

    #[test]
    fn test_env_override() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "research:\n  max_rounds: 4\n  min_evidence: 3").unwrap();
        file.flush().unwrap();

        temp_env::with_vars(
            [
                ("DEEPRESEARCH_RESEARCH__MAX_ROUNDS", Some("7")),
                ("DEEPRESEARCH_LLM__MODEL", Some("local-model")),
            ],
            || {
                let config = ConfigLoader::load_from_file(file.path()).unwrap();
                assert_eq!(config.research.max_rounds, 7, "env should win over file");
                assert_eq!(config.research.min_evidence, 3, "file should win over defaults");
                assert_eq!(config.llm.model, "local-model");
            },
        );
    }

    #[test]
    fn test_hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "research:\n  max_rounds: 2\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "research:\n  max_rounds: 6\nlogging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.research.max_rounds, 6, "Override should win");
        assert_eq!(
            config.logging.level, "debug",
            "Override should win for nested fields"
        );
        assert_eq!(
            config.logging.format,
            LogFormat::Json,
            "Base value should persist when not overridden"
        );
    }

    #[test]
    fn test_invalid_file_value_is_rejected() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "research:\n  max_rounds: 0").unwrap();
        file.flush().unwrap();

        temp_env::with_vars_unset(["DEEPRESEARCH_RESEARCH__MAX_ROUNDS"], || {
            assert!(ConfigLoader::load_from_file(file.path()).is_err());
        });
    }
}
