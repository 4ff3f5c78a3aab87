use faceshape_core::{ClassificationPolicy, ConfigError, ShapeConfig};
use std::path::PathBuf;

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// Classifier and history settings (TOML file plus env overrides).
    pub shape: ShapeConfig,
    /// TOML file the shape settings were read from, if any.
    pub config_path: Option<PathBuf>,
    /// Capacity of the request channel into the engine thread.
    pub queue_depth: usize,
    /// Register on the system bus instead of the session bus.
    pub system_bus: bool,
}

impl Config {
    /// Load configuration from `FACESHAPE_*` environment variables with defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps variable names to values.
    ///
    /// `FACESHAPE_CONFIG` must exist when set explicitly; the default
    /// `$XDG_CONFIG_HOME/faceshape/faceshape.toml` is only read if present.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config_path = match lookup("FACESHAPE_CONFIG") {
            Some(path) => Some(PathBuf::from(path)),
            None => {
                let config_dir = lookup("XDG_CONFIG_HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| {
                        let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                        PathBuf::from(home).join(".config")
                    });
                let default_path = config_dir.join("faceshape").join("faceshape.toml");
                default_path.exists().then_some(default_path)
            }
        };

        let mut shape = match &config_path {
            Some(path) => ShapeConfig::load(path)?,
            None => ShapeConfig::default(),
        };

        if let Some(raw) = lookup("FACESHAPE_POLICY") {
            match raw.parse::<ClassificationPolicy>() {
                Ok(policy) => shape.policy = policy,
                Err(e) => tracing::warn!(error = %e, "ignoring FACESHAPE_POLICY"),
            }
        }
        shape.history_size = parse_or(&lookup, "FACESHAPE_HISTORY_SIZE", shape.history_size);

        Ok(Self {
            shape,
            config_path,
            queue_depth: parse_or(&lookup, "FACESHAPE_QUEUE_DEPTH", 4),
            system_bus: lookup("FACESHAPE_SYSTEM_BUS")
                .map(|v| v != "0")
                .unwrap_or(false),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[("HOME", "/nonexistent-home")])).unwrap();
        assert!(config.config_path.is_none());
        assert_eq!(config.shape, ShapeConfig::default());
        assert_eq!(config.queue_depth, 4);
        assert!(!config.system_bus);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("HOME", "/nonexistent-home"),
            ("FACESHAPE_POLICY", "legacy"),
            ("FACESHAPE_HISTORY_SIZE", "12"),
            ("FACESHAPE_QUEUE_DEPTH", "1"),
            ("FACESHAPE_SYSTEM_BUS", "1"),
        ]))
        .unwrap();
        assert_eq!(config.shape.policy, ClassificationPolicy::LegacyRatio);
        assert_eq!(config.shape.history_size, 12);
        assert_eq!(config.queue_depth, 1);
        assert!(config.system_bus);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("HOME", "/nonexistent-home"),
            ("FACESHAPE_POLICY", "neural"),
            ("FACESHAPE_HISTORY_SIZE", "many"),
        ]))
        .unwrap();
        assert_eq!(config.shape.policy, ClassificationPolicy::RefinedWidth);
        assert_eq!(config.shape.history_size, 30);
    }

    #[test]
    fn test_explicit_config_file_must_exist() {
        let result = Config::from_lookup(lookup_from(&[(
            "FACESHAPE_CONFIG",
            "/nonexistent/faceshape.toml",
        )]));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_config_file_then_env() {
        let path = std::env::temp_dir().join(format!("faceshaped-test-{}.toml", std::process::id()));
        std::fs::write(&path, "policy = \"legacy_ratio\"\nhistory_size = 8\n").unwrap();

        let config = Config::from_lookup(lookup_from(&[
            ("FACESHAPE_CONFIG", path.to_str().unwrap()),
            ("FACESHAPE_HISTORY_SIZE", "16"),
        ]))
        .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(config.shape.policy, ClassificationPolicy::LegacyRatio);
        assert_eq!(config.shape.history_size, 16);
    }
}
