use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "dailylog.db";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub static_dir: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup, falling back to the defaults for
    /// unset or blank values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_address: get("BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            static_dir: get("STATIC_DIR"),
        }
    }

    pub fn static_dir(&self) -> Option<PathBuf> {
        self.static_dir.as_ref().map(PathBuf::from)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_unset() {
        let config = Config::default();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert!(config.static_dir().is_none());
    }

    #[test]
    fn reads_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DATABASE_URL", "sqlite:///var/lib/dailylog/logs.db"),
            ("BIND_ADDRESS", "0.0.0.0:8080"),
            ("STATIC_DIR", "dist"),
        ]
        .into_iter()
        .collect();
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.database_url, "sqlite:///var/lib/dailylog/logs.db");
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.static_dir(), Some(PathBuf::from("dist")));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = Config::from_lookup(|_| Some("   ".to_string()));
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
    }
}
