//! Session configuration from environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use wayfinder_core::rules::NavigationRules;

#[derive(Debug, Clone)]
pub struct Config {
    pub path_service_url: String,
    pub history_path: PathBuf,
    pub deviation_threshold_m: f64,
    pub request_timeout: Duration,
    pub sim_interval: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            path_service_url: lookup("WAYFINDER_PATH_SERVICE_URL")
                .unwrap_or_else(|| "http://127.0.0.1:5000/shortest-path".to_string()),
            history_path: lookup("WAYFINDER_HISTORY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("wayfinder-history.json")),
            deviation_threshold_m: lookup("WAYFINDER_DEVIATION_M")
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|m| m.is_finite() && *m > 0.0)
                .unwrap_or(50.0),
            request_timeout: lookup("WAYFINDER_REQUEST_TIMEOUT_S")
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(10)),
            sim_interval: lookup("WAYFINDER_SIM_INTERVAL_MS")
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(Duration::from_millis(1000)),
        }
    }

    pub fn rules(&self) -> NavigationRules {
        NavigationRules {
            deviation_threshold_m: self.deviation_threshold_m,
            ..NavigationRules::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.path_service_url, "http://127.0.0.1:5000/shortest-path");
        assert_eq!(config.history_path, PathBuf::from("wayfinder-history.json"));
        assert_eq!(config.deviation_threshold_m, 50.0);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.sim_interval, Duration::from_millis(1000));
    }

    #[test]
    fn overrides_and_bad_values() {
        let vars: HashMap<&str, &str> = [
            ("WAYFINDER_PATH_SERVICE_URL", "http://routes.local/path"),
            ("WAYFINDER_DEVIATION_M", "75.5"),
            ("WAYFINDER_REQUEST_TIMEOUT_S", "zero"),
            ("WAYFINDER_SIM_INTERVAL_MS", "0"),
        ]
        .into_iter()
        .collect();
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.path_service_url, "http://routes.local/path");
        assert_eq!(config.rules().deviation_threshold_m, 75.5);
        assert_eq!(config.rules().history_limit, 100);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.sim_interval, Duration::from_millis(1000));
    }
}
