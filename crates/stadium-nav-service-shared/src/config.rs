//! Environment-driven service configuration.
//!
//! | Variable | Default |
//! |---|---|
//! | `MAP_SERVICE_URL` | `http://localhost:8000` |
//! | `STADIUM_TOPOLOGY_PATH` | unset (a local file replaces the HTTP source) |
//! | `TOPOLOGY_TIMEOUT_SECS` | `10` |
//! | `SERVICE_PORT` | `8002` |
//! | `STADIUM_SEED_STAFF_PER_ROLE` | `0` |

use std::path::PathBuf;
use std::time::Duration;

use crate::topology::TopologySource;

pub const DEFAULT_MAP_SERVICE_URL: &str = "http://localhost:8000";
pub const DEFAULT_PORT: u16 = 8002;
const DEFAULT_TOPOLOGY_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub map_service_url: String,
    pub topology_path: Option<PathBuf>,
    pub topology_timeout: Duration,
    pub port: u16,
    /// Staff seeded per role at startup; zero leaves the roster empty.
    pub seed_staff_per_role: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            map_service_url: DEFAULT_MAP_SERVICE_URL.to_string(),
            topology_path: None,
            topology_timeout: Duration::from_secs(DEFAULT_TOPOLOGY_TIMEOUT_SECS),
            port: DEFAULT_PORT,
            seed_staff_per_role: 0,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            map_service_url: non_empty("MAP_SERVICE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.map_service_url),
            topology_path: non_empty("STADIUM_TOPOLOGY_PATH").map(PathBuf::from),
            topology_timeout: non_empty("TOPOLOGY_TIMEOUT_SECS")
                .and_then(|secs| secs.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.topology_timeout),
            port: non_empty("SERVICE_PORT")
                .and_then(|port| port.trim().parse().ok())
                .unwrap_or(defaults.port),
            seed_staff_per_role: non_empty("STADIUM_SEED_STAFF_PER_ROLE")
                .and_then(|count| count.trim().parse().ok())
                .unwrap_or(defaults.seed_staff_per_role),
        }
    }

    /// Where topology snapshots come from. A configured file wins over HTTP.
    pub fn topology_source(&self) -> TopologySource {
        match &self.topology_path {
            Some(path) => TopologySource::File(path.clone()),
            None => TopologySource::Http {
                base_url: self.map_service_url.clone(),
                timeout: self.topology_timeout,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ServiceConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ServiceConfig::default());
        assert!(matches!(
            config.topology_source(),
            TopologySource::Http { ref base_url, .. } if base_url == DEFAULT_MAP_SERVICE_URL
        ));
    }

    #[test]
    fn reads_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("MAP_SERVICE_URL", "http://map:8000/"),
            ("TOPOLOGY_TIMEOUT_SECS", "3"),
            ("SERVICE_PORT", "9100"),
            ("STADIUM_SEED_STAFF_PER_ROLE", "2"),
        ]));
        assert_eq!(config.map_service_url, "http://map:8000");
        assert_eq!(config.topology_timeout, Duration::from_secs(3));
        assert_eq!(config.port, 9100);
        assert_eq!(config.seed_staff_per_role, 2);
    }

    #[test]
    fn file_source_wins_and_bad_numbers_fall_back() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("STADIUM_TOPOLOGY_PATH", "/data/venue.json"),
            ("SERVICE_PORT", "eighty"),
        ]));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(
            config.topology_source(),
            TopologySource::File(PathBuf::from("/data/venue.json"))
        );
    }
}
