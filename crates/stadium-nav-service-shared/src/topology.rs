//! Fetching topology snapshots from the map store or a local file.

use std::path::PathBuf;
use std::time::Duration;

use stadium_nav_lib::topology::GateRecord;
use stadium_nav_lib::{load_topology, Error as LibError, TopologySnapshot};

/// Where the service reads its topology from.
#[derive(Debug, Clone, PartialEq)]
pub enum TopologySource {
    /// The map store's `GET /api/map` (plus `GET /api/gates` for exits).
    Http { base_url: String, timeout: Duration },
    /// A JSON snapshot on local disk.
    File(PathBuf),
}

impl std::fmt::Display for TopologySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologySource::Http { base_url, .. } => write!(f, "{}/api/map", base_url),
            TopologySource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl TopologySource {
    /// Fetch a full snapshot.
    ///
    /// For the HTTP source, gate records are merged in from `/api/gates`
    /// when the map payload carries none; a failure there is logged and
    /// leaves the snapshot without gates.
    pub async fn fetch(&self) -> Result<TopologySnapshot, LibError> {
        match self {
            TopologySource::File(path) => {
                let path = path.clone();
                tokio::task::spawn_blocking(move || load_topology(&path))
                    .await
                    .map_err(|err| self.unavailable(err))?
            }
            TopologySource::Http { base_url, timeout } => {
                let client = reqwest::Client::builder()
                    .timeout(*timeout)
                    .build()
                    .map_err(|err| self.unavailable(err))?;

                let mut snapshot: TopologySnapshot = client
                    .get(format!("{}/api/map", base_url))
                    .send()
                    .await
                    .and_then(|response| response.error_for_status())
                    .map_err(|err| self.unavailable(err))?
                    .json()
                    .await
                    .map_err(|err| self.unavailable(err))?;

                if snapshot.gates.is_empty() {
                    match fetch_gates(&client, base_url).await {
                        Ok(gates) => snapshot.gates = gates,
                        Err(err) => {
                            tracing::warn!(error = %err, "gate list unavailable, exits fall back to gate nodes")
                        }
                    }
                }
                Ok(snapshot)
            }
        }
    }

    fn unavailable(&self, err: impl std::fmt::Display) -> LibError {
        LibError::UpstreamUnavailable {
            source_name: self.to_string(),
            message: err.to_string(),
        }
    }
}

async fn fetch_gates(client: &reqwest::Client, base_url: &str) -> reqwest::Result<Vec<GateRecord>> {
    client
        .get(format!("{}/api/gates", base_url))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn file_source_loads_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("venue.json");
        fs::write(
            &path,
            r#"{"nodes":[{"id":"A","x":0,"y":0,"type":"gate"}],"edges":[]}"#,
        )
        .unwrap();

        let snapshot = TopologySource::File(path).fetch().await.unwrap();
        assert_eq!(snapshot.nodes.len(), 1);
    }

    #[tokio::test]
    async fn missing_file_reports_not_found() {
        let source = TopologySource::File(PathBuf::from("/nonexistent/venue.json"));
        assert!(matches!(
            source.fetch().await,
            Err(LibError::TopologyNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_map_store_is_upstream_unavailable() {
        let source = TopologySource::Http {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(500),
        };
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, LibError::UpstreamUnavailable { .. }));
        assert!(err.to_string().contains("127.0.0.1:9/api/map"));
    }
}
