//! Discovery node client
//!
//! Read-only calls against the public music-metadata API. Requests go to the
//! current node; a transport error or a 5xx moves the shared cursor to the
//! next node and retries there, at most once per node. Any other response is
//! final.

use abase_common::config::DiscoveryConfig;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("AudioBASE/", env!("CARGO_PKG_VERSION"));

/// Discovery client errors
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("No discovery nodes configured")]
    NoNodes,

    #[error("Invalid node URL {0}")]
    InvalidNode(String),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("All {attempts} discovery nodes failed; last error: {last}")]
    AllNodesFailed { attempts: usize, last: String },
}

/// Response envelope used by every discovery endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Artwork {
    #[serde(rename = "150x150")]
    pub small: Option<String>,
    #[serde(rename = "480x480")]
    pub medium: Option<String>,
    #[serde(rename = "1000x1000")]
    pub large: Option<String>,
}

/// Track metadata
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    /// Seconds
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub play_count: Option<u64>,
    #[serde(default)]
    pub favorite_count: Option<u64>,
    #[serde(default)]
    pub repost_count: Option<u64>,
    #[serde(default)]
    pub artwork: Option<Artwork>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    pub handle: String,
    pub name: String,
    #[serde(default)]
    pub follower_count: Option<u64>,
    #[serde(default)]
    pub followee_count: Option<u64>,
    #[serde(default)]
    pub track_count: Option<u64>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Trending window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum TimeRange {
    #[serde(rename = "week")]
    Week,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "year")]
    Year,
    #[serde(rename = "allTime")]
    AllTime,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Week => "week",
            TimeRange::Month => "month",
            TimeRange::Year => "year",
            TimeRange::AllTime => "allTime",
        }
    }
}

/// Outcome of one attempt against one node
enum Attempt {
    /// Try the next node
    Failover(DiscoveryError),
    /// Report to the caller as-is
    Final(DiscoveryError),
}

/// Round-robin discovery client
pub struct DiscoveryClient {
    http: reqwest::Client,
    nodes: Vec<String>,
    app_name: String,
    cursor: AtomicUsize,
}

impl DiscoveryClient {
    pub fn new(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        if config.nodes.is_empty() {
            return Err(DiscoveryError::NoNodes);
        }

        let nodes = config
            .nodes
            .iter()
            .map(|node| {
                let node = node.trim_end_matches('/').to_string();
                Url::parse(&node)
                    .map(|_| node.clone())
                    .map_err(|_| DiscoveryError::InvalidNode(node))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DiscoveryError::NetworkError(e.to_string()))?;

        Ok(Self {
            http,
            nodes,
            app_name: config.app_name.clone(),
            cursor: AtomicUsize::new(0),
        })
    }

    /// Node the next request starts at
    pub fn current_node(&self) -> &str {
        &self.nodes[self.cursor.load(Ordering::SeqCst) % self.nodes.len()]
    }

    pub async fn trending_tracks(
        &self,
        genre: Option<&str>,
        time: Option<TimeRange>,
    ) -> Result<Vec<Track>, DiscoveryError> {
        let mut query = Vec::new();
        if let Some(genre) = genre {
            query.push(("genre", genre.to_string()));
        }
        if let Some(time) = time {
            query.push(("time", time.as_str().to_string()));
        }
        self.get("/v1/tracks/trending", &query).await
    }

    pub async fn search_tracks(&self, text: &str) -> Result<Vec<Track>, DiscoveryError> {
        self.get("/v1/tracks/search", &[("query", text.to_string())])
            .await
    }

    pub async fn get_track(&self, id: &str) -> Result<Track, DiscoveryError> {
        check_id(id)?;
        self.get(&format!("/v1/tracks/{}", id), &[]).await
    }

    pub async fn get_user(&self, id: &str) -> Result<User, DiscoveryError> {
        check_id(id)?;
        self.get(&format!("/v1/users/{}", id), &[]).await
    }

    pub async fn user_tracks(&self, id: &str) -> Result<Vec<Track>, DiscoveryError> {
        check_id(id)?;
        self.get(&format!("/v1/users/{}/tracks", id), &[]).await
    }

    /// Direct stream URL on the current node; no request is made
    pub fn stream_url(&self, id: &str) -> Result<String, DiscoveryError> {
        check_id(id)?;
        let base = format!("{}/v1/tracks/{}/stream", self.current_node(), id);
        Url::parse_with_params(&base, &[("app_name", self.app_name.as_str())])
            .map(String::from)
            .map_err(|_| DiscoveryError::InvalidNode(self.current_node().to_string()))
    }

    /// GET `path` and unwrap the `data` envelope, failing over between nodes
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, DiscoveryError> {
        let count = self.nodes.len();
        let start = self.cursor.load(Ordering::SeqCst) % count;
        let mut last_error = None;

        for attempt in 0..count {
            let index = (start + attempt) % count;
            let node = &self.nodes[index];

            match self.try_node(node, path, query).await {
                Ok(envelope) => return Ok(envelope.data),
                Err(Attempt::Final(e)) => return Err(e),
                Err(Attempt::Failover(e)) => {
                    warn!(node = %node, path = %path, "Discovery node failed: {}", e);
                    // Only move the cursor if nobody else already has
                    let _ = self.cursor.compare_exchange(
                        index,
                        (index + 1) % count,
                        Ordering::SeqCst,
                        Ordering::SeqCst,
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(DiscoveryError::AllNodesFailed {
            attempts: count,
            last: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }

    async fn try_node<T: DeserializeOwned>(
        &self,
        node: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Envelope<T>, Attempt> {
        let url = format!("{}{}", node, path);
        debug!(url = %url, "Discovery request");

        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("app_name", self.app_name.as_str())])
            .send()
            .await
            .map_err(|e| Attempt::Failover(DiscoveryError::NetworkError(e.to_string())))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Attempt::Final(DiscoveryError::NotFound(path.to_string())));
        }
        if status.is_server_error() {
            return Err(Attempt::Failover(DiscoveryError::ApiError(
                status.as_u16(),
                path.to_string(),
            )));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Attempt::Final(DiscoveryError::ApiError(status.as_u16(), text)));
        }

        response
            .json::<Envelope<T>>()
            .await
            .map_err(|e| Attempt::Final(DiscoveryError::ParseError(e.to_string())))
    }
}

/// Discovery ids are short alphanumeric hashes
fn check_id(id: &str) -> Result<(), DiscoveryError> {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(DiscoveryError::InvalidId(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(nodes: &[&str]) -> DiscoveryConfig {
        DiscoveryConfig {
            nodes: nodes.iter().map(|n| n.to_string()).collect(),
            ..DiscoveryConfig::default()
        }
    }

    #[test]
    fn test_rejects_empty_node_list() {
        assert!(matches!(
            DiscoveryClient::new(&config(&[])),
            Err(DiscoveryError::NoNodes)
        ));
    }

    #[test]
    fn test_rejects_invalid_node_url() {
        assert!(matches!(
            DiscoveryClient::new(&config(&["not a url"])),
            Err(DiscoveryError::InvalidNode(_))
        ));
    }

    #[test]
    fn test_stream_url_uses_current_node_and_app_name() {
        let client = DiscoveryClient::new(&config(&["https://node-a.example/"])).unwrap();
        assert_eq!(
            client.stream_url("D7KyD").unwrap(),
            "https://node-a.example/v1/tracks/D7KyD/stream?app_name=AudioBASE"
        );
    }

    #[test]
    fn test_ids_must_be_alphanumeric() {
        let client = DiscoveryClient::new(&config(&["https://node-a.example"])).unwrap();
        assert!(matches!(
            client.stream_url("../admin"),
            Err(DiscoveryError::InvalidId(_))
        ));
        assert!(check_id("").is_err());
        assert!(check_id("nlGNe").is_ok());
    }

    #[test]
    fn test_track_parses_discovery_payload() {
        let payload = r#"{"data": {
            "id": "D7KyD",
            "title": "Night Drive",
            "duration": 212,
            "genre": "Electronic",
            "artwork": {"150x150": "https://img/150", "480x480": null, "1000x1000": null},
            "user": {"id": "nlGNe", "handle": "artist", "name": "Artist", "is_verified": true}
        }}"#;

        let envelope: Envelope<Track> = serde_json::from_str(payload).unwrap();
        assert_eq!(envelope.data.title, "Night Drive");
        assert_eq!(envelope.data.duration, Some(212));
        assert!(envelope.data.user.unwrap().is_verified);
    }
}
