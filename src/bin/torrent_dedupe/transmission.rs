//! Transmission RPC client module.
//!
//! Provides functions to list torrents, read their file lists
//! and stop torrents through the Transmission JSON-RPC interface.
//!
//! Documentation:
//! <https://github.com/transmission/transmission/blob/main/docs/rpc-spec.md>

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use torrent_dedupe::dedupe::{FileEntry, Item};

use crate::manifest::ManifestFetcher;

/// Header used by Transmission for CSRF protection.
const SESSION_ID_HEADER: &str = "X-Transmission-Session-Id";

/// Timeout for fetching the full torrent list.
pub const LIST_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for fetching the file list of one torrent.
pub const MANIFEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for stopping a batch of torrents.
pub const PAUSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for stopping a single torrent.
pub const SINGLE_PAUSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Transmission RPC client.
#[derive(Debug)]
pub struct TransmissionClient {
    client: Client,
    url: String,
    username: String,
    password: String,
    session_id: Option<String>,
}

/// Torrent info from the `torrent-get` method.
///
/// Every field is optional since only the requested fields are returned.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTorrent {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size_when_done: Option<i64>,
    #[serde(default)]
    pub files: Option<Vec<RemoteFile>>,
}

/// A file inside a torrent from the `torrent-get` method.
#[derive(Debug, Deserialize)]
pub struct RemoteFile {
    pub name: String,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    method: &'a str,
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: String,
    #[serde(default = "Option::default")]
    arguments: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TorrentGetArguments {
    #[serde(default)]
    torrents: Vec<RemoteTorrent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SessionArguments {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    rpc_version: Option<i64>,
}

impl RemoteTorrent {
    /// Convert to a classifier item.
    ///
    /// Returns `None` if the id, name or size is missing.
    #[must_use]
    pub fn into_item(self) -> Option<Item> {
        let id = self.id?;
        let name = self.name.filter(|name| !name.is_empty())?;
        let size_bytes = u64::try_from(self.size_when_done?).ok()?;
        Some(Item { id, name, size_bytes })
    }
}

impl TransmissionClient {
    /// Create a new Transmission client.
    ///
    /// Credentials are only sent when the username is not empty.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(host: &str, port: u16, https: bool, username: &str, password: &str) -> Result<Self> {
        let client = Client::builder().build().context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: build_url(host, port, https),
            username: username.to_string(),
            password: password.to_string(),
            session_id: None,
        })
    }

    /// Get the Transmission version and RPC version.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_version(&mut self) -> Result<(String, i64)> {
        let arguments: SessionArguments = self
            .call(
                "session-get",
                json!({ "fields": ["version", "rpc-version"] }),
                MANIFEST_TIMEOUT,
            )
            .await?;

        Ok((
            arguments.version.unwrap_or_else(|| "unknown".to_string()),
            arguments.rpc_version.unwrap_or_default(),
        ))
    }

    /// Get all torrents with id, name and size.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_torrents(&mut self) -> Result<Vec<RemoteTorrent>> {
        let arguments: TorrentGetArguments = self
            .call(
                "torrent-get",
                json!({ "fields": ["id", "name", "sizeWhenDone"] }),
                LIST_TIMEOUT,
            )
            .await?;

        Ok(arguments.torrents)
    }

    /// Get the file list of a single torrent.
    ///
    /// # Errors
    /// Returns an error if the request fails or the torrent has no file list.
    pub async fn get_file_manifest(&mut self, id: i64) -> Result<Vec<FileEntry>> {
        let arguments: TorrentGetArguments = self
            .call(
                "torrent-get",
                json!({ "fields": ["id", "files"], "ids": [id] }),
                MANIFEST_TIMEOUT,
            )
            .await?;

        manifest_from_torrents(id, arguments.torrents)
    }

    /// Stop (pause) the given torrents.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn stop_torrents(&mut self, ids: &[i64], timeout: Duration) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let _: IgnoredAny = self.call("torrent-stop", json!({ "ids": ids }), timeout).await?;
        Ok(())
    }

    /// Send an RPC request and return its arguments.
    ///
    /// Repeats the request once if the daemon asks for a new session id.
    async fn call<T: DeserializeOwned>(&mut self, method: &str, arguments: Value, timeout: Duration) -> Result<T> {
        let body = serde_json::to_string(&RpcRequest { method, arguments }).context("Failed to serialize request")?;

        for _ in 0..2 {
            let mut request = self
                .client
                .post(&self.url)
                .timeout(timeout)
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone());

            if let Some(ref session_id) = self.session_id {
                request = request.header(SESSION_ID_HEADER, session_id);
            }
            if !self.username.is_empty() {
                request = request.basic_auth(&self.username, Some(&self.password));
            }

            let response = request
                .send()
                .await
                .with_context(|| format!("Failed to send {method} request"))?;

            let status = response.status();
            match status {
                StatusCode::CONFLICT => {
                    let session_id = response
                        .headers()
                        .get(SESSION_ID_HEADER)
                        .and_then(|value| value.to_str().ok())
                        .context("Missing session id in 409 response")?;
                    self.session_id = Some(session_id.to_string());
                }
                StatusCode::UNAUTHORIZED => {
                    bail!("Authentication failed: Invalid username or password")
                }
                StatusCode::OK => {
                    let text = response
                        .text()
                        .await
                        .with_context(|| format!("Failed to read {method} response"))?;
                    return parse_response(method, &text);
                }
                _ => {
                    let text = response.text().await.unwrap_or_default();
                    bail!("{method} failed: HTTP {status} - {text}")
                }
            }
        }

        bail!("{method} failed: could not obtain a session id")
    }
}

impl ManifestFetcher for TransmissionClient {
    async fn fetch_manifest(&mut self, id: i64) -> Result<Vec<FileEntry>> {
        self.get_file_manifest(id).await
    }
}

/// Build the RPC url from host and port.
fn build_url(host: &str, port: u16, https: bool) -> String {
    let scheme = if https { "https" } else { "http" };
    format!("{scheme}://{host}:{port}/transmission/rpc")
}

/// Parse an RPC response body and return its arguments.
fn parse_response<T: DeserializeOwned>(method: &str, body: &str) -> Result<T> {
    let response: RpcResponse<T> =
        serde_json::from_str(body).with_context(|| format!("Failed to parse {method} response JSON"))?;

    if response.result != "success" {
        bail!("{method} failed: {}", response.result);
    }

    response
        .arguments
        .with_context(|| format!("Missing arguments in {method} response"))
}

/// Extract the file list for the torrent with the given id.
fn manifest_from_torrents(id: i64, torrents: Vec<RemoteTorrent>) -> Result<Vec<FileEntry>> {
    let torrent = torrents
        .into_iter()
        .find(|torrent| torrent.id.is_none_or(|torrent_id| torrent_id == id))
        .with_context(|| format!("Torrent ID {id} not found"))?;

    let files = torrent
        .files
        .with_context(|| format!("No file list for torrent ID {id}"))?;

    Ok(files.into_iter().map(|file| FileEntry::new(file.name)).collect())
}
