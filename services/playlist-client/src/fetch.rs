//!
//! src/fetch.rs
//!
//! Defines the calls the client makes against the playlist backend
//! and the reqwest client that performs them
//!

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;
use reqwest::{Client, header, redirect, RequestBuilder};
use tracing::debug;

use crate::config::{ApiConfig, HttpConfig};
use crate::errors::ClientError;
use crate::types::{NewPlaylist, NewTrack, Playlist};

/// The backend as the controller sees it
#[async_trait]
pub trait PlaylistApi: Send + Sync {
    /// GET /playlists
    async fn list_playlists(&self) -> Result<Vec<Playlist>, ClientError>;

    /// POST /playlists
    async fn create_playlist(&self, playlist: &NewPlaylist) -> Result<(), ClientError>;

    /// POST /playlists/add
    async fn add_track(&self, track: &NewTrack) -> Result<(), ClientError>;

    /// GET / (service banner)
    async fn health(&self) -> Result<String, ClientError>;
}

/// Client building functionality
fn client_helper(http: &HttpConfig) -> reqwest::ClientBuilder {
    Client::builder()
        .connect_timeout(http.connect_timeout)
        .pool_max_idle_per_host(http.pool_max_idle_per_host)
        .pool_idle_timeout(Some(http.pool_idle_timeout))
        .redirect(redirect::Policy::limited(http.max_redirects as usize))
}

pub fn base_client(http: &HttpConfig) -> Result<Client, ClientError> {
    let mut h = header::HeaderMap::new();
    h.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
    client_helper(http)
        .default_headers(h)
        .user_agent(concat!("playlist-client/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ClientError::Http(format!("build client: {e}")))
}

/// Sends a request; non-2xx responses become `RequestFailed` carrying
/// the body text, success bodies must be JSON
async fn get_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await?;
        debug!(status = %status, body = %body, "http.request.failed");
        return Err(ClientError::RequestFailed { status: status.as_u16(), body });
    }
    let bytes = response.bytes().await?;
    debug!(status = %status, len = bytes.len(), "http.request.ok");
    Ok(serde_json::from_slice(&bytes)?)
}

#[derive(Clone, Debug)]
pub struct BackendClient {
    pub http: Client,
    pub base: Url
}

impl BackendClient {
    pub fn new(http_config: &HttpConfig, api: &ApiConfig) -> Result<Self, ClientError> {
        let http = base_client(http_config)?;
        Ok( Self { http, base: api.base_url.clone() } )
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }

    fn post_json<B: Serialize>(&self, url: Url, body: &B) -> RequestBuilder {
        self.http.post(url).json(body)
    }
}

#[async_trait]
impl PlaylistApi for BackendClient {
    async fn list_playlists(&self) -> Result<Vec<Playlist>, ClientError> {
        let url = self.endpoint("playlists")?;
        debug!(url = %url, "http.request");
        get_json(self.http.get(url)).await
    }

    async fn create_playlist(&self, playlist: &NewPlaylist) -> Result<(), ClientError> {
        let url = self.endpoint("playlists")?;
        debug!(url = %url, name = %playlist.name, "http.request");
        let created: serde_json::Value = get_json(self.post_json(url, playlist)).await?;
        debug!(response = %created, "playlists.create.response");
        Ok(())
    }

    async fn add_track(&self, track: &NewTrack) -> Result<(), ClientError> {
        let url = self.endpoint("playlists/add")?;
        debug!(url = %url, playlist_id = track.playlist_id, track = %track.track_id,
            "http.request");
        let added: serde_json::Value = get_json(self.post_json(url, track)).await?;
        debug!(response = %added, "track.add.response");
        Ok(())
    }

    async fn health(&self) -> Result<String, ClientError> {
        let url = self.endpoint("")?;
        let value: serde_json::Value = get_json(self.http.get(url)).await?;
        Ok(value.get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[derive(Debug, Clone)]
    struct Captured {
        request_line: String,
        body: String
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    /// Answers every connection with the same canned response and records
    /// what was asked
    async fn responder(status: &str, body: &str) -> (ApiConfig, Arc<Mutex<Vec<Captured>>>) {
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\n\
             content-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        raw_responder(response, Duration::ZERO).await
    }

    /// Writes `response` verbatim after `delay`, then closes the socket
    async fn raw_responder(response: String, delay: Duration)
        -> (ApiConfig, Arc<Mutex<Vec<Captured>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = seen.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else { break };
                let mut buf = Vec::new();
                let mut chunk = [0_u8; 1024];
                let head_end = loop {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 { break None; }
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(i) = find(&buf, b"\r\n\r\n") { break Some(i + 4); }
                };
                let Some(head_end) = head_end else { continue };
                let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
                let length = head.lines()
                    .filter_map(|l| l.split_once(':'))
                    .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                while buf.len() < head_end + length {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 { break; }
                    buf.extend_from_slice(&chunk[..n]);
                }
                log.lock().unwrap().push(Captured {
                    request_line: head.lines().next().unwrap_or_default().to_string(),
                    body: String::from_utf8_lossy(&buf[head_end..]).to_string()
                });
                tokio::time::sleep(delay).await;
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        let api = ApiConfig::parse(&format!("http://{addr}/")).unwrap();
        (api, seen)
    }

    // proxies from the environment must not intercept loopback traffic
    fn client(api: &ApiConfig) -> BackendClient {
        let http = client_helper(&HttpConfig::default()).no_proxy().build().unwrap();
        BackendClient { http, base: api.base_url.clone() }
    }

    #[tokio::test]
    async fn list_playlists_decodes_backend_response() -> Result<(), ClientError> {
        let body = r#"[{"id": 1, "name": "Chill", "tracks": [
            {"id": "u-1", "title": "Song", "artist": "Band",
             "preview": "https://cdn.example/p.mp3", "albumCover": null}]},
            {"id": 2, "name": "Empty", "tracks": []}]"#;
        let (api, seen) = responder("200 OK", body).await;

        let playlists = client(&api).list_playlists().await?;
        assert_eq!(playlists.len(), 2);
        assert_eq!(playlists[0].tracks[0].track_id, "u-1");
        assert_eq!(playlists[1].name, "Empty");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].request_line.starts_with("GET /playlists "));
        Ok(())
    }

    #[tokio::test]
    async fn non_success_carries_body_text() {
        let (api, _) = responder("500 Internal Server Error", "database unavailable").await;

        let err = client(&api).list_playlists().await.unwrap_err();
        match &err {
            ClientError::RequestFailed { status, body } => {
                assert_eq!(*status, 500);
                assert_eq!(body, "database unavailable");
            }
            other => panic!("unexpected error: {other:?}")
        }
        assert_eq!(err.to_string(), "database unavailable");
    }

    #[tokio::test]
    async fn truncated_error_body_is_an_http_error() {
        let response = "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\
                        connection: close\r\n\r\npartial".to_string();
        let (api, _) = raw_responder(response, Duration::ZERO).await;

        let err = client(&api).list_playlists().await.unwrap_err();
        match err {
            ClientError::Http(msg) => assert!(!msg.is_empty()),
            other => panic!("unexpected error: {other:?}")
        }
    }

    // requests carry no overall deadline
    #[tokio::test]
    async fn slow_response_still_decodes() -> Result<(), ClientError> {
        let response = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
                        content-length: 2\r\nconnection: close\r\n\r\n[]".to_string();
        let (api, _) = raw_responder(response, Duration::from_secs(16)).await;

        let playlists = client(&api).list_playlists().await?;
        assert!(playlists.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn add_track_posts_json_body() -> Result<(), ClientError> {
        let (api, seen) = responder(
            "200 OK", r#"{"message": "Track added", "playlist_id": 4}"#
        ).await;
        let track = NewTrack {
            playlist_id: 4,
            track_id: "abc".to_string(),
            title: "Title".to_string(),
            artist: "Artist".to_string(),
            preview: "https://cdn.example/p.mp3".to_string(),
            album_cover: String::new()
        };

        client(&api).add_track(&track).await?;

        let seen = seen.lock().unwrap();
        assert!(seen[0].request_line.starts_with("POST /playlists/add "));
        let sent: NewTrack = serde_json::from_str(&seen[0].body)?;
        assert_eq!(sent, track);
        Ok(())
    }

    #[tokio::test]
    async fn create_playlist_rejects_non_json_success() {
        let (api, seen) = responder("200 OK", "created").await;
        let err = client(&api)
            .create_playlist(&NewPlaylist { name: "Gym".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));

        let seen = seen.lock().unwrap();
        assert!(seen[0].request_line.starts_with("POST /playlists "));
        assert_eq!(seen[0].body, r#"{"name":"Gym"}"#);
    }

    #[tokio::test]
    async fn health_reads_banner() -> Result<(), ClientError> {
        let (api, _) = responder("200 OK", r#"{"message": "running"}"#).await;
        assert_eq!(client(&api).health().await?, "running");
        Ok(())
    }
}
