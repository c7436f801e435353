//!
//! src/config.rs
//!
//! Builds the client configuration from defaults, an optional .env file
//! and the process environment
//!

use url::Url;
use std::time;
use crate::errors::ClientError;

/// Deployed backend the client talks to unless told otherwise
pub const DEFAULT_API_BASE: &str = "https://music-app-dqaf.onrender.com/";

/// Constants for HTTP Config
pub const HTTP_CONNECT_TIMEOUT: u64 = 5000;
pub const HTTP_POOL_MAX_IDLE: usize = 4;
pub const HTTP_POOL_IDLE_TIMEOUT: u64 = 90000;
pub const HTTP_MAX_REDIRECTS: u8 = 4;

/// Wrapper over env::var that treats blank values as unset
fn env_opt(s: &str) -> Option<String> {
    match std::env::var(s) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None
    }
}

/// Only plain http(s) backends make sense for the client
fn ensure_http(url: &Url) -> Result<(), String> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("URL must be http or https (got {other}): {url}"))
    }
}

fn ensure_has_host(url: &Url) -> Result<(), String> {
    match url.host_str() {
        Some(h) if !h.is_empty() => Ok(()),
        _ => Err(format!("URL missing host: {url}"))
    }
}

///
/// Configuration for the playlist backend
///
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url
}

impl ApiConfig {
    /// Parses and validates a base url, adding the trailing slash
    /// `Url::join` needs to keep any base path
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(raw.trim())
            .map_err(|e| ClientError::Config(format!("base url {raw:?} invalid: {e}")))?;

        ensure_http(&base_url).map_err(ClientError::Config)?;
        ensure_has_host(&base_url).map_err(ClientError::Config)?;

        if !base_url.path().ends_with('/') {
            let mut path = base_url.path().to_string();
            path.push('/');
            base_url.set_path(&path);
        }
        base_url.set_query(None);
        base_url.set_fragment(None);

        Ok( ApiConfig { base_url } )
    }
}

/// An explicit base wins outright; the environment is only consulted
/// (and validated) without one
fn resolve_api(base_override: Option<&str>, from_env: Option<String>)
    -> Result<ApiConfig, ClientError> {
    match (base_override, from_env) {
        (Some(raw), _) => ApiConfig::parse(raw),
        (None, Some(raw)) => ApiConfig::parse(&raw),
        (None, None) => ApiConfig::parse(DEFAULT_API_BASE)
    }
}

fn build_api(base_override: Option<&str>) -> Result<ApiConfig, ClientError> {
    resolve_api(base_override, env_opt("PLAYLIST_API_BASE"))
}

///
/// Configuration for Http connect, pooling, etc. Requests themselves
/// carry no deadline.
///
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: time::Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: time::Duration,
    pub max_redirects: u8
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: time::Duration::from_millis(HTTP_CONNECT_TIMEOUT),
            pool_max_idle_per_host: HTTP_POOL_MAX_IDLE,
            pool_idle_timeout: time::Duration::from_millis(HTTP_POOL_IDLE_TIMEOUT),
            max_redirects: HTTP_MAX_REDIRECTS
        }
    }
}

///
/// Configuration for the external audio player
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    pub program: String,
    pub args: Vec<String>      // placed before the preview url
}

impl PlayerConfig {
    pub fn parse(command: &str) -> Result<Self, ClientError> {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words.next()
            .ok_or_else(|| ClientError::Config("player command is empty".to_string()))?;
        Ok( PlayerConfig { program, args: words.collect() } )
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            program: "mpv".to_string(),
            args: vec!["--no-video".to_string(), "--really-quiet".to_string()]
        }
    }
}

fn build_player() -> Result<PlayerConfig, ClientError> {
    match env_opt("PLAYLIST_PLAYER") {
        Some(cmd) => PlayerConfig::parse(&cmd),
        None => Ok(PlayerConfig::default())
    }
}

///
/// Configuration for Logger
///

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<LogFormat> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json"   => Some(LogFormat::Json),
            _ => None
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter_directives: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub include_file_line: bool,
    pub include_target: bool
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter_directives: "warn,playlist_client=info,reqwest=warn".to_string(),
            format: LogFormat::Pretty,
            with_ansi: true,
            include_file_line: false,
            include_target: true
        }
    }
}

fn build_logging() -> Result<LoggingConfig, ClientError> {
    let mut logging = LoggingConfig::default();
    if let Some(raw) = env_opt("LOG_FORMAT") {
        logging.format = LogFormat::parse(&raw)
            .ok_or_else(|| ClientError::Config(format!("LOG_FORMAT invalid: {raw}")))?;
    }
    if logging.format == LogFormat::Json {
        logging.with_ansi = false;
        logging.include_file_line = true;
    }
    Ok(logging)
}

///
/// ClientConfig which holds everything the binary wires together
///
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
    pub player: PlayerConfig
}

///
/// Return the configuration to caller at program start. `base_override`
/// comes from `--base-url`.
///
pub fn load_config(base_override: Option<&str>) -> Result<ClientConfig, ClientError> {
    dotenvy::dotenv().ok();

    let api     = build_api(base_override)?;
    let http    = HttpConfig::default();
    let logging = build_logging()?;
    let player  = build_player()?;

    Ok( ClientConfig { api, http, logging, player } )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_parses() {
        let api = ApiConfig::parse(DEFAULT_API_BASE).unwrap();
        assert_eq!(api.base_url.as_str(), DEFAULT_API_BASE);
        assert_eq!(
            api.base_url.join("playlists").unwrap().as_str(),
            "https://music-app-dqaf.onrender.com/playlists"
        );
    }

    #[test]
    fn base_path_gets_trailing_slash() {
        let api = ApiConfig::parse("http://127.0.0.1:8000/api").unwrap();
        assert_eq!(api.base_url.as_str(), "http://127.0.0.1:8000/api/");
        assert_eq!(
            api.base_url.join("playlists/add").unwrap().as_str(),
            "http://127.0.0.1:8000/api/playlists/add"
        );
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(matches!(
            ApiConfig::parse("ftp://example.com/"),
            Err(ClientError::Config(_))
        ));
        assert!(matches!(ApiConfig::parse("not a url"), Err(ClientError::Config(_))));
    }

    #[test]
    fn explicit_base_skips_broken_env_base() {
        let api = resolve_api(Some("http://127.0.0.1:8000"), Some("ftp://nope".to_string()))
            .unwrap();
        assert_eq!(api.base_url.as_str(), "http://127.0.0.1:8000/");

        assert!(matches!(
            resolve_api(None, Some("ftp://nope".to_string())),
            Err(ClientError::Config(_))
        ));
        assert_eq!(resolve_api(None, None).unwrap().base_url.as_str(), DEFAULT_API_BASE);
    }

    #[test]
    fn player_command_splits_program_and_args() {
        let player = PlayerConfig::parse("  ffplay -nodisp -autoexit ").unwrap();
        assert_eq!(player.program, "ffplay");
        assert_eq!(player.args, vec!["-nodisp", "-autoexit"]);
        assert_eq!(PlayerConfig::parse("mpv --no-video --really-quiet").unwrap(), PlayerConfig::default());
        assert!(PlayerConfig::parse("   ").is_err());
    }

    #[test]
    fn log_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("xml"), None);
    }
}
