//! Configuration management for the SoundNext media proxy.
//!
//! This module handles loading and accessing configuration values from
//! environment variables and `.env` files. Every variable has an accessor
//! function with a sensible default, and [`Settings`] gathers them into one
//! value that is handed to the server components so tests can point them at
//! temporary directories and fake upstreams.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults

use std::{env, net::SocketAddr, path::PathBuf};

pub const APP_NAME: &str = "soundnext";

const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8000";
const DEFAULT_WEB_URL: &str = "https://soundcloud.com";
const DEFAULT_API_URL: &str = "https://api-v2.soundcloud.com";
const DEFAULT_UI_URL: &str = "http://localhost:3000";
const DEFAULT_PRECACHE_CONCURRENCY: usize = 2;
const CACHE_DIR_NAME: &str = "soundcloud_downloads";
const LIKES_FILE_NAME: &str = "liked_tracks.json";

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the application data directory if it doesn't exist and loads
/// environment variables from `<data_local_dir>/soundnext/.env`. A missing
/// `.env` file is not an error: every variable has a default.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/soundnext/.env`
/// - macOS: `~/Library/Application Support/soundnext/.env`
/// - Windows: `%LOCALAPPDATA%/soundnext/.env`
///
/// # Errors
///
/// Returns an error string if the directory cannot be created or an existing
/// `.env` file cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(format!("{APP_NAME}/.env"));
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Returns the address the HTTP server binds to (`SERVER_ADDRESS`).
///
/// Defaults to `127.0.0.1:8000`, the port the web UI and desktop shell expect.
pub fn server_addr() -> String {
    env::var("SERVER_ADDRESS").unwrap_or_else(|_| DEFAULT_SERVER_ADDRESS.to_string())
}

/// Returns the SoundCloud web origin (`SOUNDCLOUD_WEB_URL`).
///
/// Track and playlist URLs must start with this origin, and the landing page
/// scraped for the client id lives here.
pub fn soundcloud_web_url() -> String {
    env::var("SOUNDCLOUD_WEB_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| DEFAULT_WEB_URL.to_string())
}

/// Returns the SoundCloud API base URL (`SOUNDCLOUD_API_URL`).
pub fn soundcloud_api_url() -> String {
    env::var("SOUNDCLOUD_API_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

/// Returns a fixed SoundCloud client id (`SOUNDCLOUD_CLIENT_ID`), if configured.
///
/// When set, the client id is never scraped from the web bundle.
pub fn soundcloud_client_id() -> Option<String> {
    env::var("SOUNDCLOUD_CLIENT_ID")
        .ok()
        .filter(|id| !id.trim().is_empty())
}

/// Returns the audio cache directory (`SOUNDNEXT_CACHE_DIR`).
///
/// Defaults to `soundcloud_downloads` under the system temp directory.
pub fn cache_dir() -> PathBuf {
    env::var("SOUNDNEXT_CACHE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join(CACHE_DIR_NAME))
}

/// Returns the directory holding persisted user data (`SOUNDNEXT_DATA_DIR`).
pub fn data_dir() -> PathBuf {
    env::var("SOUNDNEXT_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
            path.push(APP_NAME);
            path
        })
}

/// Returns how many liked tracks may be pre-cached at the same time
/// (`PRECACHE_CONCURRENCY`).
pub fn precache_concurrency() -> usize {
    env::var("PRECACHE_CONCURRENCY")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_PRECACHE_CONCURRENCY)
}

/// Returns the URL of the web UI opened by `soundnext serve --open`
/// (`SOUNDNEXT_UI_URL`).
pub fn ui_url() -> String {
    env::var("SOUNDNEXT_UI_URL").unwrap_or_else(|_| DEFAULT_UI_URL.to_string())
}

/// Runtime settings shared by the server components.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server_addr: String,
    pub web_url: String,
    pub api_url: String,
    pub client_id: Option<String>,
    pub cache_dir: PathBuf,
    pub data_dir: PathBuf,
    pub precache_concurrency: usize,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            server_addr: server_addr(),
            web_url: soundcloud_web_url(),
            api_url: soundcloud_api_url(),
            client_id: soundcloud_client_id(),
            cache_dir: cache_dir(),
            data_dir: data_dir(),
            precache_concurrency: precache_concurrency(),
        }
    }

    pub fn likes_path(&self) -> PathBuf {
        self.data_dir.join(LIKES_FILE_NAME)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        self.server_addr
            .parse::<SocketAddr>()
            .map_err(|e| format!("Failed to parse server address {}: {}", self.server_addr, e))
    }
}
