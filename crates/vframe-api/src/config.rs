//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Root of `uploads/`, `outputs/` and `temp/`
    pub base_dir: PathBuf,
    /// Max upload body size
    pub max_upload_bytes: usize,
    /// CORS origins
    pub cors_origins: Vec<String>,
    pub ffmpeg_path: String,
    pub frame_rate: u32,
    pub extract_timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            base_dir: PathBuf::from("."),
            max_upload_bytes: 512 * 1024 * 1024, // 512MB
            cors_origins: vec!["*".to_string()],
            ffmpeg_path: "ffmpeg".to_string(),
            frame_rate: 1,
            extract_timeout: None,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            base_dir: std::env::var("API_BASE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.base_dir),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            ffmpeg_path: std::env::var("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            frame_rate: std::env::var("FRAME_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.frame_rate),
            extract_timeout: std::env::var("EXTRACT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
        }
    }
}
