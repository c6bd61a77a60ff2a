use std::env;
use std::path::PathBuf;

/// Runtime configuration, read once at startup from the environment. Every
/// setting has a development default so a bare `cargo run` works.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// SQLite database holding the document records.
    pub database_path: PathBuf,
    /// Root directory of the filesystem object store.
    pub storage_root: PathBuf,
    /// Secret mixed into signed-URL digests.
    pub signing_secret: String,
    /// Lifetime of issued access URLs, in seconds.
    pub signed_url_ttl_secs: u64,
    /// Directory searched for TTF fonts used by the raster stamp.
    pub fonts_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        AppConfig {
            host: env_or("VERIDOC_HOST", "127.0.0.1"),
            port: env_parsed("VERIDOC_PORT", 8080),
            database_path: PathBuf::from(env_or("VERIDOC_DB", "veridoc.sqlite")),
            storage_root: PathBuf::from(env_or("VERIDOC_STORAGE", "storage")),
            signing_secret: env_or("VERIDOC_SIGNING_SECRET", "veridoc-dev-secret"),
            signed_url_ttl_secs: env_parsed("VERIDOC_URL_TTL_SECS", 3600),
            fonts_dir: PathBuf::from(env_or("VERIDOC_FONTS_DIR", "./fonts")),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
