//! Process configuration, loaded once at startup and passed down explicitly.

use std::path::PathBuf;

use crate::models::OUTLINE_SAMPLES_RANGE;

/// Default number of samples taken along each component outline.
pub const DEFAULT_OUTLINE_SAMPLES: u32 = 64;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// SQLite file (from ROCKET_FORGE_DB). `None` uses the platform data dir.
    pub database_path: Option<PathBuf>,
    /// API key required on every request (from ROCKET_FORGE_API_KEY)
    pub api_key: Option<String>,
    pub blob: Option<BlobConfig>,
    /// Samples per outline (from ROCKET_FORGE_OUTLINE_SAMPLES)
    pub outline_samples: u32,
    /// Where export files are staged (from ROCKET_FORGE_TEMP_DIR)
    pub temp_dir: Option<PathBuf>,
}

/// Blob storage endpoint (from ROCKET_FORGE_BLOB_URL / ROCKET_FORGE_BLOB_TOKEN).
#[derive(Clone, Debug)]
pub struct BlobConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let outline_samples = match var("ROCKET_FORGE_OUTLINE_SAMPLES") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if OUTLINE_SAMPLES_RANGE.contains(&n) => n,
                _ => {
                    tracing::warn!(
                        "Ignoring ROCKET_FORGE_OUTLINE_SAMPLES={:?}, using {}",
                        raw,
                        DEFAULT_OUTLINE_SAMPLES
                    );
                    DEFAULT_OUTLINE_SAMPLES
                }
            },
            None => DEFAULT_OUTLINE_SAMPLES,
        };

        Self {
            database_path: var("ROCKET_FORGE_DB").map(PathBuf::from),
            api_key: var("ROCKET_FORGE_API_KEY"),
            blob: var("ROCKET_FORGE_BLOB_URL").map(|base_url| BlobConfig {
                base_url,
                token: var("ROCKET_FORGE_BLOB_TOKEN"),
            }),
            outline_samples,
            temp_dir: var("ROCKET_FORGE_TEMP_DIR").map(PathBuf::from),
        }
    }
}

impl Default for AppConfig {
    /// No auth, no blob store, default sampling.
    fn default() -> Self {
        Self {
            database_path: None,
            api_key: None,
            blob: None,
            outline_samples: DEFAULT_OUTLINE_SAMPLES,
            temp_dir: None,
        }
    }
}
