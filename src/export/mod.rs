//! Template export pipeline.
//!
//! `Design -> VectorDocument -> bytes` for one of the registered formats,
//! optionally followed by an upload to blob storage. Uploads stage the bytes
//! in a temporary file that is removed whenever the handle is dropped, so a
//! cancelled export never leaves files behind.

mod encoders;
mod vector;

pub use encoders::*;
pub use vector::*;

use std::path::{Path, PathBuf};

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use tempfile::TempPath;
use uuid::Uuid;

use crate::error::{DesignError, DesignResult};
use crate::graph;
use crate::models::Design;
use crate::storage::BlobStore;

/// Length of the random part of a blob key.
const KEY_SUFFIX_LEN: usize = 12;

/// Encoded template ready to be returned or stored.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub design_id: Uuid,
    pub format: &'static str,
    pub content_type: &'static str,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Where a persisted export ended up.
#[derive(Debug)]
pub enum StoredExport {
    /// Uploaded; fetch it from `url`.
    Remote { url: String, key: String },
    /// Upload failed or no store is configured. The file lives as long as
    /// `file` does.
    Local {
        file: TempPath,
        artifact: ExportArtifact,
    },
}

/// Serializable view of a [`StoredExport`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "storage", rename_all = "snake_case")]
pub enum StoredExportInfo {
    Remote { url: String, key: String },
    Local { path: PathBuf },
}

impl StoredExport {
    pub fn info(&self) -> StoredExportInfo {
        match self {
            Self::Remote { url, key } => StoredExportInfo::Remote {
                url: url.clone(),
                key: key.clone(),
            },
            Self::Local { file, .. } => StoredExportInfo::Local {
                path: file.to_path_buf(),
            },
        }
    }
}

/// Turns validated designs into template files.
#[derive(Clone)]
pub struct TemplateExporter {
    registry: EncoderRegistry,
    default_samples: u32,
}

impl TemplateExporter {
    pub fn new(registry: EncoderRegistry, default_samples: u32) -> Self {
        Self {
            registry,
            default_samples,
        }
    }

    pub fn registry(&self) -> &EncoderRegistry {
        &self.registry
    }

    pub fn samples_for(&self, design: &Design) -> u32 {
        design
            .template_settings
            .outline_samples
            .unwrap_or(self.default_samples)
    }

    /// Vectorize and encode `design` as `format`.
    ///
    /// The format is resolved first, so an unknown one fails without
    /// touching the design.
    pub fn export(&self, design: &Design, format: &str) -> DesignResult<ExportArtifact> {
        let encoder = self
            .registry
            .get(format)
            .ok_or_else(|| DesignError::UnsupportedFormat(format.to_string()))?;

        graph::validate(design)?;
        let doc = vectorize(design, self.samples_for(design))?;
        let bytes = encoder.encode(&doc);

        tracing::info!(
            design_id = %design.id,
            format = encoder.format(),
            paths = doc.path_count(),
            bytes = bytes.len(),
            "Exported template"
        );

        Ok(ExportArtifact {
            design_id: design.id,
            format: encoder.format(),
            content_type: encoder.content_type(),
            file_name: format!("{}.{}", slug(&design.name), encoder.extension()),
            bytes,
        })
    }
}

/// Lower-case, dash-separated file stem for a design name.
fn slug(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let stem = stem
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if stem.is_empty() {
        "design".to_string()
    } else {
        stem
    }
}

/// Blob key `templates/<design>/<random>.<ext>`.
pub fn blob_key(design_id: Uuid, extension: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("templates/{}/{}.{}", design_id, suffix, extension)
}

async fn stage(bytes: Vec<u8>, temp_dir: Option<PathBuf>) -> DesignResult<TempPath> {
    tokio::task::spawn_blocking(move || -> std::io::Result<TempPath> {
        use std::io::Write;
        let mut file = match temp_dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
            None => tempfile::NamedTempFile::new()?,
        };
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(file.into_temp_path())
    })
    .await
    .map_err(|e| DesignError::Internal(format!("staging task failed: {}", e)))?
    .map_err(|e| DesignError::Internal(format!("could not stage export: {}", e)))
}

/// Stage `artifact` in a temporary file and upload it.
///
/// A failed or missing upload is not an error: the staged file is handed
/// back instead and the degradation is logged.
pub async fn persist(
    artifact: ExportArtifact,
    blobs: Option<&dyn BlobStore>,
    temp_dir: Option<&Path>,
) -> DesignResult<StoredExport> {
    let file = stage(artifact.bytes.clone(), temp_dir.map(Path::to_path_buf)).await?;

    let Some(store) = blobs else {
        tracing::warn!(
            design_id = %artifact.design_id,
            "No blob storage configured, keeping export local"
        );
        return Ok(StoredExport::Local { file, artifact });
    };

    let key = blob_key(artifact.design_id, extension_of(&artifact.file_name));
    match store
        .upload(artifact.bytes.clone(), &key, artifact.content_type)
        .await
    {
        Ok(url) => {
            tracing::info!(design_id = %artifact.design_id, %url, "Uploaded template");
            // Dropping the staged file removes it.
            drop(file);
            Ok(StoredExport::Remote { url, key })
        }
        Err(e) => {
            tracing::warn!(
                design_id = %artifact.design_id,
                error = %e,
                path = %file.display(),
                "Template upload failed, falling back to local file"
            );
            Ok(StoredExport::Local { file, artifact })
        }
    }
}

fn extension_of(file_name: &str) -> &str {
    file_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("bin")
}
