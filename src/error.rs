//! Error types for design operations.

use thiserror::Error;
use uuid::Uuid;

use crate::graph::ValidationErrors;

/// Errors surfaced by the design service and the export pipeline.
#[derive(Debug, Error)]
pub enum DesignError {
    /// The submitted graph breaks one or more invariants.
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Design has no components to export")]
    EmptyDesign,

    #[error("Invalid symmetry: count must be at least 1, got {0}")]
    InvalidSymmetry(u32),

    /// Pagination or sort parameters out of range.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Another writer moved the design past the version this change was based on.
    #[error("Design was modified concurrently (expected version {expected})")]
    VersionConflict { expected: u32 },

    /// The document store failed.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DesignError {
    pub fn design_not_found(id: Uuid) -> Self {
        Self::NotFound(format!("Design {}", id))
    }
}

impl From<ValidationErrors> for DesignError {
    fn from(e: ValidationErrors) -> Self {
        Self::Validation(e)
    }
}

pub type DesignResult<T> = std::result::Result<T, DesignError>;
