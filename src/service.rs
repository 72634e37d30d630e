//! Design use cases and the versioning rules around them.
//!
//! Every content change goes through [`DesignService::update`]: the patch is
//! merged into a draft, the draft is validated, and only then is it written
//! with `version + 1` and one new history entry. The write is a
//! compare-and-swap on the version the draft was built from, so two writers
//! racing on the same design cannot silently overwrite each other.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::{DesignFilter, DesignStore};
use crate::error::{DesignError, DesignResult};
use crate::export::{self, EncoderRegistry, ExportArtifact, StoredExport, TemplateExporter};
use crate::graph;
use crate::models::*;
use crate::physics;
use crate::storage::{BlobStore, HttpBlobStore};

#[derive(Clone)]
pub struct DesignService {
    store: Arc<dyn DesignStore>,
    blobs: Option<Arc<dyn BlobStore>>,
    exporter: TemplateExporter,
    temp_dir: Option<PathBuf>,
}

impl DesignService {
    pub fn new(store: Arc<dyn DesignStore>, config: &AppConfig) -> Self {
        let blobs = config.blob.as_ref().map(|b| {
            Arc::new(HttpBlobStore::new(b.base_url.clone(), b.token.clone())) as Arc<dyn BlobStore>
        });
        Self {
            store,
            blobs,
            exporter: TemplateExporter::new(EncoderRegistry::default(), config.outline_samples),
            temp_dir: config.temp_dir.clone(),
        }
    }

    /// Replace the configured blob store.
    pub fn with_blob_store(mut self, blobs: Option<Arc<dyn BlobStore>>) -> Self {
        self.blobs = blobs;
        self
    }

    pub fn exporter(&self) -> &TemplateExporter {
        &self.exporter
    }

    // ============================================================
    // Access rules
    // ============================================================

    fn load(&self, id: Uuid) -> DesignResult<Design> {
        self.store
            .find(id)?
            .ok_or_else(|| DesignError::design_not_found(id))
    }

    fn ensure_readable(design: &Design, caller: &Caller) -> DesignResult<()> {
        if design.is_public || design.owner_id == caller.user_id || caller.role == Role::Admin {
            Ok(())
        } else {
            Err(DesignError::AccessDenied(format!(
                "design {} is private",
                design.id
            )))
        }
    }

    fn ensure_owner(design: &Design, caller: &Caller) -> DesignResult<()> {
        if design.owner_id == caller.user_id {
            Ok(())
        } else {
            Err(DesignError::AccessDenied(format!(
                "only the owner may modify design {}",
                design.id
            )))
        }
    }

    fn samples_for(&self, design: &Design) -> u32 {
        self.exporter.samples_for(design)
    }

    /// Validate `design`, logging the rejection.
    fn check(design: &Design) -> DesignResult<()> {
        graph::validate(design).map_err(|e| {
            tracing::warn!(
                design_id = %design.id,
                violations = e.violations.len(),
                "Rejected design draft: {}",
                e
            );
            DesignError::Validation(e)
        })
    }

    /// Write `next` over the stored version `expected`.
    fn commit(&self, next: &Design, expected: u32) -> DesignResult<()> {
        if self.store.update(next, expected)? {
            return Ok(());
        }
        if self.store.find(next.id)?.is_none() {
            return Err(DesignError::design_not_found(next.id));
        }
        tracing::warn!(design_id = %next.id, expected, "Version conflict on write");
        Err(DesignError::VersionConflict { expected })
    }

    // ============================================================
    // Design operations
    // ============================================================

    pub fn create(&self, caller: &Caller, input: CreateDesignInput) -> DesignResult<Design> {
        let mut design = Design::from_input(caller.user_id, input);

        Self::check(&design)?;
        let samples = self.samples_for(&design);
        physics::refresh(&mut design, samples);
        self.store.insert(&design)?;

        tracing::info!(design_id = %design.id, owner = %design.owner_id, "Created design");
        Ok(design)
    }

    /// Fetch a design the caller may read.
    pub fn get(&self, caller: &Caller, id: Uuid) -> DesignResult<Design> {
        let design = self.load(id)?;
        Self::ensure_readable(&design, caller)?;
        Ok(design)
    }

    pub fn list_own(&self, caller: &Caller, query: &ListQuery) -> DesignResult<Page<DesignSummary>> {
        self.list(DesignFilter::Owner(caller.user_id), query)
    }

    pub fn list_public(&self, query: &ListQuery) -> DesignResult<Page<DesignSummary>> {
        self.list(DesignFilter::Public, query)
    }

    fn list(&self, filter: DesignFilter, query: &ListQuery) -> DesignResult<Page<DesignSummary>> {
        let req = query.validate().map_err(DesignError::InvalidQuery)?;
        let designs = self
            .store
            .find_many(filter, req.sort, req.direction, req.skip(), req.limit)?;
        let total = self.store.count(filter)?;

        Ok(Page {
            items: designs.into_iter().map(Into::into).collect(),
            total,
            page: req.page,
            limit: req.limit,
        })
    }

    /// Apply a replace-patch as the next version.
    pub fn update(&self, caller: &Caller, id: Uuid, patch: DesignPatch) -> DesignResult<Design> {
        let current = self.load(id)?;
        Self::ensure_owner(&current, caller)?;

        let description = patch
            .change_description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CHANGE_DESCRIPTION.to_string());

        let mut next = graph::draft(&current, patch);
        Self::check(&next)?;

        next.version = current.version + 1;
        next.history.push(VersionHistoryEntry::new(next.version, description));
        next.updated_at = Utc::now();
        let samples = self.samples_for(&next);
        physics::refresh(&mut next, samples);

        self.commit(&next, current.version)?;
        tracing::info!(design_id = %id, version = next.version, "Updated design");
        Ok(next)
    }

    pub fn delete(&self, caller: &Caller, id: Uuid) -> DesignResult<()> {
        let design = self.load(id)?;
        Self::ensure_owner(&design, caller)?;
        if !self.store.delete(id)? {
            return Err(DesignError::design_not_found(id));
        }
        tracing::info!(design_id = %id, "Deleted design");
        Ok(())
    }

    /// Copy a readable design into a new private design owned by the caller.
    ///
    /// Sub-entity ids are copied verbatim; they are only unique within
    /// their owning design.
    pub fn clone_design(
        &self,
        caller: &Caller,
        id: Uuid,
        new_name: Option<String>,
    ) -> DesignResult<Design> {
        let source = self.get(caller, id)?;
        let now = Utc::now();

        let name = new_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("{} (Copy)", source.name));
        let provenance = format!(
            "Cloned from design {} at version {}",
            source.id, source.version
        );

        let mut copy = Design {
            id: Uuid::new_v4(),
            owner_id: caller.user_id,
            name,
            is_public: false,
            version: 1,
            history: vec![VersionHistoryEntry::new(1, provenance)],
            created_at: now,
            updated_at: now,
            ..source
        };
        let samples = self.samples_for(&copy);
        physics::refresh(&mut copy, samples);

        self.store.insert(&copy)?;
        tracing::info!(design_id = %copy.id, source_id = %id, "Cloned design");
        Ok(copy)
    }

    /// Flip visibility without bumping the version.
    ///
    /// Visibility is metadata, so the history entry reuses the current
    /// version number.
    pub fn toggle_public(&self, caller: &Caller, id: Uuid) -> DesignResult<Design> {
        let current = self.load(id)?;
        Self::ensure_owner(&current, caller)?;

        let mut next = current.clone();
        next.is_public = !current.is_public;
        let description = if next.is_public {
            "Made design public"
        } else {
            "Made design private"
        };
        next.history
            .push(VersionHistoryEntry::new(current.version, description));
        next.updated_at = Utc::now();

        self.commit(&next, current.version)?;
        tracing::info!(design_id = %id, is_public = next.is_public, "Toggled visibility");
        Ok(next)
    }

    pub fn history(&self, caller: &Caller, id: Uuid) -> DesignResult<Vec<VersionHistoryEntry>> {
        Ok(self.get(caller, id)?.history)
    }

    /// Recompute derived metrics from the current graph.
    pub fn analysis(&self, caller: &Caller, id: Uuid) -> DesignResult<DesignAnalysis> {
        let design = self.get(caller, id)?;
        Ok(physics::analyze(&design, self.samples_for(&design)))
    }

    // ============================================================
    // Export
    // ============================================================

    /// Encode a readable design as `format`.
    pub async fn export(&self, caller: &Caller, id: Uuid, format: &str) -> DesignResult<ExportArtifact> {
        if self.exporter.registry().get(format).is_none() {
            return Err(DesignError::UnsupportedFormat(format.to_string()));
        }

        let design = self.get(caller, id)?;
        let exporter = self.exporter.clone();
        let format = format.to_string();
        tokio::task::spawn_blocking(move || exporter.export(&design, &format))
            .await
            .map_err(|e| DesignError::Internal(format!("export task failed: {}", e)))?
    }

    /// Export and hand the result to blob storage, falling back to a local
    /// temporary file when the upload fails.
    pub async fn export_and_store(
        &self,
        caller: &Caller,
        id: Uuid,
        format: &str,
    ) -> DesignResult<StoredExport> {
        let artifact = self.export(caller, id, format).await?;
        export::persist(artifact, self.blobs.as_deref(), self.temp_dir.as_deref()).await
    }
}
