use std::sync::{Arc, Mutex};

use rocket_forge::config::AppConfig;
use rocket_forge::db::Database;
use rocket_forge::error::DesignError;
use rocket_forge::export::{persist, EncoderRegistry, StoredExport, StoredExportInfo, TemplateExporter};
use rocket_forge::models::*;
use rocket_forge::service::DesignService;
use rocket_forge::storage::{BlobStore, StorageError, UploadFuture};
use uuid::Uuid;

/// Records uploads and answers with a fixed outcome.
#[derive(Default)]
struct FakeStore {
    fail: bool,
    uploads: Mutex<Vec<(String, String, usize)>>,
}

impl FakeStore {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }
}

impl BlobStore for FakeStore {
    fn upload<'a>(&'a self, bytes: Vec<u8>, key: &'a str, content_type: &'a str) -> UploadFuture<'a> {
        Box::pin(async move {
            if self.fail {
                return Err(StorageError::Unavailable("store is down".to_string()));
            }
            self.uploads
                .lock()
                .unwrap()
                .push((key.to_string(), content_type.to_string(), bytes.len()));
            Ok(format!("https://blobs.test/{}", key))
        })
    }
}

fn design() -> Design {
    let fin = Component {
        id: "fin".to_string(),
        name: "Fin".to_string(),
        kind: ComponentType::Fin,
        section_id: "main-body".to_string(),
        material: Some(Material::Balsa),
        thickness_mm: 2.0,
        doubled: false,
        cutting_method: None,
        outline: vec![
            BezierControlPoint::new(0.0, 0.0),
            BezierControlPoint::new(60.0, 0.0),
            BezierControlPoint::new(60.0, 45.0),
            BezierControlPoint::new(30.0, 45.0),
            BezierControlPoint::new(0.0, 0.0),
        ],
        placement: Placement {
            x: 330.0,
            y: 20.0,
            rotation_deg: 0.0,
        },
        symmetry: Symmetry::radial(3),
        linked_components: Vec::new(),
        constraints: Vec::new(),
    };
    Design::from_input(
        Uuid::new_v4(),
        CreateDesignInput {
            name: "Fin Test".to_string(),
            components: vec![fin],
            ..Default::default()
        },
    )
}

fn entries(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn successful_upload_is_remote_and_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = FakeStore::default();
    let design = design();
    let artifact = TemplateExporter::new(EncoderRegistry::default(), 16)
        .export(&design, "svg")
        .unwrap();

    let stored = persist(artifact, Some(&store as &dyn BlobStore), Some(dir.path())).await.unwrap();

    match stored.info() {
        StoredExportInfo::Remote { url, key } => {
            assert!(key.starts_with(&format!("templates/{}/", design.id)));
            assert!(key.ends_with(".svg"));
            assert_eq!(url, format!("https://blobs.test/{}", key));
        }
        other => panic!("expected remote export, got {:?}", other),
    }
    let uploads = store.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].1, "image/svg+xml");
    assert_eq!(entries(dir.path()), 0);
}

#[tokio::test]
async fn failed_upload_falls_back_to_local_file() {
    let dir = tempfile::tempdir().unwrap();
    let design = design();
    let artifact = TemplateExporter::new(EncoderRegistry::default(), 16)
        .export(&design, "cutterB")
        .unwrap();
    let expected = artifact.bytes.clone();

    let store = FakeStore::failing();
    let stored = persist(artifact, Some(&store as &dyn BlobStore), Some(dir.path()))
        .await
        .unwrap();

    let StoredExport::Local { file, artifact } = stored else {
        panic!("expected local fallback");
    };
    assert!(file.starts_with(dir.path()));
    assert_eq!(std::fs::read(&file).unwrap(), expected);
    assert_eq!(artifact.bytes, expected);

    drop(file);
    assert_eq!(entries(dir.path()), 0);
}

#[tokio::test]
async fn missing_store_keeps_export_local() {
    let artifact = TemplateExporter::new(EncoderRegistry::default(), 16)
        .export(&design(), "pdf")
        .unwrap();

    let stored = persist(artifact, None, None).await.unwrap();
    assert!(matches!(stored, StoredExport::Local { .. }));
}

#[tokio::test]
async fn service_degrades_when_the_store_is_down() {
    let db = Database::open_memory().unwrap();
    db.migrate().unwrap();
    let service = DesignService::new(Arc::new(db), &AppConfig::default())
        .with_blob_store(Some(Arc::new(FakeStore::failing()) as Arc<dyn BlobStore>));
    let owner = Caller::user(Uuid::new_v4());

    let created = service
        .create(
            &owner,
            CreateDesignInput {
                components: design().components,
                name: "Fin Test".to_string(),
                ..Default::default()
            },
        )
        .unwrap();

    let stored = service
        .export_and_store(&owner, created.id, "svg")
        .await
        .unwrap();
    assert!(matches!(stored, StoredExport::Local { .. }));
}

#[tokio::test]
async fn service_checks_format_before_access() {
    let db = Database::open_memory().unwrap();
    db.migrate().unwrap();
    let service = DesignService::new(Arc::new(db), &AppConfig::default());

    let result = service
        .export(&Caller::user(Uuid::new_v4()), Uuid::new_v4(), "gcode")
        .await;
    assert!(matches!(result, Err(DesignError::UnsupportedFormat(f)) if f == "gcode"));
}

#[tokio::test]
async fn every_registered_format_encodes() {
    let exporter = TemplateExporter::new(EncoderRegistry::default(), 16);
    let design = design();
    for format in exporter.registry().formats() {
        let artifact = exporter.export(&design, format).unwrap();
        assert_eq!(artifact.format, format);
        assert!(!artifact.bytes.is_empty());
    }
}
