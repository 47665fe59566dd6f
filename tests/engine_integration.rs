//! End-to-end tests for the acquisition engine: single-flight installs,
//! cancellation, corruption self-healing, and the first-run default path.

use lectern::catalog::{
    data, Catalog, ContentType, License, ModuleDescriptor, SourceDescriptor,
};
use lectern::progress::DownloadStatus;
use lectern::{EngineConfig, EngineError, ModuleEngine};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_catalog(remote_base: &str) -> Catalog {
    Catalog::from_descriptors(vec![
        ModuleDescriptor {
            id: "kjv".into(),
            name: "King James Version".into(),
            content_type: ContentType::PrimaryText,
            source: SourceDescriptor::BundledStatic,
            format_tag: "json-bible".into(),
            features: vec![],
            license: License {
                text: "Public Domain".into(),
                public_domain: true,
            },
            default_install: true,
        },
        ModuleDescriptor {
            id: "web".into(),
            name: "World English Bible".into(),
            content_type: ContentType::PrimaryText,
            source: SourceDescriptor::RemoteFilePerUnit {
                base_url: remote_base.into(),
            },
            format_tag: "json-bible".into(),
            features: vec![],
            license: License {
                text: "Public Domain".into(),
                public_domain: true,
            },
            default_install: false,
        },
    ])
}

fn engine_at(root: &Path, remote_base: &str) -> ModuleEngine {
    let config = EngineConfig::rooted_at(root.to_path_buf());
    std::fs::create_dir_all(&config.assets_dir).unwrap();
    ModuleEngine::with_catalog(config, test_catalog(remote_base))
}

fn write_kjv_asset(root: &Path) {
    std::fs::write(
        root.join("assets/kjv.json"),
        serde_json::to_vec(&json!({
            "Genesis": { "1": { "1": "In the beginning God created" } }
        }))
        .unwrap(),
    )
    .unwrap();
}

async fn mount_all_books(server: &MockServer, delay: Option<Duration>) {
    let mut template =
        ResponseTemplate::new(200).set_body_json(json!({ "1": { "1": "verse text" } }));
    if let Some(delay) = delay {
        template = template.set_delay(delay);
    }
    Mock::given(method("GET"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn concurrent_installs_share_one_acquisition() {
    let server = MockServer::start().await;
    mount_all_books(&server, Some(Duration::from_millis(10))).await;

    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(engine_at(dir.path(), &server.uri()));

    let a = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.install("web").await })
    };
    let b = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.install("web").await })
    };

    let (a, b) = (a.await.unwrap(), b.await.unwrap());
    assert!(a.is_ok());
    assert!(b.is_ok());

    // Exactly one acquisition: one request per book, not two.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), data::BOOKS.len());
}

#[tokio::test]
async fn partial_unit_failure_still_completes() {
    let server = MockServer::start().await;
    // Book #40 (Matthew) fails; everything else succeeds. 404 rather than
    // 500 so the client does not burn time retrying.
    Mock::given(method("GET"))
        .and(path("/matthew.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_all_books(&server, None).await;

    let dir = tempfile::tempdir().unwrap();
    let engine = engine_at(dir.path(), &server.uri());

    engine.install("web").await.unwrap();

    let record = engine.progress("web").unwrap();
    assert_eq!(record.status, DownloadStatus::Completed);
    assert_eq!(record.failed_units, vec!["Matthew".to_string()]);

    let payload = engine.read("web", &[]).await.unwrap();
    assert_eq!(payload.as_object().unwrap().len(), data::BOOKS.len() - 1);
}

#[tokio::test]
async fn cancel_leaves_manifest_unchanged_and_clears_tracking() {
    let server = MockServer::start().await;
    mount_all_books(&server, Some(Duration::from_millis(50))).await;

    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(engine_at(dir.path(), &server.uri()));

    let install = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.install("web").await })
    };

    // Let a couple of units go through, then cancel.
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(engine.cancel("web"));

    let err = install.await.unwrap().unwrap_err();
    assert!(err.is_cancelled());

    assert!(!engine
        .list_installed()
        .await
        .unwrap()
        .contains(&"web".to_string()));
    // Tracking entry is gone; only the retained terminal record remains.
    let record = engine.progress("web").unwrap();
    assert_eq!(record.status, DownloadStatus::Failed);
    assert!(record.error.unwrap().contains("cancelled"));
}

#[tokio::test]
async fn corrupted_persisted_payload_is_deleted_not_served() {
    let server = MockServer::start().await;
    mount_all_books(&server, None).await;

    let dir = tempfile::tempdir().unwrap();
    let engine = engine_at(dir.path(), &server.uri());

    engine.install("web").await.unwrap();

    // Corrupt the persisted entry: empty its top-level mapping. A fresh
    // engine (cold memory tier) must not serve it.
    let entry = dir.path().join("modules/files/web.json");
    std::fs::write(&entry, b"{}").unwrap();

    let engine = engine_at(dir.path(), &server.uri());
    // `read` with an empty path never reaches the network; with no bundled
    // asset for web the module is unavailable, never the empty tree.
    let err = engine.read("web", &[]).await.unwrap_err();
    assert!(matches!(err, EngineError::ModuleUnavailable(_)));
    // Self-healed: the corrupt entry was deleted.
    assert!(!entry.exists());
}

#[tokio::test]
async fn first_run_default_install_serves_genesis() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_at(dir.path(), &server.uri());
    write_kjv_asset(dir.path());

    engine.ensure_defaults().await.unwrap();

    assert!(engine
        .list_installed()
        .await
        .unwrap()
        .contains(&"kjv".to_string()));

    let chapters = engine.read("kjv", &["Genesis".into()]).await.unwrap();
    assert!(!chapters.as_object().unwrap().is_empty());
}

#[tokio::test]
async fn read_survives_restart_via_persistent_tier() {
    let server = MockServer::start().await;
    mount_all_books(&server, None).await;

    let dir = tempfile::tempdir().unwrap();
    {
        let engine = engine_at(dir.path(), &server.uri());
        engine.install("web").await.unwrap();
    }

    // New engine, cold memory: payload comes back from the persistent tier
    // without touching the network.
    server.reset().await;
    let engine = engine_at(dir.path(), &server.uri());
    let book = engine.read("web", &["Genesis".into()]).await.unwrap();
    assert_eq!(book["1"]["1"], "verse text");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn total_unit_failure_fails_install_instead_of_caching_nothing() {
    let server = MockServer::start().await;
    // Remote answers 404 for every unit: best-effort skipping leaves an
    // empty payload, which must fail the install rather than land in the
    // cache as an installed-but-unreadable module.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let engine = engine_at(dir.path(), &server.uri());

    let err = engine.install("web").await.unwrap_err();
    assert!(matches!(err, EngineError::SourceUnavailable { .. }));

    assert!(!engine
        .list_installed()
        .await
        .unwrap()
        .contains(&"web".to_string()));
    let record = engine.progress("web").unwrap();
    assert_eq!(record.status, DownloadStatus::Failed);

    let err = engine.read("web", &[]).await.unwrap_err();
    assert!(matches!(err, EngineError::ModuleUnavailable(_)));
}

#[tokio::test]
async fn install_failure_reports_failed_and_skips_manifest() {
    let server = MockServer::start().await;
    // Remote is up but kjv has no bundled asset: bundled acquisition fails.
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_at(dir.path(), &server.uri());

    let err = engine.install("kjv").await.unwrap_err();
    assert!(matches!(err, EngineError::ModuleUnavailable(_)));
    let record = engine.progress("kjv").unwrap();
    assert_eq!(record.status, DownloadStatus::Failed);
}
