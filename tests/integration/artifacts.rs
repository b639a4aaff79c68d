use std::sync::Arc;

use catalog::changes::{ChangeCategory, ChangeEntry, ChangeSet};
use catalog::config::CatalogConfig;
use catalog::render::MarkdownRenderer;
use catalog::store::{keys, KeyValueStore, MemoryStore};
use catalog::target::{Target, TargetKind};
use catalog::tasks::sitemap::{Sitemap, SITEMAP_XMLNS};
use catalog::tasks::{build_sitemap, build_url_index, ArtifactOutcome};
use serde_json::{json, Value};

use crate::integration::support::{blob_url, config, stored_document, Scripted, ScriptedSource};

fn hosted_config() -> CatalogConfig {
    let mut config = config();
    config.hosts.insert("en".to_string(), "https://x".to_string());
    config
}

fn changed() -> ChangeSet {
    let changes = ChangeSet::new();
    changes.add_added(ChangeCategory::Nodes, ChangeEntry::new(Some("Foo"), Some("/foo")));
    changes
}

fn sitemap_store() -> MemoryStore {
    MemoryStore::new()
        .with_record(
            "nodes:foo",
            json!({"url": "/foo", "hidden": {"en": false, "ru": true}}),
        )
        .with_record(
            "nodes:bar",
            json!({"url": "/bar", "hidden": {"en": true, "ru": true}}),
        )
}

#[test]
fn sitemap_lists_only_locales_a_node_is_visible_in() {
    let store = sitemap_store();

    let outcome = build_sitemap(&store, &changed(), &hosted_config()).unwrap();
    assert_eq!(outcome, ArtifactOutcome::Built { entries: 1 });

    let sitemap: Sitemap =
        serde_json::from_value(store.get(keys::SITEMAP_JSON).unwrap().unwrap()).unwrap();
    assert_eq!(sitemap.attributes.xmlns, SITEMAP_XMLNS);
    assert_eq!(sitemap.url.len(), 1);
    assert_eq!(sitemap.url[0].loc, "https://x/foo");
    assert_eq!(sitemap.url[0].priority, 0.5);

    let xml = store.get(keys::SITEMAP_XML).unwrap().unwrap();
    let xml = xml.as_str().unwrap();
    assert!(xml.contains("<loc>https://x/foo</loc>"));
    assert!(!xml.contains("/bar"));
}

#[test]
fn artifacts_are_left_alone_when_nothing_changed() {
    let store = sitemap_store();
    let changes = ChangeSet::new();

    assert_eq!(
        build_sitemap(&store, &changes, &hosted_config()).unwrap(),
        ArtifactOutcome::SkippedNoChanges
    );
    assert_eq!(
        build_url_index(&store, &changes, false).unwrap(),
        ArtifactOutcome::SkippedNoChanges
    );
    assert_eq!(store.write_count(), 0);
    assert!(store.get(keys::SITEMAP_JSON).unwrap().is_none());
}

#[test]
fn development_mode_rebuilds_without_changes() {
    let store = sitemap_store();
    let mut config = hosted_config();
    config.development = true;

    assert!(build_sitemap(&store, &ChangeSet::new(), &config)
        .unwrap()
        .is_built());
    assert_eq!(
        build_url_index(&store, &ChangeSet::new(), config.development).unwrap(),
        ArtifactOutcome::Built { entries: 2 }
    );
}

#[test]
fn sitemap_needs_hosts() {
    let store = sitemap_store();
    assert_eq!(
        build_sitemap(&store, &changed(), &config()).unwrap(),
        ArtifactOutcome::SkippedNoHosts
    );
    assert_eq!(store.write_count(), 0);
}

#[test]
fn url_index_maps_every_node_url() {
    let store = sitemap_store()
        .with_record("nodes:plain", json!({"title": "No url"}))
        .with_record("urls:/stale", json!("nodes:gone"));

    build_url_index(&store, &changed(), false).unwrap();
    assert_eq!(store.get("urls:/foo").unwrap(), Some(json!("nodes:foo")));
    assert_eq!(store.get("urls:/bar").unwrap(), Some(json!("nodes:bar")));
    assert!(store.get("urls:/stale").unwrap().is_none());
    let url_keys: Vec<String> = store
        .keys()
        .into_iter()
        .filter(|k| k.starts_with(keys::URL_PREFIX))
        .collect();
    assert_eq!(url_keys.len(), 2);
}

fn site_model() -> Value {
    json!({
        "title": "Home",
        "route": {"name": "page", "pattern": "/<id>/", "conditions": {"id": "index"}},
        "items": [{
            "title": {"en": "Intro", "ru": "Введение"},
            "route": "intro",
            "source": {"en": {"content": blob_url("master", "intro.md")}}
        }]
    })
}

#[tokio::test]
async fn full_run_builds_nodes_documents_and_artifacts() {
    let store = Arc::new(MemoryStore::new());
    let config = Arc::new(hosted_config());
    let source = Arc::new(
        ScriptedSource::new().with_file("intro.md", Scripted::markdown("abc123", "e1", "# Intro\n")),
    );
    let model = site_model();

    let target = Target::new(Arc::clone(&config), store.clone());
    let report = target
        .execute(
            TargetKind::All,
            Some(&model),
            source.clone(),
            Arc::new(MarkdownRenderer::new()),
        )
        .await
        .unwrap();

    let nodes = report.nodes.unwrap();
    assert_eq!(nodes.nodes, 2);
    assert_eq!(nodes.added, 2);
    assert_eq!(nodes.documents, 1);
    assert_eq!(report.docs.unwrap().added, 1);
    assert_eq!(report.url_index, Some(ArtifactOutcome::Built { entries: 2 }));
    assert_eq!(report.sitemap, Some(ArtifactOutcome::Built { entries: 2 }));

    let intro_key = store.get("urls:/intro/").unwrap().unwrap();
    let intro = store.get(intro_key.as_str().unwrap()).unwrap().unwrap();
    let doc_key = intro["source"]["en"]["content"].as_str().unwrap();
    assert!(doc_key.starts_with(keys::DOCS_PREFIX));
    let doc = stored_document(&store, doc_key);
    assert_eq!(doc.sha.as_deref(), Some("abc123"));
    assert_eq!(doc.title.as_deref(), Some("Intro"));
    assert!(doc.content.unwrap().contains("<h1>Intro</h1>"));

    // Nothing new upstream: the docs target changes nothing and skips artifacts
    let rerun = Target::new(Arc::clone(&config), store.clone());
    let writes = store.write_count();
    let report = rerun
        .execute(
            TargetKind::Docs,
            None,
            source.clone(),
            Arc::new(MarkdownRenderer::new()),
        )
        .await
        .unwrap();
    assert_eq!(report.docs.unwrap().not_modified, 1);
    assert_eq!(report.url_index, Some(ArtifactOutcome::SkippedNoChanges));
    assert_eq!(report.sitemap, Some(ArtifactOutcome::SkippedNoChanges));
    assert_eq!(store.write_count(), writes);
}

#[tokio::test]
async fn nodes_target_requires_a_model() {
    let store = Arc::new(MemoryStore::new());
    let target = Target::new(Arc::new(config()), store.clone());
    let result = target
        .execute(
            TargetKind::Nodes,
            None,
            Arc::new(ScriptedSource::new()),
            Arc::new(MarkdownRenderer::new()),
        )
        .await;
    assert!(result.is_err());
    assert_eq!(store.write_count(), 0);
}
