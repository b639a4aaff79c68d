use catalog::changes::{ChangeCategory, ChangeSet};
use catalog::store::{keys, KeyValueStore, MemoryStore};
use catalog::tasks::persist_tree;
use catalog::tree::node::{NodeClass, NodeType, View};
use catalog::tree::{DocumentRecord, NodeKind, NodeTree, PersistedNodeRecord};
use serde_json::{json, Value};

use crate::integration::support::{blob_url, config};

fn docs_model(root_pattern: &str) -> Value {
    json!({
        "title": "Home",
        "route": {"name": "page", "pattern": root_pattern, "conditions": {"id": "index"}},
        "items": [{
            "title": {"en": "Guide", "ru": "Руководство"},
            "route": "guide",
            "hidden": {"ru": true},
            "source": {"en": {"content": blob_url("master", "guide.md")}}
        }]
    })
}

#[test]
fn child_routes_extend_inherited_conditions() {
    let model = json!({
        "title": "Docs",
        "route": {"name": "docs", "pattern": "/<section>(/<page>)/", "conditions": {"section": "docs"}},
        "items": [{
            "title": "Page",
            "route": {"conditions": {"page": "a"}},
            "items": [{"title": "Mirror", "url": "https://mirror.example/a"}]
        }]
    });
    let tree = NodeTree::build(&model, &config()).unwrap();
    let nodes: Vec<_> = tree.iter().collect();

    assert_eq!(nodes[0].url.as_deref(), Some("/docs/"));
    assert_eq!(nodes[1].url.as_deref(), Some("/docs/a/"));
    for (key, value) in &nodes[0].route.conditions {
        assert_eq!(nodes[1].route.conditions.get(key), Some(value));
    }
    assert_eq!(nodes[1].route.conditions.get("page"), Some(&json!("a")));
    assert_eq!(nodes[1].route.name, nodes[0].route.name);

    // No own route: the parent's route is carried as is and the raw url kept
    assert_eq!(nodes[2].route, nodes[1].route);
    assert_eq!(nodes[2].url.as_deref(), Some("https://mirror.example/a"));
}

#[test]
fn selectors_and_groups_do_not_add_a_level() {
    let model = json!({
        "title": "Root",
        "route": {"name": "page", "pattern": "/<id>/", "conditions": {"id": "root"}},
        "items": [{
            "title": "Pick one",
            "type": "select",
            "items": [{
                "title": "Option",
                "route": "option",
                "items": [{
                    "title": "Group",
                    "type": "group",
                    "items": [{"title": "Leaf", "route": "leaf"}]
                }]
            }]
        }]
    });
    let tree = NodeTree::build(&model, &config()).unwrap();
    let summary: Vec<(&str, NodeKind, u32)> = tree
        .iter()
        .map(|n| (n.title_in("en"), n.kind, n.level))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Root", NodeKind::Leaf, 0),
            ("Pick one", NodeKind::Selector, 1),
            ("Option", NodeKind::Leaf, 1),
            ("Group", NodeKind::Container, 2),
            ("Leaf", NodeKind::Leaf, 2),
        ]
    );
    let leaf = tree.iter().last().unwrap();
    let crumbs: Vec<&str> = leaf.breadcrumbs.iter().map(|b| b.url.as_str()).collect();
    assert_eq!(crumbs, vec!["/root/", "/option/", "/leaf/"]);
}

#[test]
fn locale_fields_cover_every_language() {
    let tree = NodeTree::build(&docs_model("/<id>/"), &config()).unwrap();
    for node in tree.iter() {
        for locale in ["en", "ru"] {
            assert!(node.title.contains_key(locale));
            assert!(node.hidden.contains_key(locale));
        }
    }
    let guide = tree.iter().nth(1).unwrap();
    assert_eq!(guide.title_in("ru"), "Руководство");
    assert!(guide.is_hidden_in("ru"));
    assert!(!guide.is_hidden_in("en"));
    assert_eq!(guide.view, View::Post);
    assert_eq!(guide.class, NodeClass::Base);
    assert_eq!(guide.node_type(), NodeType::Simple);
    assert!(guide.meta.is_empty());
}

#[test]
fn ids_are_stable_and_content_derived() {
    let a = NodeTree::build(&docs_model("/<id>/"), &config()).unwrap();
    let b = NodeTree::build(&docs_model("/<id>/"), &config()).unwrap();
    let ids_a: Vec<&str> = a.iter().map(|n| n.id.as_str()).collect();
    let ids_b: Vec<&str> = b.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids_a, ids_b);

    let c = NodeTree::build(&docs_model("/pages/<id>/"), &config()).unwrap();
    let ids_c: Vec<&str> = c.iter().map(|n| n.id.as_str()).collect();
    assert_ne!(ids_a[0], ids_c[0]);
    // The child's own attributes did not change
    assert_eq!(ids_a[1], ids_c[1]);
}

#[test]
fn persisting_creates_node_and_document_records() {
    let store = MemoryStore::new();
    let changes = ChangeSet::new();
    let tree = NodeTree::build(&docs_model("/<id>/"), &config()).unwrap();

    let report = persist_tree(&tree, &store, &changes, &config()).unwrap();
    assert_eq!(report.nodes, 2);
    assert_eq!(report.added, 2);
    assert_eq!(report.documents, 1);
    assert_eq!(changes.category(ChangeCategory::Nodes).added.len(), 2);

    let guide = tree.iter().nth(1).unwrap();
    let record: PersistedNodeRecord = serde_json::from_value(
        store.get(&keys::node_key(&guide.id)).unwrap().unwrap(),
    )
    .unwrap();
    assert_eq!(record.parent.as_deref(), Some(tree.root().unwrap().id.as_str()));
    assert!(record.has_source);
    assert_eq!(record.url.as_deref(), Some("/guide/"));

    let doc_key = record.source.as_ref().unwrap()["en"]["content"]
        .as_str()
        .unwrap()
        .to_string();
    let doc: DocumentRecord =
        serde_json::from_value(store.get(&doc_key).unwrap().unwrap()).unwrap();
    assert_eq!(doc.title.as_deref(), Some("Guide"));
    assert_eq!(doc.content.as_deref(), Some(blob_url("master", "guide.md").as_str()));
    assert_eq!(doc.repo.unwrap().path, "guide.md");
}

#[test]
fn rerunning_persistence_keeps_document_sync_state() {
    let store = MemoryStore::new();
    let tree = NodeTree::build(&docs_model("/<id>/"), &config()).unwrap();
    persist_tree(&tree, &store, &ChangeSet::new(), &config()).unwrap();

    let doc_key = store
        .keys()
        .into_iter()
        .find(|k| k.starts_with(keys::DOCS_PREFIX))
        .unwrap();
    let mut doc: DocumentRecord =
        serde_json::from_value(store.get(&doc_key).unwrap().unwrap()).unwrap();
    doc.sha = Some("synced".to_string());
    doc.etag = Some("e1".to_string());
    store.put(&doc_key, &serde_json::to_value(&doc).unwrap()).unwrap();

    // Same model: nothing to write
    let writes = store.write_count();
    let changes = ChangeSet::new();
    let report = persist_tree(&tree, &store, &changes, &config()).unwrap();
    assert_eq!((report.added, report.modified, report.documents), (0, 0, 0));
    assert!(!changes.are_modified());
    assert_eq!(store.write_count(), writes);

    // New root pattern: a new root record, the unchanged child is modified
    let tree = NodeTree::build(&docs_model("/site/<id>/"), &config()).unwrap();
    let changes = ChangeSet::new();
    let report = persist_tree(&tree, &store, &changes, &config()).unwrap();
    assert_eq!((report.added, report.modified, report.documents), (1, 1, 0));
    let modified = changes.category(ChangeCategory::Nodes).modified;
    assert_eq!(modified[0].url.as_deref(), Some("/site/guide/"));

    let kept: DocumentRecord =
        serde_json::from_value(store.get(&doc_key).unwrap().unwrap()).unwrap();
    assert_eq!(kept.sha.as_deref(), Some("synced"));
    assert_eq!(kept.etag.as_deref(), Some("e1"));
}

#[test]
fn library_blocks_store_payloads_by_content() {
    let model = json!({
        "title": "Libraries",
        "route": {"name": "lib", "pattern": "/libs(/<lib>(/<version>(/<level>(/<block>))))/"},
        "items": [{
            "title": "bem-core",
            "route": {"conditions": {"lib": "bem-core"}},
            "lib": {
                "repo": "bem-core",
                "ref": "v2",
                "levels": [{"name": "desktop", "blocks": [{"name": "button", "data": {"deps": []}}]}]
            }
        }]
    });
    let store = MemoryStore::new();
    let tree = NodeTree::build(&model, &config()).unwrap();
    persist_tree(&tree, &store, &ChangeSet::new(), &config()).unwrap();

    let block = tree.iter().last().unwrap();
    assert_eq!(block.kind, NodeKind::LibraryBlock);
    let record = store.get(&keys::node_key(&block.id)).unwrap().unwrap();
    let data_key = record["source"]["data"].as_str().unwrap();
    assert!(data_key.starts_with(keys::BLOCKS_DATA_PREFIX));
    assert_eq!(store.get(data_key).unwrap(), Some(json!({"deps": []})));
    assert!(!store
        .keys()
        .iter()
        .any(|k| k.starts_with(keys::BLOCKS_JSDOC_PREFIX)));
    assert_eq!(record["class"], json!("block"));
    assert_eq!(record["url"], json!("/libs/bem-core/v2/desktop/button/"));
}

#[test]
fn renaming_a_page_keeps_its_document_record() {
    let store = MemoryStore::new();
    let tree = NodeTree::build(&docs_model("/<id>/"), &config()).unwrap();
    persist_tree(&tree, &store, &ChangeSet::new(), &config()).unwrap();

    let doc_key = catalog::tree::document_key(&blob_url("master", "guide.md")).unwrap();
    let mut doc: DocumentRecord =
        serde_json::from_value(store.get(&doc_key).unwrap().unwrap()).unwrap();
    doc.sha = Some("synced".to_string());
    store.put(&doc_key, &serde_json::to_value(&doc).unwrap()).unwrap();

    let mut model = docs_model("/<id>/");
    model["items"][0]["title"]["en"] = json!("User guide");
    let tree = NodeTree::build(&model, &config()).unwrap();
    let report = persist_tree(&tree, &store, &ChangeSet::new(), &config()).unwrap();
    assert_eq!(report.documents, 0);

    let docs: Vec<String> = store
        .keys()
        .into_iter()
        .filter(|k| k.starts_with(keys::DOCS_PREFIX))
        .collect();
    assert_eq!(docs, vec![doc_key.clone()]);
    let renamed: DocumentRecord =
        serde_json::from_value(store.get(&doc_key).unwrap().unwrap()).unwrap();
    assert_eq!(renamed.title.as_deref(), Some("User guide"));
    assert_eq!(renamed.sha.as_deref(), Some("synced"));
}
