//! Library descriptors whose blocks become catalog nodes

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// One version of a library, as attached to a model node under `lib`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryVersion {
    pub repo: String,
    #[serde(rename = "ref")]
    pub reference: String,
    /// Built with the enb layout: examples live under one prefix per version
    #[serde(default)]
    pub enb: bool,
    #[serde(default)]
    pub levels: Vec<LibraryLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryLevel {
    pub name: String,
    #[serde(default)]
    pub blocks: Vec<LibraryBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryBlock {
    pub name: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub jsdoc: Value,
}

impl LibraryVersion {
    /// Version as used in URLs: branch separators become dashes
    pub fn url_version(&self) -> String {
        self.reference.replace('/', "-")
    }

    pub fn example_prefix(&self, level: &LibraryLevel, block: &LibraryBlock) -> String {
        if self.enb {
            format!("/__example/{}/{}", self.repo, self.reference)
        } else {
            format!(
                "/__example/{}/{}/{}.sets/{}",
                self.repo, self.reference, level.name, block.name
            )
        }
    }

    /// Raw model record for one block, fed through the regular node builder
    pub fn block_record(&self, level: &LibraryLevel, block: &LibraryBlock) -> Map<String, Value> {
        let record = json!({
            "title": block.name,
            "source": {
                "data": block.data,
                "jsdoc": block.jsdoc,
                "enb": self.enb,
                "prefix": self.example_prefix(level, block),
            },
            "route": {
                "conditions": {
                    "lib": self.repo,
                    "version": self.url_version(),
                    "level": level.name,
                    "block": block.name,
                }
            }
        });
        match record {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}
