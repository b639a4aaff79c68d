//! Sitemap built from the stored node records

use super::ArtifactOutcome;
use crate::changes::ChangeSet;
use crate::config::CatalogConfig;
use crate::error::ArtifactError;
use crate::store::{keys, put_as, KeyValueStore, RangeOptions, Record};
use crate::tree::node::{ChangeFreq, Search};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::Write;
use tracing::{info, warn};

pub const SITEMAP_XMLNS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapEntry {
    pub loc: String,
    pub changefreq: ChangeFreq,
    pub priority: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlsetAttributes {
    pub xmlns: String,
}

/// Sitemap document, stored as JSON and rendered as `<urlset>` XML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sitemap {
    #[serde(rename = "@")]
    pub attributes: UrlsetAttributes,
    pub url: Vec<SitemapEntry>,
}

impl Sitemap {
    pub fn new(entries: Vec<SitemapEntry>) -> Self {
        Self {
            attributes: UrlsetAttributes {
                xmlns: SITEMAP_XMLNS.to_string(),
            },
            url: entries,
        }
    }

    pub fn to_xml(&self) -> Result<String, ArtifactError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;
        writer
            .write_event(Event::Start(
                BytesStart::new("urlset").with_attributes([("xmlns", self.attributes.xmlns.as_str())]),
            ))
            .map_err(xml_error)?;
        for entry in &self.url {
            writer
                .write_event(Event::Start(BytesStart::new("url")))
                .map_err(xml_error)?;
            write_text_element(&mut writer, "loc", &entry.loc)?;
            write_text_element(&mut writer, "changefreq", entry.changefreq.as_str())?;
            write_text_element(&mut writer, "priority", &entry.priority.to_string())?;
            writer
                .write_event(Event::End(BytesEnd::new("url")))
                .map_err(xml_error)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("urlset")))
            .map_err(xml_error)?;

        String::from_utf8(writer.into_inner()).map_err(xml_error)
    }
}

fn xml_error(err: impl Display) -> ArtifactError {
    ArtifactError::Xml(err.to_string())
}

fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), ArtifactError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)?;
    Ok(())
}

/// `//host`, `http://` and `https://` URLs point outside the site
fn is_absolute(url: &str) -> bool {
    let rest = url
        .strip_prefix("https:")
        .or_else(|| url.strip_prefix("http:"))
        .unwrap_or(url);
    rest.starts_with("//")
}

fn sitemap_candidate(record: &Record) -> Option<(&str, &Map<String, Value>)> {
    if !record.key.starts_with(keys::NODE_PREFIX) {
        return None;
    }
    let hidden = record.value.get("hidden")?.as_object()?;
    let url = record.value.get("url")?.as_str()?;
    if is_absolute(url) {
        return None;
    }
    Some((url, hidden))
}

/// One entry per node URL and host locale the node is visible in
pub fn collect_entries(
    store: &dyn KeyValueStore,
    hosts: &BTreeMap<String, String>,
) -> Result<Vec<SitemapEntry>, ArtifactError> {
    let records = store.get_by_criteria(
        &|record| sitemap_candidate(record).is_some(),
        &RangeOptions::between(keys::NODE_PREFIX, keys::PEOPLE_PREFIX),
    )?;

    let mut entries = Vec::new();
    for record in &records {
        let Some((url, hidden)) = sitemap_candidate(record) else {
            continue;
        };
        let search = Search::from_raw(record.value.get("search"));
        for (locale, host) in hosts {
            let is_hidden = hidden.get(locale).and_then(Value::as_bool).unwrap_or(false);
            if !is_hidden {
                entries.push(SitemapEntry {
                    loc: format!("{}{}", host, url),
                    changefreq: search.changefreq,
                    priority: search.priority,
                });
            }
        }
    }
    Ok(entries)
}

/// Build the sitemap and store it under `sitemapJson` and `sitemapXml`.
///
/// Skipped when nothing changed (unless in development mode) or when no
/// hosts are configured.
pub fn build_sitemap(
    store: &dyn KeyValueStore,
    changes: &ChangeSet,
    config: &CatalogConfig,
) -> Result<ArtifactOutcome, ArtifactError> {
    info!("Building sitemap");
    if !changes.should_rebuild(config.development) {
        warn!("No changes were made during this synchronization, sitemap is left as is");
        return Ok(ArtifactOutcome::SkippedNoChanges);
    }
    if config.hosts.is_empty() {
        warn!("No hosts are configured, sitemap is not built");
        return Ok(ArtifactOutcome::SkippedNoHosts);
    }

    let sitemap = Sitemap::new(collect_entries(store, &config.hosts)?);
    let xml = sitemap.to_xml()?;
    put_as(store, keys::SITEMAP_JSON, &sitemap)?;
    store.put(keys::SITEMAP_XML, &Value::String(xml))?;

    info!(entries = sitemap.url.len(), "Sitemap was built");
    Ok(ArtifactOutcome::Built {
        entries: sitemap.url.len(),
    })
}
