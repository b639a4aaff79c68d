//! Catalog: route-resolved content trees and incremental document sync
//!
//! Builds a hierarchical content catalog from a declarative model, gives each
//! node a content-derived id and a URL resolved from inherited route patterns,
//! and keeps the documents behind leaf nodes in sync with their repositories.
//! Changes collected during a run gate the rebuild of the URL index and the
//! sitemap.

pub mod changes;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod remote;
pub mod render;
pub mod store;
pub mod target;
pub mod tasks;
pub mod tree;
pub mod types;
