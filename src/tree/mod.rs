//! Catalog node tree: identity, routes, construction and persistence

pub mod builder;
pub mod hasher;
pub mod library;
pub mod node;
pub mod persist;
pub mod route;
pub mod variant;

pub use builder::{build_node, NodeTree};
pub use node::{Node, NodeKind};
pub use persist::{document_key, persist, DocumentRecord, PersistedNodeRecord, RepoRef};
pub use route::Route;
