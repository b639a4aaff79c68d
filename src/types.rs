//! Core types shared across the catalog.

use std::collections::BTreeMap;

/// NodeID: hex-encoded BLAKE3 fingerprint of a node's attributes
pub type NodeID = String;

/// Locale code such as `en` or `ru`
pub type Locale = String;

/// Per-locale value map. Ordered so serialized output is canonical.
pub type LocaleMap<T> = BTreeMap<Locale, T>;
