//! Integration tests for tree building, document sync and derived artifacts

mod artifacts;
pub mod support;
mod tree_building;
