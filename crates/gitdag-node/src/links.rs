use std::collections::HashSet;

use gitdag_types::ObjectHash;
use tracing::trace;

use crate::node::{FieldValue, GitNode};

/// Every object of this repository that `node` references.
///
/// Walks [`GitNode::fields`] in order and keeps each [`FieldValue::Link`]
/// once. Submodule gitlinks point into other repositories and are skipped.
pub fn extract_links(node: &GitNode) -> Vec<ObjectHash> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for (key, value) in node.fields() {
        if let FieldValue::Link(hash) = value {
            if seen.insert(hash) {
                trace!(key = %key, link = %hash.short_hex(), "found link");
                links.push(hash);
            }
        }
    }
    links
}
