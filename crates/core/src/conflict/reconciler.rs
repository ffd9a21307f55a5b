//! Hash-aware intersection of the local and remote change sets.
//!
//! A file touched on both sides is a potential conflict unless both sides
//! ended up with the same blob. A missing hash on either side (a local
//! deletion, or GitHub omitting the SHA) can never prove convergence, so it
//! always counts as a conflict.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::models::ChangeSet;

/// Filenames changed on both sides with different (or unknown) content, in
/// remote order, without duplicates.
pub fn reconcile(local: &ChangeSet, remote: &ChangeSet) -> Vec<String> {
    info!(
        local_count = local.len(),
        remote_count = remote.len(),
        "reconciling change sets"
    );

    let local_shas = local.sha_lookup();
    let mut seen = HashSet::new();
    let mut conflicts = Vec::new();

    for change in remote {
        let Some(local_sha) = local_shas.get(change.filename.as_str()) else {
            continue;
        };

        match (local_sha, change.sha.as_deref()) {
            (Some(l), Some(r)) if *l == r => {
                debug!(path = %change.filename, "identical change on both sides");
            }
            _ => {
                if seen.insert(change.filename.as_str()) {
                    debug!(path = %change.filename, "potential conflict");
                    conflicts.push(change.filename.clone());
                }
            }
        }
    }

    info!(count = conflicts.len(), "reconciliation complete");
    conflicts
}
