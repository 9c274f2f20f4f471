//! Submit-time change-set derivation.

use std::collections::HashSet;

use super::preview::PreviewAllocator;
use super::registry::AttachmentRegistry;
use crate::models::LocalFile;

/// What the submission collaborator must apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Files of every new entry, in registry order.
    pub files_to_upload: Vec<LocalFile>,
    /// Server ids of existing entries pending deletion.
    pub ids_to_delete: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.files_to_upload.is_empty() && self.ids_to_delete.is_empty()
    }
}

/// Read the registry and build the change-set. Never mutates.
pub fn assemble<A: PreviewAllocator>(registry: &AttachmentRegistry<A>) -> ChangeSet {
    let mut change_set = ChangeSet::default();
    let mut seen = HashSet::new();

    for entry in registry.entries() {
        if let Some(file) = entry.local_file() {
            change_set.files_to_upload.push(file.clone());
        } else if let Some(server_id) = entry.server_id() {
            if entry.is_marked_for_deletion() && seen.insert(server_id) {
                change_set.ids_to_delete.push(server_id.to_string());
            }
        }
    }

    change_set
}
