//! Ephemeral preview resources for newly selected files.
//!
//! Every handle minted here belongs to exactly one new entry and is freed
//! exactly once. The handle type is neither `Clone` nor `Copy`, so the only
//! way to free it is to move it out of its entry and back into the tracker.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::media::{generate_thumbnail, is_image_like, ThumbnailImage, ThumbnailOptions};
use crate::models::{AttachmentEntry, EntrySource, LocalFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PreviewId(u64);

impl PreviewId {
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PreviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "preview-{}", self.0)
    }
}

/// A live local preview owned by one new entry.
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewHandle {
    id: PreviewId,
    uri: String,
}

impl PreviewHandle {
    pub const fn id(&self) -> PreviewId {
        self.id
    }

    /// URI the UI can render while the preview is live.
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

/// Backend that creates and frees the actual preview resource.
pub trait PreviewAllocator {
    /// Create the resource for `file` and return a URI for it, or `None` when
    /// no preview can be produced.
    fn allocate(&mut self, id: PreviewId, file: &LocalFile) -> Option<String>;

    /// Free the resource. Called exactly once per successful `allocate`.
    fn release(&mut self, id: PreviewId);
}

/// Mints handles, hands them to entries, and takes them back.
#[derive(Debug)]
pub struct PreviewResourceTracker<A> {
    allocator: A,
    next_id: u64,
    live: BTreeSet<PreviewId>,
    allocated: usize,
    released: usize,
}

impl<A: PreviewAllocator> PreviewResourceTracker<A> {
    pub const fn new(allocator: A) -> Self {
        Self {
            allocator,
            next_id: 1,
            live: BTreeSet::new(),
            allocated: 0,
            released: 0,
        }
    }

    /// Attach a preview to a new, image-like entry that has none yet.
    ///
    /// Returns whether a handle was stored.
    pub fn allocate(&mut self, entry: &mut AttachmentEntry) -> bool {
        if !is_image_like(entry.mime_type()) {
            return false;
        }
        let entry_id = entry.id();
        let EntrySource::New { file, preview } = &mut entry.source else {
            return false;
        };
        if preview.is_some() {
            return false;
        }

        let id = PreviewId(self.next_id);
        self.next_id += 1;

        let Some(uri) = self.allocator.allocate(id, file) else {
            return false;
        };

        self.live.insert(id);
        self.allocated += 1;
        tracing::debug!(entry_id = %entry_id, preview = %id, "Allocated attachment preview");
        *preview = Some(PreviewHandle { id, uri });
        true
    }

    /// Free and clear the entry's preview. A no-op when it has none.
    pub fn release(&mut self, entry: &mut AttachmentEntry) -> bool {
        let entry_id = entry.id();
        let EntrySource::New { preview, .. } = &mut entry.source else {
            return false;
        };
        let Some(handle) = preview.take() else {
            return false;
        };

        tracing::debug!(entry_id = %entry_id, preview = %handle.id, "Releasing attachment preview");
        self.release_handle(handle);
        true
    }

    fn release_handle(&mut self, handle: PreviewHandle) {
        if self.live.remove(&handle.id) {
            self.allocator.release(handle.id);
            self.released += 1;
        } else {
            tracing::error!(preview = %handle.id, "Preview handle was not issued by this tracker");
        }
    }

    /// Handles currently held by entries.
    pub fn outstanding(&self) -> usize {
        self.live.len()
    }

    pub const fn allocated_count(&self) -> usize {
        self.allocated
    }

    pub const fn released_count(&self) -> usize {
        self.released
    }

    pub const fn allocator(&self) -> &A {
        &self.allocator
    }
}

/// Renders JPEG thumbnails in memory and serves them as `data:` URIs.
#[derive(Debug, Default)]
pub struct ThumbnailPreviews {
    options: ThumbnailOptions,
    thumbnails: HashMap<PreviewId, ThumbnailImage>,
}

impl ThumbnailPreviews {
    pub fn new(options: ThumbnailOptions) -> Self {
        Self {
            options,
            thumbnails: HashMap::new(),
        }
    }

    pub fn thumbnail(&self, id: PreviewId) -> Option<&ThumbnailImage> {
        self.thumbnails.get(&id)
    }

    /// Thumbnails currently held in memory.
    pub fn len(&self) -> usize {
        self.thumbnails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thumbnails.is_empty()
    }
}

impl PreviewAllocator for ThumbnailPreviews {
    fn allocate(&mut self, id: PreviewId, file: &LocalFile) -> Option<String> {
        match generate_thumbnail(file.bytes(), self.options) {
            Ok(thumbnail) => {
                let uri = thumbnail.data_uri();
                self.thumbnails.insert(id, thumbnail);
                Some(uri)
            }
            Err(error) => {
                tracing::warn!(file = file.name(), "Skipping preview: {error}");
                None
            }
        }
    }

    fn release(&mut self, id: PreviewId) {
        self.thumbnails.remove(&id);
    }
}
