use crate::clinical::ImageUpload;
use log::debug;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct BlobLedger {
    next_id: u64,
    live: HashSet<u64>,
    released: usize,
}

/// Poison is ignored: every ledger update completes under a single guard.
fn lock(ledger: &Mutex<BlobLedger>) -> MutexGuard<'_, BlobLedger> {
    ledger.lock().unwrap_or_else(PoisonError::into_inner)
}

impl BlobLedger {
    fn release(&mut self, id: u64) {
        if self.live.remove(&id) {
            self.released += 1;
        }
    }
}

/// Tracks the image resource handles held by analysis views.
#[derive(Debug, Clone, Default)]
pub struct BlobRegistry {
    ledger: Arc<Mutex<BlobLedger>>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a handle for the upload; it is released when the handle drops.
    pub fn acquire(&self, upload: ImageUpload) -> ImageHandle {
        let id = {
            let mut ledger = lock(&self.ledger);
            ledger.next_id += 1;
            let id = ledger.next_id;
            ledger.live.insert(id);
            id
        };
        debug!("acquired image handle #{} for {}", id, upload.file_name);
        ImageHandle {
            id,
            upload,
            ledger: self.ledger.clone(),
        }
    }

    pub fn live_count(&self) -> usize {
        lock(&self.ledger).live.len()
    }

    pub fn released_count(&self) -> usize {
        lock(&self.ledger).released
    }
}

/// Exclusive handle on an uploaded image for one analysis view.
#[derive(Debug)]
pub struct ImageHandle {
    id: u64,
    upload: ImageUpload,
    ledger: Arc<Mutex<BlobLedger>>,
}

impl ImageHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn upload(&self) -> &ImageUpload {
        &self.upload
    }
}

impl Drop for ImageHandle {
    fn drop(&mut self) {
        lock(&self.ledger).release(self.id);
        debug!("released image handle #{}", self.id);
    }
}
