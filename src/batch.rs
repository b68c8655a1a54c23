use serde::Serialize;

use crate::aggregate::DownloadItem;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Batch {
    pub ids: Vec<String>,
    pub bytes: u64,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Greedy left-to-right packing under `max_batch_bytes`.
///
/// A batch is closed as soon as the next item would push it over the
/// ceiling. Items are never split, so an item larger than the ceiling ends up
/// alone in its own batch.
pub fn pack(items: &[DownloadItem], max_batch_bytes: u64) -> Vec<Batch> {
    let mut batches = Vec::new();
    let mut current = Batch {
        ids: Vec::new(),
        bytes: 0,
    };

    for item in items {
        if !current.is_empty() && current.bytes.saturating_add(item.size) > max_batch_bytes {
            batches.push(std::mem::replace(
                &mut current,
                Batch {
                    ids: Vec::new(),
                    bytes: 0,
                },
            ));
        }
        current.ids.push(item.id.clone());
        current.bytes = current.bytes.saturating_add(item.size);
    }

    if !current.is_empty() {
        batches.push(current);
    }
    batches
}
