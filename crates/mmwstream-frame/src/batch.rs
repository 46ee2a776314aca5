use crate::error::{FrameError, Result};

/// A batch read that stopped on an error.
///
/// Carries the items collected before the failure so they are not lost.
#[derive(Debug, thiserror::Error)]
#[error("batch stopped after {} item(s): {source}", .collected.len())]
pub struct BatchError<T> {
    /// Items read successfully before the error.
    pub collected: Vec<T>,
    /// The error that ended the batch.
    pub source: FrameError,
}

impl<T> BatchError<T> {
    /// Split into the collected items and the error.
    pub fn into_parts(self) -> (Vec<T>, FrameError) {
        (self.collected, self.source)
    }
}

/// Outcome of a batch read: all collected items, or the items plus the error.
pub type BatchResult<T> = std::result::Result<Vec<T>, BatchError<T>>;

/// Call `next` up to `limit` times.
///
/// `Ok(None)` (timeout) ends the batch successfully with what was collected.
/// An error ends it with [`BatchError`].
pub(crate) fn collect_batch<T>(
    limit: usize,
    mut next: impl FnMut() -> Result<Option<T>>,
) -> BatchResult<T> {
    let mut collected = Vec::with_capacity(limit.min(64));

    for _ in 0..limit {
        match next() {
            Ok(Some(item)) => collected.push(item),
            Ok(None) => break,
            Err(source) => return Err(BatchError { collected, source }),
        }
    }

    Ok(collected)
}
