//! Snapshot materialization seam.
//!
//! The sync core treats operations as opaque bytes; decoding them into a
//! document is the job of a CRDT module behind the narrow [`Materializer`]
//! capability. The core only needs to open a snapshot, fold changes into
//! it, and serialize the result.

use codoc_types::Change;
use thiserror::Error;

/// Errors from materializing a document.
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// The snapshot bytes do not decode.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// An operation payload does not apply to the document.
    #[error("malformed operation: {0}")]
    MalformedOperation(String),
}

/// Opens documents from snapshot bytes.
///
/// Implementations wrap a concrete CRDT. `open(&[])` must yield the empty
/// initial document, the state of every document at server sequence zero.
pub trait Materializer: Send + Sync {
    /// Opens a document from a snapshot.
    fn open(&self, snapshot: &[u8]) -> Result<Box<dyn MaterializedDoc>, MaterializeError>;
}

/// An in-memory document being rebuilt from the change log.
pub trait MaterializedDoc: Send {
    /// Folds one change into the document.
    fn apply(&mut self, change: &Change) -> Result<(), MaterializeError>;

    /// Serializes the document into self-contained snapshot bytes.
    fn serialize(&self) -> Result<Vec<u8>, MaterializeError>;
}

/// Reference materializer whose document state is the ordered log of
/// applied operation payloads.
///
/// Applying the same changes in the same order always serializes to the
/// same bytes, which is exactly what the snapshot-equivalence guarantees
/// need; real deployments substitute their CRDT here.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpLogMaterializer;

impl OpLogMaterializer {
    /// Creates the materializer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Materializer for OpLogMaterializer {
    fn open(&self, snapshot: &[u8]) -> Result<Box<dyn MaterializedDoc>, MaterializeError> {
        let ops: Vec<Vec<u8>> = if snapshot.is_empty() {
            Vec::new()
        } else {
            serde_json::from_slice(snapshot)
                .map_err(|err| MaterializeError::MalformedSnapshot(err.to_string()))?
        };
        Ok(Box::new(OpLogDoc { ops }))
    }
}

struct OpLogDoc {
    ops: Vec<Vec<u8>>,
}

impl MaterializedDoc for OpLogDoc {
    fn apply(&mut self, change: &Change) -> Result<(), MaterializeError> {
        self.ops.extend(change.operations.iter().cloned());
        Ok(())
    }

    fn serialize(&self) -> Result<Vec<u8>, MaterializeError> {
        serde_json::to_vec(&self.ops)
            .map_err(|err| MaterializeError::MalformedSnapshot(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codoc_types::{ActorId, ChangeId};

    fn change(ops: Vec<Vec<u8>>) -> Change {
        Change::new(ChangeId::new(1, 1, ActorId::random()), None, ops)
    }

    #[test]
    fn empty_snapshot_opens_the_initial_document() {
        let materializer = OpLogMaterializer::new();
        let doc = materializer.open(&[]).unwrap();
        let bytes = doc.serialize().unwrap();
        assert_eq!(bytes, b"[]");
    }

    #[test]
    fn apply_then_reopen_roundtrip() {
        let materializer = OpLogMaterializer::new();

        let mut doc = materializer.open(&[]).unwrap();
        doc.apply(&change(vec![vec![1], vec![2]])).unwrap();
        doc.apply(&change(vec![vec![3]])).unwrap();
        let bytes = doc.serialize().unwrap();

        let reopened = materializer.open(&bytes).unwrap();
        assert_eq!(reopened.serialize().unwrap(), bytes);
    }

    #[test]
    fn application_order_is_visible_in_the_bytes() {
        let materializer = OpLogMaterializer::new();

        let mut forward = materializer.open(&[]).unwrap();
        forward.apply(&change(vec![vec![1]])).unwrap();
        forward.apply(&change(vec![vec![2]])).unwrap();

        let mut reversed = materializer.open(&[]).unwrap();
        reversed.apply(&change(vec![vec![2]])).unwrap();
        reversed.apply(&change(vec![vec![1]])).unwrap();

        assert_ne!(
            forward.serialize().unwrap(),
            reversed.serialize().unwrap()
        );
    }

    #[test]
    fn garbage_snapshot_is_rejected() {
        let materializer = OpLogMaterializer::new();
        assert!(matches!(
            materializer.open(b"not json"),
            Err(MaterializeError::MalformedSnapshot(_))
        ));
    }
}
