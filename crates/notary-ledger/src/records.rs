use serde::{Deserialize, Serialize};

use notary_types::{LedgerTimestamp, TxId};

/// One version of a key as recorded by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyModification {
    pub tx_id: TxId,
    /// `None` for deletions.
    pub value: Option<Vec<u8>>,
    pub timestamp: LedgerTimestamp,
    pub is_delete: bool,
}

/// A single mutation inside a [`WriteBatch`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteOp {
    Put(Vec<u8>),
    Delete,
}

/// An ordered group of mutations committed under one transaction id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteBatch {
    pub tx_id: TxId,
    pub ops: Vec<(String, WriteOp)>,
}

impl WriteBatch {
    pub fn new(tx_id: TxId) -> Self {
        Self {
            tx_id,
            ops: Vec::new(),
        }
    }

    pub fn put(mut self, key: impl Into<String>, value: Vec<u8>) -> Self {
        self.ops.push((key.into(), WriteOp::Put(value)));
        self
    }

    pub fn delete(mut self, key: impl Into<String>) -> Self {
        self.ops.push((key.into(), WriteOp::Delete));
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Keys touched by this batch, in op order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().map(|(k, _)| k.as_str())
    }
}
