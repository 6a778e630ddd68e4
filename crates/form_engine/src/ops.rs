//! Ordered queue of pending transaction operations.
//!
//! The queue keeps insertion order of first-seen keys and replaces in place
//! on collision, so the at-most-one invariants are structural:
//!
//! - at most one `Create` per `client_id`
//! - at most one `Update` per `transaction_id`
//! - at most one `Delete` per `transaction_id`, and never together with an
//!   `Update` for the same id (delete supersedes update)

use api_types::{CreateOp, DeleteOp, TransactionOp, TransactionPatch, UpdateOp};

#[derive(Clone, Debug, Default)]
pub struct OpQueue {
    ops: Vec<TransactionOp>,
}

impl OpQueue {
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[TransactionOp] {
        &self.ops
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<TransactionOp> {
        self.ops.clone()
    }

    /// Appends a `Create`. The caller guarantees the `client_id` is fresh.
    pub fn push_create(&mut self, op: CreateOp) {
        self.ops.push(TransactionOp::Create(op));
    }

    /// Folds an edit of an unsaved row into its `Create` op. Returns `false`
    /// when no `Create` with that `client_id` is queued.
    pub fn merge_into_create(&mut self, client_id: &str, patch: &TransactionPatch) -> bool {
        let Some(op) = self.ops.iter_mut().find_map(|op| match op {
            TransactionOp::Create(create) if create.client_id == client_id => Some(create),
            _ => None,
        }) else {
            return false;
        };

        if let Some(id) = patch.transaction_subcategory_id {
            op.transaction_subcategory_id = id;
        }
        if let Some(amount) = patch.amount {
            op.amount = amount;
        }
        if let Some(date) = patch.transaction_date {
            op.transaction_date = date;
        }
        if let Some(description) = &patch.description {
            op.description = description.clone();
        }
        true
    }

    /// Upserts an `Update` keyed by `transaction_id`, merging the new patch
    /// into the queued one so earlier edited fields are never lost.
    pub fn upsert_update(&mut self, transaction_id: i64, patch: TransactionPatch) {
        let existing = self.ops.iter_mut().find_map(|op| match op {
            TransactionOp::Update(update) if update.transaction_id == transaction_id => {
                Some(update)
            }
            _ => None,
        });

        match existing {
            Some(update) => update.patch.merge_from(patch),
            None => self.ops.push(TransactionOp::Update(UpdateOp {
                transaction_id,
                patch,
            })),
        }
    }

    /// Marks a persisted row deleted: any queued `Update` for the id becomes
    /// moot and is dropped, then a `Delete` is upserted.
    pub fn upsert_delete(&mut self, transaction_id: i64) {
        self.ops.retain(|op| {
            !matches!(op, TransactionOp::Update(update) if update.transaction_id == transaction_id)
        });
        let already_queued = self.ops.iter().any(|op| {
            matches!(op, TransactionOp::Delete(delete) if delete.transaction_id == transaction_id)
        });
        if !already_queued {
            self.ops
                .push(TransactionOp::Delete(DeleteOp { transaction_id }));
        }
    }

    /// Drops the `Create` for an unsaved row, as if it never existed.
    pub fn remove_create(&mut self, client_id: &str) {
        self.ops.retain(|op| {
            !matches!(op, TransactionOp::Create(create) if create.client_id == client_id)
        });
    }
}
