//! Transaction drafting and row identity.

use api_types::{Transaction, TransactionPatch};
use chrono::{NaiveDate, Utc};

/// In-progress transaction captured by the form before it becomes a
/// `Create` op.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransactionDraft {
    pub subcategory_id: Option<i64>,
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// Identity of a display row: persisted rows by backend id, unsaved rows by
/// the session-local client id. Exactly one applies to any row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxKey {
    Id(i64),
    ClientId(String),
}

impl TxKey {
    pub(crate) fn matches(&self, tx: &Transaction) -> bool {
        match self {
            Self::Id(id) => tx.id == Some(*id),
            Self::ClientId(client_id) => tx.client_id.as_deref() == Some(client_id),
        }
    }
}

/// Applies a patch to a display row, last write wins per field.
pub(crate) fn apply_patch(tx: &mut Transaction, patch: &TransactionPatch) {
    if let Some(id) = patch.transaction_subcategory_id {
        tx.subcategory_id = id;
    }
    if let Some(amount) = patch.amount {
        tx.amount = amount;
    }
    if let Some(date) = patch.transaction_date {
        tx.date = date;
    }
    if let Some(description) = &patch.description {
        tx.description = description.clone();
    }
}

/// Generates session-unique client ids for unsaved rows.
///
/// Ids are millisecond timestamps with a numeric suffix whenever two adds
/// land in the same millisecond (or the clock steps backwards). Uniqueness
/// within one session is the only requirement.
#[derive(Clone, Debug, Default)]
pub(crate) struct ClientIdGen {
    last_millis: i64,
    seq: u32,
}

impl ClientIdGen {
    pub(crate) fn next_id(&mut self) -> String {
        let millis = Utc::now().timestamp_millis();
        if millis <= self.last_millis {
            self.seq += 1;
            format!("tmp-{}-{}", self.last_millis, self.seq)
        } else {
            self.last_millis = millis;
            self.seq = 0;
            format!("tmp-{millis}")
        }
    }
}
