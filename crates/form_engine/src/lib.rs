//! Session engine behind the budgeting Mini App form.
//!
//! A [`FormSession`] is bootstrapped once from the WebApp URL query
//! parameters, mutated through typed operations while the user edits, and
//! finally reduced to a single JSON payload handed to the hosting Telegram
//! client. Transaction edits are reconciled into a minimal op queue rather
//! than re-sending the full list.

pub mod bootstrap;
pub mod error;
pub mod host;
pub mod ops;
pub mod stats;
pub mod subtransactions;
pub mod transactions;

mod validate;

pub use api_types::{
    BudgetEntry, Budgets, CreateOp, DeleteOp, DeleteUserPayload, Subcategory, SubmitPayload,
    SubtransactionType, Transaction, TransactionOp, TransactionPatch, TransactionType, UpdateOp,
    UserPayload,
};
pub use bootstrap::{Action, Bootstrap, UserForm};
pub use error::FormError;
pub use host::{DetachedHost, WebAppHost};
pub use stats::MonthlyStatistics;
pub use subtransactions::MAX_SUBTRANSACTION_TYPES;
pub use transactions::{TransactionDraft, TxKey};

use ops::OpQueue;
use transactions::ClientIdGen;

type ResultForm<T> = Result<T, FormError>;

/// What happened when the session tried to hand data to the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Payload serialized and handed to the host; the host was asked to
    /// close.
    Sent,
    /// Validation failed; nothing left the session.
    Blocked(Vec<String>),
    /// No host attached; nothing left the session.
    Detached,
}

/// Live form state for one WebApp session.
#[derive(Clone, Debug, Default)]
pub struct FormSession {
    action: Action,
    salary_day_end: String,
    user: UserForm,
    budgets: Budgets,
    subtransaction_types: Vec<SubtransactionType>,
    transactions: Vec<Transaction>,
    subcategories: Vec<Subcategory>,
    statistics: Option<MonthlyStatistics>,
    ops: OpQueue,
    form_errors: Vec<String>,
    client_ids: ClientIdGen,
}

impl FormSession {
    #[must_use]
    pub fn new(bootstrap: Bootstrap) -> Self {
        tracing::debug!(
            action = bootstrap.action.as_str(),
            budgets = bootstrap.budgets.len(),
            subtransaction_types = bootstrap.subtransaction_types.len(),
            transactions = bootstrap.transactions.len(),
            "form session bootstrapped"
        );
        Self {
            action: bootstrap.action,
            salary_day_end: bootstrap.salary_day_end,
            user: bootstrap.user,
            budgets: bootstrap.budgets,
            subtransaction_types: bootstrap.subtransaction_types,
            transactions: bootstrap.transactions,
            subcategories: bootstrap.subcategories,
            statistics: bootstrap.statistics,
            ops: OpQueue::default(),
            form_errors: Vec::new(),
            client_ids: ClientIdGen::default(),
        }
    }

    /// Signals the host that the form is ready and asks for full height.
    /// A detached host is left alone.
    pub fn start(&self, host: &dyn WebAppHost) {
        if !host.is_attached() {
            tracing::info!("no host attached, running detached");
            return;
        }
        host.ready();
        host.expand();
    }

    #[must_use]
    pub fn action(&self) -> Action {
        self.action
    }

    #[must_use]
    pub fn user(&self) -> &UserForm {
        &self.user
    }

    #[must_use]
    pub fn budgets(&self) -> &Budgets {
        &self.budgets
    }

    #[must_use]
    pub fn subtransaction_types(&self) -> &[SubtransactionType] {
        &self.subtransaction_types
    }

    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    #[must_use]
    pub fn subcategories(&self) -> &[Subcategory] {
        &self.subcategories
    }

    #[must_use]
    pub fn statistics(&self) -> Option<&MonthlyStatistics> {
        self.statistics.as_ref()
    }

    #[must_use]
    pub fn pending_ops(&self) -> &[TransactionOp] {
        self.ops.as_slice()
    }

    /// Messages from the last blocked submission, cleared on success.
    #[must_use]
    pub fn form_errors(&self) -> &[String] {
        &self.form_errors
    }

    pub fn set_user_name(&mut self, name: impl Into<String>) {
        self.user.name = name.into();
    }

    pub fn set_user_email(&mut self, email: impl Into<String>) {
        self.user.email = email.into();
    }

    pub fn set_user_salary_day(&mut self, salary_day: impl Into<String>) {
        self.user.salary_day = salary_day.into();
    }

    /// Sets the ideal amount of one budget row.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::KeyNotFound`] when no budget uses that key.
    pub fn set_budget_amount(&mut self, key: &str, amount: Option<f64>) -> ResultForm<()> {
        let budget = self
            .budgets
            .get_mut(key)
            .ok_or_else(|| FormError::KeyNotFound(key.to_string()))?;
        budget.ideal_amount = amount;
        Ok(())
    }

    /// Appends a blank sub-transaction type and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::LimitReached`] at the per-user cap.
    pub fn add_subtransaction_type(&mut self) -> ResultForm<usize> {
        if self.subtransaction_types.len() >= MAX_SUBTRANSACTION_TYPES {
            return Err(FormError::LimitReached(format!(
                "at most {MAX_SUBTRANSACTION_TYPES} sub-transaction types"
            )));
        }
        self.subtransaction_types.push(SubtransactionType::blank());
        Ok(self.subtransaction_types.len() - 1)
    }

    /// Removes a sub-transaction type row.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::KeyNotFound`] for an out-of-range index and
    /// [`FormError::LockedEntry`] for a pre-existing row while editing an
    /// existing month.
    pub fn remove_subtransaction_type(&mut self, index: usize) -> ResultForm<()> {
        if self.is_locked(index)? {
            return Err(FormError::LockedEntry(self.subtransaction_types[index].name.clone()));
        }
        self.subtransaction_types.remove(index);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`FormError::KeyNotFound`] for an out-of-range index and
    /// [`FormError::LockedEntry`] when the row's name is locked.
    pub fn set_subtransaction_name(
        &mut self,
        index: usize,
        name: impl Into<String>,
    ) -> ResultForm<()> {
        if self.is_locked(index)? {
            return Err(FormError::LockedEntry(self.subtransaction_types[index].name.clone()));
        }
        self.subtransaction_types[index].name = name.into();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`FormError::KeyNotFound`] for an out-of-range index.
    pub fn set_subtransaction_description(
        &mut self,
        index: usize,
        description: impl Into<String>,
    ) -> ResultForm<()> {
        let row = self
            .subtransaction_types
            .get_mut(index)
            .ok_or_else(|| FormError::KeyNotFound(index.to_string()))?;
        row.description = description.into();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`FormError::KeyNotFound`] for an out-of-range index,
    /// [`FormError::LockedEntry`] when the row's type is locked and
    /// [`FormError::InvalidType`] for an id outside the taxonomy.
    pub fn set_subtransaction_type_id(&mut self, index: usize, type_id: i64) -> ResultForm<()> {
        if self.is_locked(index)? {
            return Err(FormError::LockedEntry(self.subtransaction_types[index].name.clone()));
        }
        let kind =
            TransactionType::try_from(type_id).map_err(|id| FormError::InvalidType(id.to_string()))?;
        self.subtransaction_types[index].transaction_type_id = kind.type_id();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`FormError::KeyNotFound`] for an out-of-range index.
    pub fn set_subtransaction_amount(
        &mut self,
        index: usize,
        amount: Option<f64>,
    ) -> ResultForm<()> {
        let row = self
            .subtransaction_types
            .get_mut(index)
            .ok_or_else(|| FormError::KeyNotFound(index.to_string()))?;
        row.ideal_amount = amount;
        Ok(())
    }

    #[must_use]
    pub fn duplicate_name_flags(&self) -> Vec<bool> {
        subtransactions::duplicate_name_flags(&self.subtransaction_types)
    }

    #[must_use]
    pub fn has_duplicate_names(&self) -> bool {
        subtransactions::has_duplicate_names(&self.subtransaction_types)
    }

    /// Adds a drafted transaction: prepends a display row and queues its
    /// `Create` op. Returns the row's session-local client id.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::MissingField`] without a subcategory and
    /// [`FormError::InvalidAmount`] unless the amount is positive. On error
    /// neither the row nor the op is added.
    pub fn add_transaction(&mut self, draft: TransactionDraft) -> ResultForm<String> {
        let subcategory_id = draft
            .subcategory_id
            .ok_or_else(|| FormError::MissingField("subcategory".to_string()))?;
        let amount = match draft.amount {
            Some(amount) if amount > 0.0 => amount,
            other => {
                return Err(FormError::InvalidAmount(
                    other.map_or_else(|| "none".to_string(), |a| a.to_string()),
                ));
            }
        };

        let client_id = self.client_ids.next_id();
        self.transactions.insert(
            0,
            Transaction {
                id: None,
                client_id: Some(client_id.clone()),
                subcategory_id,
                amount,
                date: draft.date,
                description: draft.description.clone(),
                extra: serde_json::Map::new(),
            },
        );
        self.ops.push_create(CreateOp {
            client_id: client_id.clone(),
            transaction_subcategory_id: subcategory_id,
            amount,
            transaction_date: draft.date,
            description: draft.description,
        });
        tracing::debug!(%client_id, "transaction drafted");
        Ok(client_id)
    }

    /// Applies a partial edit to a row. Persisted rows get an upserted
    /// `Update` op; unsaved rows have the edit folded into their `Create`.
    /// Unknown keys and empty patches are silently ignored.
    pub fn update_transaction(&mut self, key: &TxKey, patch: TransactionPatch) {
        if patch.is_empty() {
            return;
        }
        let Some(row) = self.transactions.iter_mut().find(|tx| key.matches(tx)) else {
            tracing::warn!(?key, "update for unknown transaction, ignoring");
            return;
        };
        transactions::apply_patch(row, &patch);

        match (row.id, row.client_id.clone()) {
            (Some(id), _) => self.ops.upsert_update(id, patch),
            (None, Some(client_id)) => {
                self.ops.merge_into_create(&client_id, &patch);
            }
            (None, None) => {}
        }
    }

    /// Removes a row. Unsaved rows vanish together with their `Create` op;
    /// persisted rows get a `Delete` queued (superseding any pending
    /// `Update`). Unknown keys are silently ignored.
    pub fn remove_transaction(&mut self, key: &TxKey) {
        let Some(position) = self.transactions.iter().position(|tx| key.matches(tx)) else {
            tracing::warn!(?key, "removal of unknown transaction, ignoring");
            return;
        };
        let row = self.transactions.remove(position);

        match (row.id, row.client_id) {
            (Some(id), _) => self.ops.upsert_delete(id),
            (None, Some(client_id)) => self.ops.remove_create(&client_id),
            (None, None) => {}
        }
    }

    /// Collects every validation message for the current state, in display
    /// order: user profile, budgets, sub-transaction types, then ops.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        validate::validate_user(&self.user, &self.salary_day_end, &mut errors);
        validate::validate_budgets(&self.budgets, &mut errors);
        validate::validate_subtransaction_types(&self.subtransaction_types, &mut errors);
        if self.action.is_edit() {
            validate::validate_ops(self.ops.as_slice(), &mut errors);
        }
        errors
    }

    /// Builds the submit payload, or the validation messages blocking it.
    /// The op list is attached only for the edit action.
    ///
    /// # Errors
    ///
    /// Returns the full list of validation messages when any rule fails.
    pub fn build_payload(&self) -> Result<SubmitPayload, Vec<String>> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }

        // Validation guarantees salary_day parses.
        let salary_day = self.user.salary_day.trim().parse().unwrap_or_default();
        Ok(SubmitPayload {
            users: UserPayload {
                name: self.user.name.clone(),
                email: self.user.email.clone(),
                salary_day,
                telegram_user_id: self.user.telegram_user_id.clone(),
            },
            budgets: self.budgets.clone(),
            subtransaction_types: self.subtransaction_types.clone(),
            action: self.action.as_str().to_string(),
            transactions_ops: self.action.is_edit().then(|| self.ops.to_vec()),
        })
    }

    /// Validates, serializes and hands the payload to the host, then asks it
    /// to close. With no host attached nothing happens, not even validation.
    pub fn submit(&mut self, host: &dyn WebAppHost) -> SubmitOutcome {
        if !host.is_attached() {
            tracing::info!("submit with no host attached, ignoring");
            return SubmitOutcome::Detached;
        }

        match self.build_payload() {
            Ok(payload) => {
                let encoded = match serde_json::to_string(&payload) {
                    Ok(encoded) => encoded,
                    Err(err) => {
                        tracing::error!(%err, "failed to serialize submit payload");
                        self.form_errors =
                            vec![format!("internal error: could not encode payload: {err}")];
                        return SubmitOutcome::Blocked(self.form_errors.clone());
                    }
                };
                tracing::info!(
                    action = payload.action,
                    ops = payload.transactions_ops.as_ref().map_or(0, Vec::len),
                    "submitting form"
                );
                host.send_data(&encoded);
                host.close();
                self.form_errors.clear();
                SubmitOutcome::Sent
            }
            Err(errors) => {
                tracing::info!(count = errors.len(), "submission blocked by validation");
                self.form_errors = errors.clone();
                SubmitOutcome::Blocked(errors)
            }
        }
    }

    /// Sends the account-deletion payload. It bypasses form validation; only
    /// the Telegram user id travels.
    pub fn delete_account(&self, host: &dyn WebAppHost) -> SubmitOutcome {
        if !host.is_attached() {
            tracing::info!("delete account with no host attached, ignoring");
            return SubmitOutcome::Detached;
        }

        let payload = DeleteUserPayload::new(self.user.telegram_user_id.clone());
        let encoded = match serde_json::to_string(&payload) {
            Ok(encoded) => encoded,
            Err(err) => {
                tracing::error!(%err, "failed to serialize delete payload");
                return SubmitOutcome::Blocked(vec![format!(
                    "internal error: could not encode payload: {err}"
                )]);
            }
        };
        tracing::info!("requesting account deletion");
        host.send_data(&encoded);
        host.close();
        SubmitOutcome::Sent
    }

    /// Locked rows keep their name and type: while editing an existing
    /// month, pre-existing sub-transaction types are already referenced by
    /// tracked transactions.
    fn is_locked(&self, index: usize) -> ResultForm<bool> {
        let row = self
            .subtransaction_types
            .get(index)
            .ok_or_else(|| FormError::KeyNotFound(index.to_string()))?;
        Ok(self.action.is_edit() && row.is_initial)
    }
}
