//! Wire types shared between the form session engine and the bot backend.
//!
//! The bot embeds bootstrap blobs as JSON in the WebApp URL query string and
//! expects a single JSON payload back through `sendData`. Every shape in this
//! crate matches that contract byte for byte, including the backend's mixed
//! naming (`Users`, `Subtransactions_Types`, `TransactionsOps`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod de {
    //! Lenient deserializers for fields the backend sends inconsistently,
    //! either as numbers or as numeric strings.

    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawNumber {
        Num(f64),
        Text(String),
    }

    impl RawNumber {
        fn as_f64(&self) -> Option<f64> {
            match self {
                Self::Num(n) => Some(*n),
                Self::Text(s) => s.trim().parse().ok(),
            }
        }
    }

    /// Number or numeric string. Null, missing or unparseable input becomes
    /// `None`; validation catches it later instead of rejecting the whole
    /// bootstrap field.
    pub fn f64_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<RawNumber>::deserialize(deserializer)?;
        Ok(raw.and_then(|r| r.as_f64()))
    }

    /// Required integer, accepting numbers and numeric strings.
    pub fn i64_coerce<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawNumber::deserialize(deserializer)?;
        raw.as_f64()
            .map(|n| n as i64)
            .ok_or_else(|| D::Error::custom("expected a number or a numeric string"))
    }

    /// Optional integer, accepting numbers and numeric strings.
    pub fn i64_opt<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<RawNumber>::deserialize(deserializer)?;
        Ok(raw.and_then(|r| r.as_f64()).map(|n| n as i64))
    }

    /// Required amount, accepting numbers and numeric strings.
    pub fn f64_coerce<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawNumber::deserialize(deserializer)?;
        raw.as_f64()
            .ok_or_else(|| D::Error::custom("expected a number or a numeric string"))
    }

    /// `YYYY-MM-DD` date string. Null, empty or malformed input becomes
    /// `None`, matching the form's "optional date" semantics.
    pub fn date_opt<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()))
    }
}

/// Transaction type taxonomy used by budgets, sub-transaction types and
/// subcategories. The backend encodes it as `-1` (expense), `0` (savings) or
/// `1` (income); display labels follow the bot's locale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionType {
    Expense,
    Savings,
    Income,
}

impl TransactionType {
    /// Returns the backend's numeric id.
    #[must_use]
    pub const fn type_id(self) -> i64 {
        match self {
            Self::Expense => -1,
            Self::Savings => 0,
            Self::Income => 1,
        }
    }

    /// Display label as shown to the user (and used as a key in the
    /// monthly-statistics series).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Expense => "Gasto",
            Self::Savings => "Ahorro",
            Self::Income => "Ingreso",
        }
    }

    /// Label lookup that tolerates ids this client does not know about.
    #[must_use]
    pub fn label_for(type_id: Option<i64>) -> &'static str {
        type_id
            .and_then(|id| Self::try_from(id).ok())
            .map_or("Desconocido", Self::label)
    }
}

impl TryFrom<i64> for TransactionType {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Expense),
            0 => Ok(Self::Savings),
            1 => Ok(Self::Income),
            other => Err(other),
        }
    }
}

/// A budget row keyed by the backend's budget key.
///
/// Only `ideal_amount` is editable in the form; everything else is carried
/// through unchanged. Unknown fields survive the round trip via `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetEntry {
    pub name: String,
    pub period_start: String,
    pub period_end: String,
    #[serde(deserialize_with = "de::i64_coerce")]
    pub transaction_type_id: i64,
    #[serde(deserialize_with = "de::f64_opt")]
    pub ideal_amount: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Budget entries as a JSON object that keeps the backend's key order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Budgets(Vec<(String, BudgetEntry)>);

impl Budgets {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&BudgetEntry> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, b)| b)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut BudgetEntry> {
        self.0.iter_mut().find(|(k, _)| k == key).map(|(_, b)| b)
    }

    /// Inserts or replaces by key, keeping the first-seen position.
    pub fn insert(&mut self, key: String, entry: BudgetEntry) {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = entry,
            None => self.0.push((key, entry)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BudgetEntry)> {
        self.0.iter().map(|(k, b)| (k.as_str(), b))
    }
}

impl FromIterator<(String, BudgetEntry)> for Budgets {
    fn from_iter<I: IntoIterator<Item = (String, BudgetEntry)>>(iter: I) -> Self {
        let mut budgets = Budgets::default();
        for (key, entry) in iter {
            budgets.insert(key, entry);
        }
        budgets
    }
}

impl Serialize for Budgets {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, entry) in &self.0 {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Budgets {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct BudgetsVisitor;

        impl<'de> serde::de::Visitor<'de> for BudgetsVisitor {
            type Value = Budgets;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of budget keys to budget entries")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut budgets = Budgets::default();
                while let Some((key, entry)) = access.next_entry::<String, BudgetEntry>()? {
                    budgets.insert(key, entry);
                }
                Ok(budgets)
            }
        }

        deserializer.deserialize_map(BudgetsVisitor)
    }
}

/// A recurring sub-transaction type definition.
///
/// `is_initial` marks rows that existed before this session; the form locks
/// their name and type while editing an existing month.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtransactionType {
    pub name: String,
    pub description: String,
    #[serde(deserialize_with = "de::i64_coerce")]
    pub transaction_type_id: i64,
    #[serde(deserialize_with = "de::f64_opt")]
    pub ideal_amount: Option<f64>,
    pub is_initial: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl SubtransactionType {
    /// A freshly added row: expense-typed with a zero amount, so validation
    /// forces the user to fill it in before submitting.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            transaction_type_id: TransactionType::Expense.type_id(),
            ideal_amount: Some(0.0),
            ..Self::default()
        }
    }
}

/// A selectable subcategory offered by the backend for new transactions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    #[serde(deserialize_with = "de::i64_coerce")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de::i64_opt")]
    pub transaction_type_id: Option<i64>,
}

/// A transaction row as displayed in the form.
///
/// Persisted rows carry `id`; rows created in this session carry `client_id`
/// instead, until the backend assigns them a real id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transaction {
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(deserialize_with = "de::i64_coerce")]
    pub subcategory_id: i64,
    #[serde(deserialize_with = "de::f64_coerce")]
    pub amount: f64,
    #[serde(deserialize_with = "de::date_opt")]
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Partial edit of a transaction. Only present fields are applied; `date`
/// and `description` distinguish "untouched" (outer `None`) from an explicit
/// clear (inner `None`, serialized as JSON null).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_subcategory_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
}

impl TransactionPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transaction_subcategory_id.is_none()
            && self.amount.is_none()
            && self.transaction_date.is_none()
            && self.description.is_none()
    }

    /// Merges a newer patch on top of this one, last write wins per field.
    pub fn merge_from(&mut self, newer: TransactionPatch) {
        if newer.transaction_subcategory_id.is_some() {
            self.transaction_subcategory_id = newer.transaction_subcategory_id;
        }
        if newer.amount.is_some() {
            self.amount = newer.amount;
        }
        if newer.transaction_date.is_some() {
            self.transaction_date = newer.transaction_date;
        }
        if newer.description.is_some() {
            self.description = newer.description;
        }
    }
}

/// Pending creation of a transaction drafted in this session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateOp {
    pub client_id: String,
    pub transaction_subcategory_id: i64,
    pub amount: f64,
    /// Serialized as null when unset; the backend expects the key.
    pub transaction_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// Pending edit of a persisted transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateOp {
    pub transaction_id: i64,
    #[serde(flatten)]
    pub patch: TransactionPatch,
}

/// Pending removal of a persisted transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeleteOp {
    pub transaction_id: i64,
}

/// A queued instruction for the backend, tagged by `"op"` on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum TransactionOp {
    Create(CreateOp),
    Update(UpdateOp),
    Delete(DeleteOp),
}

/// User profile section of the submit payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPayload {
    pub name: String,
    pub email: String,
    pub salary_day: i64,
    pub telegram_user_id: String,
}

/// The single payload handed back to the hosting Telegram client on submit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmitPayload {
    #[serde(rename = "Users")]
    pub users: UserPayload,
    pub budgets: Budgets,
    #[serde(rename = "Subtransactions_Types")]
    pub subtransaction_types: Vec<SubtransactionType>,
    pub action: String,
    /// Present only when the form was opened with the edit action.
    #[serde(
        rename = "TransactionsOps",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub transactions_ops: Option<Vec<TransactionOp>>,
}

/// Mutually exclusive payload sent when the user deletes their account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeleteUserPayload {
    pub action: String,
    pub telegram_user_id: String,
}

impl DeleteUserPayload {
    pub const ACTION: &'static str = "delete_user";

    #[must_use]
    pub fn new(telegram_user_id: impl Into<String>) -> Self {
        Self {
            action: Self::ACTION.to_string(),
            telegram_user_id: telegram_user_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn budget_entry_coerces_numeric_strings() {
        let entry: BudgetEntry = serde_json::from_value(json!({
            "name": "Comida",
            "period_start": "2025-01-01",
            "period_end": "2025-01-31",
            "transaction_type_id": "-1",
            "ideal_amount": "1500.50"
        }))
        .unwrap();

        assert_eq!(entry.transaction_type_id, -1);
        assert_eq!(entry.ideal_amount, Some(1500.50));
    }

    #[test]
    fn budgets_keep_insertion_order() {
        let raw = r#"{"zz":{"name":"Z"},"aa":{"name":"A"},"mm":{"name":"M"}}"#;
        let budgets: Budgets = serde_json::from_str(raw).unwrap();

        let keys: Vec<&str> = budgets.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zz", "aa", "mm"]);

        let out = serde_json::to_string(&budgets).unwrap();
        let zz = out.find("zz").unwrap();
        let aa = out.find("aa").unwrap();
        let mm = out.find("mm").unwrap();
        assert!(zz < aa && aa < mm);
    }

    #[test]
    fn budget_entry_keeps_unknown_fields() {
        let raw = json!({"name": "Ocio", "ideal_amount": 10, "budget_id": 42});
        let entry: BudgetEntry = serde_json::from_value(raw).unwrap();
        assert_eq!(entry.extra.get("budget_id"), Some(&json!(42)));

        let out = serde_json::to_value(&entry).unwrap();
        assert_eq!(out.get("budget_id"), Some(&json!(42)));
    }

    #[test]
    fn create_op_serializes_nulls_for_unset_optionals() {
        let op = TransactionOp::Create(CreateOp {
            client_id: "tmp-1".to_string(),
            transaction_subcategory_id: 4,
            amount: 150.0,
            transaction_date: None,
            description: None,
        });

        let out = serde_json::to_value(&op).unwrap();
        assert_eq!(out["op"], "create");
        assert_eq!(out["transaction_date"], Value::Null);
        assert_eq!(out["description"], Value::Null);
    }

    #[test]
    fn update_op_serializes_only_edited_fields() {
        let op = TransactionOp::Update(UpdateOp {
            transaction_id: 9,
            patch: TransactionPatch {
                amount: Some(20.0),
                ..TransactionPatch::default()
            },
        });

        let out = serde_json::to_value(&op).unwrap();
        assert_eq!(out["op"], "update");
        assert_eq!(out["transaction_id"], 9);
        assert_eq!(out["amount"], 20.0);
        assert!(out.get("description").is_none());
        assert!(out.get("transaction_date").is_none());
    }

    #[test]
    fn update_op_serializes_explicit_clears_as_null() {
        let op = TransactionOp::Update(UpdateOp {
            transaction_id: 9,
            patch: TransactionPatch {
                description: Some(None),
                ..TransactionPatch::default()
            },
        });

        let out = serde_json::to_value(&op).unwrap();
        assert_eq!(out["description"], Value::Null);
    }

    #[test]
    fn patch_merge_is_last_write_wins_per_field() {
        let mut patch = TransactionPatch {
            amount: Some(10.0),
            description: Some(Some("old".to_string())),
            ..TransactionPatch::default()
        };
        patch.merge_from(TransactionPatch {
            amount: Some(25.0),
            transaction_subcategory_id: Some(3),
            ..TransactionPatch::default()
        });

        assert_eq!(patch.amount, Some(25.0));
        assert_eq!(patch.transaction_subcategory_id, Some(3));
        assert_eq!(patch.description, Some(Some("old".to_string())));
    }

    #[test]
    fn transaction_type_labels() {
        assert_eq!(TransactionType::label_for(Some(1)), "Ingreso");
        assert_eq!(TransactionType::label_for(Some(-1)), "Gasto");
        assert_eq!(TransactionType::label_for(Some(0)), "Ahorro");
        assert_eq!(TransactionType::label_for(Some(7)), "Desconocido");
        assert_eq!(TransactionType::label_for(None), "Desconocido");
    }

    #[test]
    fn submit_payload_uses_backend_field_names() {
        let payload = SubmitPayload {
            users: UserPayload {
                name: "Ana".to_string(),
                email: "ana@mail.com".to_string(),
                salary_day: 15,
                telegram_user_id: "42".to_string(),
            },
            budgets: Budgets::default(),
            subtransaction_types: vec![],
            action: "edit".to_string(),
            transactions_ops: Some(vec![]),
        };

        let out = serde_json::to_value(&payload).unwrap();
        assert!(out.get("Users").is_some());
        assert!(out.get("Subtransactions_Types").is_some());
        assert!(out.get("TransactionsOps").is_some());
        assert_eq!(out["Users"]["salary_day"], 15);
    }

    #[test]
    fn submit_payload_omits_ops_outside_edit() {
        let payload = SubmitPayload {
            users: UserPayload::default(),
            budgets: Budgets::default(),
            subtransaction_types: vec![],
            action: "create new user".to_string(),
            transactions_ops: None,
        };

        let out = serde_json::to_value(&payload).unwrap();
        assert!(out.get("TransactionsOps").is_none());
    }

    #[test]
    fn transaction_accepts_backend_row() {
        let tx: Transaction = serde_json::from_value(json!({
            "id": 7,
            "subcategory_id": "4",
            "amount": "99.5",
            "date": "2025-03-02",
            "description": "taxi"
        }))
        .unwrap();

        assert_eq!(tx.id, Some(7));
        assert_eq!(tx.subcategory_id, 4);
        assert_eq!(tx.amount, 99.5);
        assert_eq!(
            tx.date,
            Some(NaiveDate::from_ymd_opt(2025, 3, 2).unwrap())
        );
    }
}
