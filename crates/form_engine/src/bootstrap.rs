//! One-time decode of the WebApp URL query parameters into typed state.
//!
//! The bot serializes everything the form needs into the URL, so this is the
//! only inbound interface. Decoding must never fail as a whole: a malformed
//! blob degrades that field to its fallback and is logged, while every other
//! field still comes through.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use api_types::{Budgets, Subcategory, SubtransactionType, Transaction};

use crate::stats::MonthlyStatistics;

/// What the bot opened the form for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Action {
    CreateNewUser,
    CreateNewMonth,
    Edit,
    /// Absent or unrecognized action string.
    #[default]
    None,
}

impl Action {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "create new user" => Self::CreateNewUser,
            "create new month" => Self::CreateNewMonth,
            "edit" => Self::Edit,
            _ => Self::None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateNewUser => "create new user",
            Self::CreateNewMonth => "create new month",
            Self::Edit => "edit",
            Self::None => "",
        }
    }

    /// Only the edit action carries a transaction list and emits ops.
    #[must_use]
    pub const fn is_edit(self) -> bool {
        matches!(self, Self::Edit)
    }
}

/// Editable user profile fields, prefilled from the query string.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub salary_day: String,
    pub telegram_user_id: String,
}

/// Typed initial state produced by the one-time query decode.
#[derive(Clone, Debug, Default)]
pub struct Bootstrap {
    pub action: Action,
    pub salary_day_end: String,
    pub user: UserForm,
    pub budgets: Budgets,
    pub subtransaction_types: Vec<SubtransactionType>,
    pub transactions: Vec<Transaction>,
    pub subcategories: Vec<Subcategory>,
    pub statistics: Option<MonthlyStatistics>,
}

impl Bootstrap {
    /// Decodes the flat query-parameter map. Infallible by contract; see the
    /// module docs for the per-field fallbacks.
    #[must_use]
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let raw_action = raw_param(params, "action");
        let action = Action::parse(&raw_action);
        if action == Action::None && !raw_action.is_empty() {
            tracing::warn!(action = %raw_action, "unrecognized action, treating as empty");
        }

        let salary_day_end = match params.get("salary_day_end") {
            Some(raw) if !raw.is_empty() => raw.clone(),
            _ => "31".to_string(),
        };

        let user = UserForm {
            name: raw_param(params, "name"),
            email: raw_param(params, "email"),
            salary_day: raw_param(params, "salary_day"),
            telegram_user_id: raw_param(params, "telegram_user_id"),
        };

        let mut subtransaction_types: Vec<SubtransactionType> =
            json_param(params, "initial_subtransactions", Vec::new());
        // Everything that arrived through the URL predates this session.
        for subtransaction in &mut subtransaction_types {
            subtransaction.is_initial = true;
        }

        let statistics = json_param::<Option<Value>>(params, "monthly_statistic_user", None)
            .map(|raw| MonthlyStatistics::from_value(&raw));

        Self {
            action,
            salary_day_end,
            user,
            budgets: json_param(params, "initial_budgets", Budgets::default()),
            subtransaction_types,
            transactions: json_param(params, "initial_transactions", Vec::new()),
            subcategories: json_param(params, "initial_db_subcategories", Vec::new()),
            statistics,
        }
    }
}

fn raw_param(params: &HashMap<String, String>, key: &str) -> String {
    params.get(key).cloned().unwrap_or_default()
}

/// Decodes one JSON-valued parameter, falling back on absence or decode
/// failure. A failure here must never block the other fields.
fn json_param<T: DeserializeOwned>(params: &HashMap<String, String>, key: &str, fallback: T) -> T {
    let Some(raw) = params.get(key).filter(|raw| !raw.is_empty()) else {
        return fallback;
    };
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(key, %err, "failed to decode bootstrap field, using fallback");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_params_produce_defaults() {
        let bootstrap = Bootstrap::from_params(&HashMap::new());
        assert_eq!(bootstrap.action, Action::None);
        assert_eq!(bootstrap.salary_day_end, "31");
        assert!(bootstrap.budgets.is_empty());
        assert!(bootstrap.subtransaction_types.is_empty());
        assert!(bootstrap.transactions.is_empty());
        assert!(bootstrap.statistics.is_none());
    }

    #[test]
    fn malformed_budgets_fall_back_alone() {
        let bootstrap = Bootstrap::from_params(&params(&[
            ("initial_budgets", "{invalid json"),
            ("initial_db_subcategories", r#"[{"id": 4, "name": "Comida"}]"#),
            ("action", "edit"),
        ]));

        assert!(bootstrap.budgets.is_empty());
        assert_eq!(bootstrap.subcategories.len(), 1);
        assert_eq!(bootstrap.action, Action::Edit);
    }

    #[test]
    fn subtransactions_are_tagged_initial() {
        let bootstrap = Bootstrap::from_params(&params(&[(
            "initial_subtransactions",
            r#"[{"name": "Renta", "transaction_type_id": "-1", "ideal_amount": "1200"}]"#,
        )]));

        let st = &bootstrap.subtransaction_types[0];
        assert!(st.is_initial);
        assert_eq!(st.transaction_type_id, -1);
        assert_eq!(st.ideal_amount, Some(1200.0));
    }

    #[test]
    fn prefill_and_statistics_come_through() {
        let bootstrap = Bootstrap::from_params(&params(&[
            ("name", "Ana"),
            ("email", "ana@mail.com"),
            ("salary_day", "15"),
            ("telegram_user_id", "42"),
            (
                "monthly_statistic_user",
                r#"{"month_totals_by_type": {"Ingreso": 10}}"#,
            ),
        ]));

        assert_eq!(bootstrap.user.name, "Ana");
        assert_eq!(bootstrap.user.salary_day, "15");
        let stats = bootstrap.statistics.unwrap();
        assert_eq!(stats.month_totals_by_type[0].type_name, "Ingreso");
    }

    #[test]
    fn json_null_statistics_stay_absent() {
        let bootstrap =
            Bootstrap::from_params(&params(&[("monthly_statistic_user", "null")]));
        assert!(bootstrap.statistics.is_none());
    }

    #[test]
    fn unknown_action_normalizes_to_empty() {
        let bootstrap = Bootstrap::from_params(&params(&[("action", "reticulate splines")]));
        assert_eq!(bootstrap.action, Action::None);
        assert_eq!(bootstrap.action.as_str(), "");
    }
}
