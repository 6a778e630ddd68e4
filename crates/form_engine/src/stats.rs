//! Monthly-statistics snapshot normalization.
//!
//! The backend has changed the encoding of its per-category series over
//! time: some arrive as keyed mappings, some as `[key, value]` pairs, some
//! as lists of objects. Everything is unified here into ordered rows so the
//! dashboard never cares which shape arrived.

use serde::Serialize;
use serde_json::Value;

/// Monthly total per transaction type label.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TypeTotal {
    #[serde(rename = "type")]
    pub type_name: String,
    pub total: f64,
}

/// Monthly total per subcategory.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubcategoryTotal {
    pub subcategory: String,
    pub total: f64,
}

/// Tracked-versus-budget row per transaction type for one month.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BudgetComparison {
    pub month: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub tracked: f64,
    pub budget: f64,
}

/// Tracked-versus-budget row per subcategory.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubcategoryBudget {
    pub subcategory: String,
    pub tracked: f64,
    pub budget: f64,
}

/// Read-only dashboard snapshot for the current month.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MonthlyStatistics {
    pub month_totals_by_type: Vec<TypeTotal>,
    pub month_income_by_subcategory: Vec<SubcategoryTotal>,
    pub month_expenses_by_subcategory: Vec<SubcategoryTotal>,
    pub month_savings_by_subcategory: Vec<BudgetComparison>,
    /// Raw keys: `tracked_vs_budget_by_subcategory_{Ingreso,Gasto,Ahorro}`.
    pub tracked_vs_budget_income: Vec<SubcategoryBudget>,
    pub tracked_vs_budget_expenses: Vec<SubcategoryBudget>,
    pub tracked_vs_budget_savings: Vec<SubcategoryBudget>,
    pub savings_rate_for_month: Option<f64>,
}

impl MonthlyStatistics {
    /// Normalizes the raw `monthly_statistic_user` object. Unrecognized or
    /// malformed series degrade to empty rows, never to a failure.
    #[must_use]
    pub fn from_value(raw: &Value) -> Self {
        Self {
            month_totals_by_type: key_value_series(raw.get("month_totals_by_type"), "type", "total")
                .into_iter()
                .map(|(type_name, total)| TypeTotal { type_name, total })
                .collect(),
            month_income_by_subcategory: subcategory_totals(
                raw.get("month_income_by_subcategory"),
            ),
            month_expenses_by_subcategory: subcategory_totals(
                raw.get("month_expenses_by_subcategory"),
            ),
            month_savings_by_subcategory: budget_comparisons(
                raw.get("month_savings_by_subcategory"),
            ),
            tracked_vs_budget_income: subcategory_budgets(
                raw.get("tracked_vs_budget_by_subcategory_Ingreso"),
            ),
            tracked_vs_budget_expenses: subcategory_budgets(
                raw.get("tracked_vs_budget_by_subcategory_Gasto"),
            ),
            tracked_vs_budget_savings: subcategory_budgets(
                raw.get("tracked_vs_budget_by_subcategory_Ahorro"),
            ),
            savings_rate_for_month: raw.get("savings_rate_for_month").and_then(Value::as_f64),
        }
    }
}

/// Coerces a JSON scalar to a number the way the original client did:
/// numbers pass through, numeric strings parse, everything else is zero.
fn number_of(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn string_of(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

/// Unifies the three interchangeable series shapes into ordered
/// `(key, value)` rows:
///
/// - keyed mapping: `{"Sueldo": 42000, ...}`
/// - pair list: `[["Sueldo", 42000], ...]`
/// - object list: `[{"<key_name>": "Sueldo", "<value_name>": 42000}, ...]`
///
/// Rows without a string key are skipped.
pub(crate) fn key_value_series(
    value: Option<&Value>,
    key_name: &str,
    value_name: &str,
) -> Vec<(String, f64)> {
    match value {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(key, total)| (key.clone(), number_of(Some(total))))
            .collect(),
        Some(Value::Array(rows)) => rows
            .iter()
            .filter_map(|row| match row {
                Value::Array(pair) => {
                    string_of(pair.first()).map(|key| (key, number_of(pair.get(1))))
                }
                Value::Object(fields) => string_of(fields.get(key_name))
                    .map(|key| (key, number_of(fields.get(value_name)))),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn subcategory_totals(value: Option<&Value>) -> Vec<SubcategoryTotal> {
    key_value_series(value, "subcategory", "total")
        .into_iter()
        .map(|(subcategory, total)| SubcategoryTotal { subcategory, total })
        .collect()
}

fn budget_comparisons(value: Option<&Value>) -> Vec<BudgetComparison> {
    let Some(rows) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(Value::as_object)
        .map(|fields| BudgetComparison {
            month: string_of(fields.get("month")).unwrap_or_default(),
            type_name: string_of(fields.get("type_name")).unwrap_or_default(),
            tracked: number_of(fields.get("tracked")),
            budget: number_of(fields.get("budget")),
        })
        .collect()
}

fn subcategory_budgets(value: Option<&Value>) -> Vec<SubcategoryBudget> {
    let Some(rows) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(Value::as_object)
        .filter_map(|fields| {
            string_of(fields.get("subcategory")).map(|subcategory| SubcategoryBudget {
                subcategory,
                tracked: number_of(fields.get("tracked")),
                budget: number_of(fields.get("budget")),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn series_accepts_keyed_mapping() {
        let raw = json!({"Ingreso": 42000, "Gasto": "1200.5"});
        let rows = key_value_series(Some(&raw), "type", "total");
        assert_eq!(
            rows,
            vec![
                ("Ingreso".to_string(), 42000.0),
                ("Gasto".to_string(), 1200.5)
            ]
        );
    }

    #[test]
    fn series_accepts_pair_list() {
        let raw = json!([["Sueldo", 42000], ["Extra", null]]);
        let rows = key_value_series(Some(&raw), "subcategory", "total");
        assert_eq!(
            rows,
            vec![("Sueldo".to_string(), 42000.0), ("Extra".to_string(), 0.0)]
        );
    }

    #[test]
    fn series_accepts_object_list() {
        let raw = json!([
            {"subcategory": "Sueldo", "total": 42000},
            {"subcategory": "Extra"},
            {"total": 5}
        ]);
        let rows = key_value_series(Some(&raw), "subcategory", "total");
        assert_eq!(
            rows,
            vec![("Sueldo".to_string(), 42000.0), ("Extra".to_string(), 0.0)]
        );
    }

    #[test]
    fn snapshot_normalizes_all_series() {
        let raw = json!({
            "month_totals_by_type": {"Ingreso": 100, "Gasto": 40},
            "month_income_by_subcategory": [["Sueldo", 100]],
            "month_expenses_by_subcategory": [{"subcategory": "Comida", "total": "40"}],
            "month_savings_by_subcategory": [
                {"month": "2025-03", "type_name": "Ahorro", "tracked": 10, "budget": 20}
            ],
            "tracked_vs_budget_by_subcategory_Gasto": [
                {"subcategory": "Comida", "tracked": 40, "budget": 60}
            ],
            "savings_rate_for_month": 0.25
        });

        let stats = MonthlyStatistics::from_value(&raw);
        assert_eq!(stats.month_totals_by_type.len(), 2);
        assert_eq!(stats.month_income_by_subcategory[0].subcategory, "Sueldo");
        assert_eq!(stats.month_expenses_by_subcategory[0].total, 40.0);
        assert_eq!(stats.month_savings_by_subcategory[0].type_name, "Ahorro");
        assert_eq!(stats.tracked_vs_budget_expenses[0].budget, 60.0);
        assert!(stats.tracked_vs_budget_income.is_empty());
        assert_eq!(stats.savings_rate_for_month, Some(0.25));
    }

    #[test]
    fn garbage_series_degrade_to_empty() {
        let raw = json!({"month_totals_by_type": 12, "month_income_by_subcategory": "no"});
        let stats = MonthlyStatistics::from_value(&raw);
        assert!(stats.month_totals_by_type.is_empty());
        assert!(stats.month_income_by_subcategory.is_empty());
        assert_eq!(stats.savings_rate_for_month, None);
    }
}
