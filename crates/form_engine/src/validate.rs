//! Submission-time validation.
//!
//! Business-rule violations are collected as human-readable messages rather
//! than raised as errors; the session blocks the payload while any exist.

use api_types::{Budgets, SubtransactionType, TransactionOp};

use crate::bootstrap::UserForm;
use crate::subtransactions;

pub(crate) fn validate_user(user: &UserForm, salary_day_end: &str, errors: &mut Vec<String>) {
    if user.name.trim().is_empty() {
        errors.push("name is required".to_string());
    }
    if !user.email.contains('@') {
        errors.push("email is not valid, it must contain '@'".to_string());
    }

    let max_day: i64 = salary_day_end.trim().parse().unwrap_or(31);
    match user.salary_day.trim().parse::<i64>() {
        Ok(day) if (1..=max_day).contains(&day) => {}
        _ => errors.push(format!(
            "salary day must be an integer between 1 and {max_day}"
        )),
    }
}

pub(crate) fn validate_budgets(budgets: &Budgets, errors: &mut Vec<String>) {
    for (key, budget) in budgets.iter() {
        if !budget.ideal_amount.is_some_and(|amount| amount > 0.0) {
            errors.push(format!(
                "budget \"{key}\": ideal amount must be a positive number"
            ));
        }
    }
}

pub(crate) fn validate_subtransaction_types(
    types: &[SubtransactionType],
    errors: &mut Vec<String>,
) {
    for (index, subtransaction) in types.iter().enumerate() {
        if !subtransaction.ideal_amount.is_some_and(|amount| amount > 0.0) {
            errors.push(format!(
                "sub-transaction type #{}: ideal amount must be a positive number",
                index + 1
            ));
        }
    }

    if subtransactions::has_duplicate_names(types) {
        errors.push("sub-transaction type names must be unique".to_string());
    }
}

pub(crate) fn validate_ops(ops: &[TransactionOp], errors: &mut Vec<String>) {
    for (index, op) in ops.iter().enumerate() {
        match op {
            TransactionOp::Create(create) => {
                if create.transaction_subcategory_id <= 0 {
                    errors.push(format!("new transaction #{}: missing subcategory", index + 1));
                }
                if !(create.amount > 0.0) {
                    errors.push(format!("new transaction #{}: invalid amount", index + 1));
                }
            }
            TransactionOp::Update(update) => {
                if let Some(amount) = update.patch.amount
                    && !(amount > 0.0)
                {
                    errors.push(format!(
                        "transaction edit #{}: invalid amount",
                        index + 1
                    ));
                }
            }
            TransactionOp::Delete(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_types::{CreateOp, TransactionPatch, UpdateOp};

    fn valid_user() -> UserForm {
        UserForm {
            name: "Ana".to_string(),
            email: "ana@mail.com".to_string(),
            salary_day: "15".to_string(),
            telegram_user_id: "42".to_string(),
        }
    }

    #[test]
    fn valid_user_produces_no_errors() {
        let mut errors = Vec::new();
        validate_user(&valid_user(), "31", &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn salary_day_must_fit_the_configured_range() {
        let mut errors = Vec::new();
        let user = UserForm {
            salary_day: "32".to_string(),
            ..valid_user()
        };
        validate_user(&user, "31", &mut errors);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("between 1 and 31"));
    }

    #[test]
    fn non_integer_salary_day_is_rejected() {
        for raw in ["", "5.5", "abc"] {
            let mut errors = Vec::new();
            let user = UserForm {
                salary_day: raw.to_string(),
                ..valid_user()
            };
            validate_user(&user, "31", &mut errors);
            assert_eq!(errors.len(), 1, "salary_day {raw:?} should be rejected");
        }
    }

    #[test]
    fn unparseable_day_limit_falls_back_to_31() {
        let mut errors = Vec::new();
        let user = UserForm {
            salary_day: "31".to_string(),
            ..valid_user()
        };
        validate_user(&user, "banana", &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn update_amounts_must_be_positive_when_present() {
        let ops = vec![
            TransactionOp::Update(UpdateOp {
                transaction_id: 1,
                patch: TransactionPatch {
                    amount: Some(-3.0),
                    ..TransactionPatch::default()
                },
            }),
            TransactionOp::Update(UpdateOp {
                transaction_id: 2,
                patch: TransactionPatch {
                    description: Some(Some("sin monto".to_string())),
                    ..TransactionPatch::default()
                },
            }),
        ];

        let mut errors = Vec::new();
        validate_ops(&ops, &mut errors);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn create_ops_need_subcategory_and_amount() {
        let ops = vec![TransactionOp::Create(CreateOp {
            client_id: "tmp-1".to_string(),
            transaction_subcategory_id: 0,
            amount: 0.0,
            transaction_date: None,
            description: None,
        })];

        let mut errors = Vec::new();
        validate_ops(&ops, &mut errors);
        assert_eq!(errors.len(), 2);
    }
}
