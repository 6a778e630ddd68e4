//! Name-uniqueness checks for sub-transaction types.
//!
//! Names are compared after trimming and case-folding. Empty names never
//! count as duplicates of each other; they are caught by other validation.

use api_types::SubtransactionType;

/// Hard cap on sub-transaction types per user.
pub const MAX_SUBTRANSACTION_TYPES: usize = 7;

pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Per-row duplicate flags for inline display. A row is flagged when another
/// position normalizes to the same non-empty name.
#[must_use]
pub fn duplicate_name_flags(types: &[SubtransactionType]) -> Vec<bool> {
    let normalized: Vec<String> = types.iter().map(|st| normalize_name(&st.name)).collect();
    normalized
        .iter()
        .enumerate()
        .map(|(index, name)| {
            !name.is_empty()
                && normalized
                    .iter()
                    .enumerate()
                    .any(|(other, other_name)| other != index && other_name == name)
        })
        .collect()
}

/// Submission gate: `true` when any two rows share a normalized name.
#[must_use]
pub fn has_duplicate_names(types: &[SubtransactionType]) -> bool {
    duplicate_name_flags(types).iter().any(|flag| *flag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> SubtransactionType {
        SubtransactionType {
            name: name.to_string(),
            ..SubtransactionType::blank()
        }
    }

    #[test]
    fn trimmed_case_folded_names_collide() {
        let types = vec![named("Rent"), named(" rent "), named("Food")];
        assert_eq!(duplicate_name_flags(&types), vec![true, true, false]);
        assert!(has_duplicate_names(&types));
    }

    #[test]
    fn empty_names_never_collide() {
        let types = vec![named(""), named("  "), named("")];
        assert_eq!(duplicate_name_flags(&types), vec![false, false, false]);
        assert!(!has_duplicate_names(&types));
    }

    #[test]
    fn unique_names_pass() {
        let types = vec![named("Rent"), named("Food")];
        assert!(!has_duplicate_names(&types));
    }
}
