use std::collections::HashSet;

use crate::constants::MIN_AUTHORIZED_PHONE_LEN;
use crate::types::{StaffRecord, StudentRecord};

/// Phones allowed to log in: staff phones, then parent phones, deduplicated in first-seen order.
pub fn authorized_phones(staff: &[StaffRecord], students: &[StudentRecord]) -> Vec<String> {
    let candidates = staff
        .iter()
        .map(|s| s.phone.as_str())
        .chain(students.iter().map(|s| s.parent_phone.as_str()));

    let mut seen = HashSet::new();
    candidates
        .filter(|p| p.chars().count() >= MIN_AUTHORIZED_PHONE_LEN)
        .filter(|p| seen.insert(*p))
        .map(str::to_string)
        .collect()
}
