use crate::domain::models::{BusinessKey, Table};
use std::collections::HashSet;

pub fn key_set(table: &Table) -> HashSet<BusinessKey> {
    table.rows().iter().map(BusinessKey::of).collect()
}

/// Rows of `new_table` whose business key does not occur in `old_table`.
///
/// Rows sharing a key inside `new_table` are all kept; only membership in the
/// old key set removes a row.
pub fn diff(new_table: &Table, old_table: &Table) -> Table {
    if old_table.is_empty() {
        return new_table.clone();
    }
    let seen = key_set(old_table);
    new_table.retain_rows(|row| !seen.contains(&BusinessKey::of(row)))
}
