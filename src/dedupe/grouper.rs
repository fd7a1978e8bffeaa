use std::collections::HashMap;

use super::Item;

/// Items keyed by their display name.
pub type NameGroups = HashMap<String, Vec<Item>>;

/// Group items by identical display name.
///
/// Items keep their input order within each group.
/// Items with an empty name are dropped.
#[must_use]
pub fn group_by_name(items: impl IntoIterator<Item = Item>) -> NameGroups {
    let mut groups = NameGroups::new();
    for item in items {
        if item.name.is_empty() {
            continue;
        }
        groups.entry(item.name.clone()).or_default().push(item);
    }
    groups
}
