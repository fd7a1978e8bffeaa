use std::cmp::Ordering;

use super::Item;

/// Ordering used to pick the collection: the first item after sorting wins.
pub type CollectionOrder = fn(&Item, &Item) -> Ordering;

/// A name group split into the presumed collection and the candidate episodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub collection: &'a Item,
    pub episodes: Vec<&'a Item>,
}

/// Larger items sort first.
///
/// A bundle of episodes is assumed to be bigger than any single episode taken from it.
#[must_use]
pub fn largest_first(a: &Item, b: &Item) -> Ordering {
    b.size_bytes.cmp(&a.size_bytes)
}

/// Sort a group with the given ordering and split off the head as the collection.
///
/// The sort is stable so equal items keep their input order.
/// Returns `None` for an empty group.
#[must_use]
pub fn select_collection(items: &[Item], order: CollectionOrder) -> Option<Candidate<'_>> {
    let mut sorted: Vec<&Item> = items.iter().collect();
    sorted.sort_by(|a, b| order(a, b));

    let mut sorted = sorted.into_iter();
    let collection = sorted.next()?;
    Some(Candidate {
        collection,
        episodes: sorted.collect(),
    })
}
