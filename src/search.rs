//! Title search over hymn lists.
//!
//! A listing page shows the same hymns twice, as table rows and as cards. Both
//! are filtered with the same rule: case-insensitive substring match on the
//! title, and an empty (or all-whitespace) query shows everything.

use crate::content::Hymn;

/// Anything with a searchable title.
pub trait Searchable {
    fn title(&self) -> &str;
}

impl Searchable for &str {
    fn title(&self) -> &str {
        self
    }
}

impl Searchable for String {
    fn title(&self) -> &str {
        self
    }
}

impl Searchable for Hymn {
    fn title(&self) -> &str {
        &self.title
    }
}

/// How a hymn is presented in a listing. Filtering treats both the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTarget {
    Row,
    Card,
}

/// A listing entry: a title shown as a row or a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingItem {
    pub title: String,
    pub target: SearchTarget,
}

impl Searchable for ListingItem {
    fn title(&self) -> &str {
        &self.title
    }
}

/// Normalized query: trimmed and lower-cased. `None` matches everything.
fn normalize_query(query: &str) -> Option<String> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        None
    } else {
        Some(q)
    }
}

/// Whether a single title matches `query`.
pub fn matches(query: &str, title: &str) -> bool {
    match normalize_query(query) {
        Some(q) => title.to_lowercase().contains(&q),
        None => true,
    }
}

/// Visibility of each item for `query`, in item order.
///
/// ```rust
/// use hymnal::search::filter;
///
/// let titles = ["Amazing Grace", "Grace Abounding", "Holy, Holy, Holy"];
/// assert_eq!(filter("grace", &titles), vec![true, true, false]);
/// assert_eq!(filter("", &titles), vec![true, true, true]);
/// ```
pub fn filter<T: Searchable>(query: &str, items: &[T]) -> Vec<bool> {
    let q = normalize_query(query);
    items
        .iter()
        .map(|item| match &q {
            Some(q) => item.title().to_lowercase().contains(q.as_str()),
            None => true,
        })
        .collect()
}
