use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::query::Hit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortKey {
    #[default]
    None,
    Type,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }
}

/// Orders `hits` in place. `SortKey::None` leaves arrival order untouched.
/// The sort is stable and the direction reverses the comparator rather than
/// the list, so equal keys keep their relative arrival order either way.
pub fn apply(hits: &mut [Hit], spec: SortSpec) {
    let compare: fn(&Hit, &Hit) -> Ordering = match spec.key {
        SortKey::None => return,
        SortKey::Type => |lhs, rhs| lhs.type_label.cmp(&rhs.type_label),
        // Lexical comparison of the fixed-width formatted timestamp.
        SortKey::Date => |lhs, rhs| lhs.modified.cmp(&rhs.modified),
    };

    match spec.direction {
        SortDirection::Asc => hits.sort_by(compare),
        SortDirection::Desc => hits.sort_by(|lhs, rhs| compare(lhs, rhs).reverse()),
    }
}
