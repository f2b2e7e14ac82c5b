//! Match policies.

use crate::Branch;

/// Order in which the three child branches are tried at each node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BranchOrder {
    /// `_`, then literal, then `*`.
    ///
    /// A `_` continuation shadows an equally viable literal one. Existing
    /// pattern sets are written against this order.
    #[default]
    Reference,
    /// Literal, then `_`, then `*`.
    LiteralFirst,
}

impl BranchOrder {
    pub(crate) fn branches(self) -> [Branch; 3] {
        match self {
            Self::Reference => [Branch::WildOne, Branch::Literal, Branch::WildAny],
            Self::LiteralFirst => [Branch::Literal, Branch::WildOne, Branch::WildAny],
        }
    }
}

/// What an empty segment means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EmptySegmentPolicy {
    /// In a pattern, an empty segment is a single `*`. In a query, it is a
    /// single blank token that only a wildcard can bind, with an empty
    /// capture.
    #[default]
    Wildcard,
    /// Empty segments fail with [`StoreError::EmptySegment`](crate::StoreError::EmptySegment).
    Reject,
}

/// Store-wide matching behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct MatchPolicy {
    /// Branch priority at each node.
    pub branch_order: BranchOrder,
    /// Treatment of empty segments in patterns and queries.
    pub empty_segment: EmptySegmentPolicy,
}
