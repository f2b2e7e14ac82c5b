//! Tokens, edges and three-segment keys.
//!
//! Callers hand in text tokens. Pattern segments may spell wildcards as
//! [`WILD_ONE`] and [`WILD_ANY`]; those are parsed into [`PatternToken`]
//! variants here and never reach the trie as strings. Separator spellings are
//! rejected everywhere, and query segments reject the wildcard spellings too.

use crate::{EmptySegmentPolicy, StoreError};
use std::fmt;

/// Spelling of the higher-priority wildcard in pattern text.
pub const WILD_ONE: &str = "_";

/// Spelling of the lower-priority wildcard in pattern text.
pub const WILD_ANY: &str = "*";

/// Reserved spelling of the primary → context separator.
pub const SEG_CONTEXT: &str = "<context>";

/// Reserved spelling of the context → scope separator.
pub const SEG_SCOPE: &str = "<scope>";

/// Split text on whitespace into tokens.
///
/// The engine itself never tokenizes; this is the convention used by the
/// config loader and the CLI.
#[must_use]
pub fn split_tokens(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

fn is_separator_spelling(raw: &str) -> bool {
    raw.eq_ignore_ascii_case(SEG_CONTEXT) || raw.eq_ignore_ascii_case(SEG_SCOPE)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Segment
// ═══════════════════════════════════════════════════════════════════════════════

/// One of the three ordered parts of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Segment {
    /// The main input.
    Primary,
    /// What the input is responding to.
    Context,
    /// The enclosing scope the input belongs to.
    Scope,
}

impl Segment {
    /// All segments in path order.
    pub const ALL: [Segment; 3] = [Segment::Primary, Segment::Context, Segment::Scope];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Context => 1,
            Self::Scope => 2,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Primary => "primary",
            Self::Context => "context",
            Self::Scope => "scope",
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Edges
// ═══════════════════════════════════════════════════════════════════════════════

/// Label of a child link in the trie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Edge {
    /// A literal caller token.
    Word(String),
    /// The `_` wildcard.
    WildOne,
    /// The `*` wildcard.
    WildAny,
    /// Boundary between the primary and context segments.
    Context,
    /// Boundary between the context and scope segments.
    Scope,
}

impl Edge {
    /// Returns `true` for `WildOne` and `WildAny`.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::WildOne | Self::WildAny)
    }

    pub(crate) fn borrowed(&self) -> EdgeRef<'_> {
        match self {
            Self::Word(w) => EdgeRef::Word(w),
            Self::WildOne => EdgeRef::WildOne,
            Self::WildAny => EdgeRef::WildAny,
            Self::Context => EdgeRef::Context,
            Self::Scope => EdgeRef::Scope,
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.borrowed(), f)
    }
}

/// Borrowed form of [`Edge`], used on the hot path to avoid allocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EdgeRef<'a> {
    Word(&'a str),
    WildOne,
    WildAny,
    Context,
    Scope,
}

impl EdgeRef<'_> {
    pub(crate) fn is_wildcard(self) -> bool {
        matches!(self, Self::WildOne | Self::WildAny)
    }

    pub(crate) fn to_edge(self) -> Edge {
        match self {
            Self::Word(w) => Edge::Word(w.to_owned()),
            Self::WildOne => Edge::WildOne,
            Self::WildAny => Edge::WildAny,
            Self::Context => Edge::Context,
            Self::Scope => Edge::Scope,
        }
    }
}

impl fmt::Display for EdgeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(w) => f.write_str(w),
            Self::WildOne => f.write_str(WILD_ONE),
            Self::WildAny => f.write_str(WILD_ANY),
            Self::Context => f.write_str(SEG_CONTEXT),
            Self::Scope => f.write_str(SEG_SCOPE),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Pattern tokens and keys
// ═══════════════════════════════════════════════════════════════════════════════

/// One token of a pattern segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatternToken {
    /// Matches exactly this caller token.
    Word(String),
    /// Binds one or more tokens, tried before literals.
    WildOne,
    /// Binds one or more tokens, tried after literals.
    WildAny,
}

impl PatternToken {
    fn parse(raw: &str, segment: Segment) -> Result<Self, StoreError> {
        match raw {
            WILD_ONE => Ok(Self::WildOne),
            WILD_ANY => Ok(Self::WildAny),
            _ if is_separator_spelling(raw) => Err(StoreError::ReservedToken {
                token: raw.to_owned(),
                segment,
            }),
            _ => Ok(Self::Word(raw.to_owned())),
        }
    }

    /// Returns the literal word, or `None` for a wildcard.
    #[must_use]
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Self::Word(w) => Some(w),
            Self::WildOne | Self::WildAny => None,
        }
    }

    pub(crate) fn edge_ref(&self) -> EdgeRef<'_> {
        match self {
            Self::Word(w) => EdgeRef::Word(w),
            Self::WildOne => EdgeRef::WildOne,
            Self::WildAny => EdgeRef::WildAny,
        }
    }
}

impl fmt::Display for PatternToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.edge_ref(), f)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for PatternToken {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A parsed three-segment pattern.
///
/// Segments may be empty here; the store's [`EmptySegmentPolicy`] decides
/// what an empty segment means at insertion time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PatternKey {
    primary: Vec<PatternToken>,
    context: Vec<PatternToken>,
    scope: Vec<PatternToken>,
}

impl PatternKey {
    /// Parse a pattern from caller tokens.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ReservedToken`] if a token spells a separator.
    pub fn new<S: AsRef<str>>(
        primary: &[S],
        context: &[S],
        scope: &[S],
    ) -> Result<Self, StoreError> {
        let parse = |tokens: &[S], segment| {
            tokens
                .iter()
                .map(|t| PatternToken::parse(t.as_ref(), segment))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            primary: parse(primary, Segment::Primary)?,
            context: parse(context, Segment::Context)?,
            scope: parse(scope, Segment::Scope)?,
        })
    }

    /// Tokens of one segment.
    #[must_use]
    pub fn segment(&self, segment: Segment) -> &[PatternToken] {
        match segment {
            Segment::Primary => &self.primary,
            Segment::Context => &self.context,
            Segment::Scope => &self.scope,
        }
    }

    /// Number of edges in the flattened path, separators included.
    #[must_use]
    pub fn path_len(&self) -> usize {
        self.primary.len() + self.context.len() + self.scope.len() + 2
    }

    /// Apply the empty-segment policy.
    pub(crate) fn normalized(mut self, policy: EmptySegmentPolicy) -> Result<Self, StoreError> {
        for segment in Segment::ALL {
            let tokens = match segment {
                Segment::Primary => &mut self.primary,
                Segment::Context => &mut self.context,
                Segment::Scope => &mut self.scope,
            };
            if tokens.is_empty() {
                match policy {
                    EmptySegmentPolicy::Wildcard => tokens.push(PatternToken::WildAny),
                    EmptySegmentPolicy::Reject => {
                        return Err(StoreError::EmptySegment { segment })
                    }
                }
            }
        }
        Ok(self)
    }

    /// The flattened edge path: `primary <context> context <scope> scope`.
    pub(crate) fn edges(&self) -> impl Iterator<Item = EdgeRef<'_>> {
        self.primary
            .iter()
            .map(PatternToken::edge_ref)
            .chain(std::iter::once(EdgeRef::Context))
            .chain(self.context.iter().map(PatternToken::edge_ref))
            .chain(std::iter::once(EdgeRef::Scope))
            .chain(self.scope.iter().map(PatternToken::edge_ref))
    }

    /// Rebuild a key from a walked edge path.
    pub(crate) fn from_edges<'e>(edges: impl IntoIterator<Item = EdgeRef<'e>>) -> Self {
        let mut key = Self::default();
        let mut current = &mut key.primary;
        for edge in edges {
            match edge {
                EdgeRef::Word(w) => current.push(PatternToken::Word(w.to_owned())),
                EdgeRef::WildOne => current.push(PatternToken::WildOne),
                EdgeRef::WildAny => current.push(PatternToken::WildAny),
                EdgeRef::Context => current = &mut key.context,
                EdgeRef::Scope => current = &mut key.scope,
            }
        }
        key
    }
}

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_segments(f, Segment::ALL.map(|s| self.segment(s)))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Query keys
// ═══════════════════════════════════════════════════════════════════════════════

/// A validated three-segment query: caller words only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryKey {
    primary: Vec<String>,
    context: Vec<String>,
    scope: Vec<String>,
}

impl QueryKey {
    /// Validate a query from caller tokens.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ReservedToken`] if a token spells a wildcard or
    /// a separator.
    pub fn new<S: AsRef<str>>(
        primary: &[S],
        context: &[S],
        scope: &[S],
    ) -> Result<Self, StoreError> {
        let check = |tokens: &[S], segment| {
            tokens
                .iter()
                .map(|t| {
                    let raw = t.as_ref();
                    if raw == WILD_ONE || raw == WILD_ANY || is_separator_spelling(raw) {
                        Err(StoreError::ReservedToken {
                            token: raw.to_owned(),
                            segment,
                        })
                    } else {
                        Ok(raw.to_owned())
                    }
                })
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            primary: check(primary, Segment::Primary)?,
            context: check(context, Segment::Context)?,
            scope: check(scope, Segment::Scope)?,
        })
    }

    /// Tokens of one segment.
    #[must_use]
    pub fn segment(&self, segment: Segment) -> &[String] {
        match segment {
            Segment::Primary => &self.primary,
            Segment::Context => &self.context,
            Segment::Scope => &self.scope,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_segments(f, Segment::ALL.map(|s| self.segment(s)))
    }
}

/// Writes `a b : c : d`, the `:`-separated form used in logs and CLI output.
fn write_segments<T: fmt::Display>(f: &mut fmt::Formatter<'_>, segments: [&[T]; 3]) -> fmt::Result {
    for (i, tokens) in segments.iter().enumerate() {
        if i > 0 {
            f.write_str(" : ")?;
        }
        for (j, token) in tokens.iter().enumerate() {
            if j > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{token}")?;
        }
    }
    Ok(())
}
