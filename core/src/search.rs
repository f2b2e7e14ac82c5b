//! Backtracking match search.
//!
//! The query is flattened into one step sequence,
//! `primary <context> context <scope> scope`, and walked against the trie
//! depth-first. At each node the three branches are tried in
//! [`BranchOrder`](crate::BranchOrder) sequence. A node entered through a
//! wildcard edge may keep binding query tokens: it first tries to continue with
//! a one-token binding, then two, and so on, until its segment runs out.
//!
//! Recursion happens only when the search descends an edge, so the stack depth
//! is bounded by the height of the trie, not by the length of the query.

use crate::node::Node;
use crate::pattern::EdgeRef;
use crate::trace::{Branch, TraceStep};
use crate::{BranchOrder, NodeId, PatternKey, PatternToken, QueryKey, Segment};
use crate::{SEG_CONTEXT, SEG_SCOPE, WILD_ANY};
use std::ops::Range;

// ═══════════════════════════════════════════════════════════════════════════════
// Query steps
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step<'q> {
    Word(&'q str),
    /// An empty query segment. Only a wildcard can bind it.
    Blank,
    Context,
    Scope,
}

impl Step<'_> {
    fn text(&self) -> &str {
        match self {
            Step::Word(w) => w,
            Step::Blank => WILD_ANY,
            Step::Context => SEG_CONTEXT,
            Step::Scope => SEG_SCOPE,
        }
    }

    fn is_bindable(&self) -> bool {
        matches!(self, Step::Word(_) | Step::Blank)
    }
}

/// Flatten a query into steps. Empty segments become a single [`Step::Blank`].
pub(crate) fn flatten(query: &QueryKey) -> Vec<Step<'_>> {
    let mut steps = Vec::new();
    for segment in Segment::ALL {
        match segment {
            Segment::Primary => {}
            Segment::Context => steps.push(Step::Context),
            Segment::Scope => steps.push(Step::Scope),
        }
        let tokens = query.segment(segment);
        if tokens.is_empty() {
            steps.push(Step::Blank);
        } else {
            steps.extend(tokens.iter().map(|t| Step::Word(t)));
        }
    }
    steps
}

// ═══════════════════════════════════════════════════════════════════════════════
// Searcher
// ═══════════════════════════════════════════════════════════════════════════════

struct Searcher<'q> {
    steps: &'q [Step<'q>],
    order: [Branch; 3],
    /// Closed wildcard bindings, as step ranges.
    spans: Vec<(Segment, Range<usize>)>,
    /// Edges on the current root-to-node path.
    walked: Vec<EdgeRef<'q>>,
    trace: Option<Vec<TraceStep>>,
}

impl<'q> Searcher<'q> {
    /// Continue from `node`, positioned at step `pos`.
    ///
    /// `star` is the first step bound by the wildcard edge that led here, or
    /// `None` if `node` was entered through a literal or separator edge.
    fn visit<'a, V>(
        &mut self,
        node: &'a Node<V>,
        pos: usize,
        star: Option<usize>,
        segment: Segment,
        depth: usize,
    ) -> Option<&'a Node<V>> {
        let mut end = pos;
        let mut extension = None;
        loop {
            let found = self.expand(node, end, star.map(|s| s..end), segment, depth);
            if let Some(idx) = extension {
                self.settle(idx, found.is_some());
            }
            if found.is_some() {
                return found;
            }
            let can_extend = star.is_some() && self.steps.get(end).is_some_and(Step::is_bindable);
            if !can_extend {
                return None;
            }
            extension = self.record(depth, node.id, Branch::Extend, None, end);
            end += 1;
        }
    }

    /// Try every child branch of `node` for step `pos`, in priority order.
    fn expand<'a, V>(
        &mut self,
        node: &'a Node<V>,
        pos: usize,
        open: Option<Range<usize>>,
        segment: Segment,
        depth: usize,
    ) -> Option<&'a Node<V>> {
        let Some(&step) = self.steps.get(pos) else {
            node.payload.as_ref()?;
            self.close(segment, open);
            return Some(node);
        };

        for branch in self.order {
            let edge = match (branch, step) {
                (Branch::WildOne, s) if s.is_bindable() => EdgeRef::WildOne,
                (Branch::WildAny, s) if s.is_bindable() => EdgeRef::WildAny,
                (Branch::Literal, Step::Word(w)) => EdgeRef::Word(w),
                (Branch::Literal, Step::Context) => EdgeRef::Context,
                (Branch::Literal, Step::Scope) => EdgeRef::Scope,
                _ => continue,
            };
            let Some(child) = node.child(edge) else {
                continue;
            };

            let marks = (self.spans.len(), self.walked.len());
            let traced = self.record(depth, node.id, branch, Some(edge), pos);
            self.close(segment, open.clone());
            self.walked.push(edge);

            let (next_segment, star) = match step {
                Step::Context => (Segment::Context, None),
                Step::Scope => (Segment::Scope, None),
                _ if edge.is_wildcard() => (segment, Some(pos)),
                _ => (segment, None),
            };
            let found = self.visit(child, pos + 1, star, next_segment, depth + 1);

            if let Some(idx) = traced {
                self.settle(idx, found.is_some());
            }
            if found.is_some() {
                return found;
            }
            self.spans.truncate(marks.0);
            self.walked.truncate(marks.1);
        }
        None
    }

    fn close(&mut self, segment: Segment, open: Option<Range<usize>>) {
        if let Some(range) = open {
            if !range.is_empty() {
                self.spans.push((segment, range));
            }
        }
    }

    fn record(
        &mut self,
        depth: usize,
        node: NodeId,
        branch: Branch,
        edge: Option<EdgeRef<'_>>,
        pos: usize,
    ) -> Option<usize> {
        let trace = self.trace.as_mut()?;
        trace.push(TraceStep {
            depth,
            node,
            branch,
            edge: edge.map(EdgeRef::to_edge),
            token: self.steps[pos].text().to_owned(),
            matched: false,
        });
        Some(trace.len() - 1)
    }

    fn settle(&mut self, idx: usize, matched: bool) {
        if let Some(step) = self.trace.as_mut().and_then(|t| t.get_mut(idx)) {
            step.matched = matched;
        }
    }
}

/// Run a search from `root`. The trace is empty unless `traced` is set.
pub(crate) fn run<'a, V>(
    root: &'a Node<V>,
    query: &QueryKey,
    order: BranchOrder,
    traced: bool,
) -> (Option<Match<'a, V>>, Vec<TraceStep>) {
    let steps = flatten(query);
    let mut searcher = Searcher {
        steps: &steps,
        order: order.branches(),
        spans: Vec::new(),
        walked: Vec::new(),
        trace: traced.then(Vec::new),
    };

    let found = searcher.visit(root, 0, None, Segment::Primary, 0);
    let result = found.and_then(|node| {
        let payload = node.payload.as_ref()?;
        let mut captures: [Vec<Vec<String>>; 3] = Default::default();
        for (segment, range) in &searcher.spans {
            captures[segment.index()].push(
                steps[range.clone()]
                    .iter()
                    .filter(|s| **s != Step::Blank)
                    .map(|s| s.text().to_owned())
                    .collect(),
            );
        }
        Some(Match {
            node: node.id,
            payload,
            pattern: PatternKey::from_edges(searcher.walked.iter().copied()),
            query: query.clone(),
            captures,
        })
    });
    (result, searcher.trace.unwrap_or_default())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Match results
// ═══════════════════════════════════════════════════════════════════════════════

/// A successful search, borrowing the payload from the store.
///
/// Captures are listed per segment in left-to-right order, one entry per
/// wildcard in the matched pattern. A wildcard that bound an empty query
/// segment has an empty capture.
#[derive(Debug)]
pub struct Match<'a, V> {
    node: NodeId,
    payload: &'a V,
    pattern: PatternKey,
    query: QueryKey,
    captures: [Vec<Vec<String>>; 3],
}

impl<'a, V> Match<'a, V> {
    /// Terminal node of the matched path.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The stored payload.
    #[must_use]
    pub fn payload(&self) -> &'a V {
        self.payload
    }

    /// The pattern that matched, wildcards included.
    #[must_use]
    pub fn pattern(&self) -> &PatternKey {
        &self.pattern
    }

    /// The query that was searched.
    #[must_use]
    pub fn query(&self) -> &QueryKey {
        &self.query
    }

    /// Tokens bound by each wildcard of `segment`.
    #[must_use]
    pub fn captures(&self, segment: Segment) -> &[Vec<String>] {
        &self.captures[segment.index()]
    }

    /// The `index`-th capture of `segment` joined with spaces (0-based).
    #[must_use]
    pub fn capture_text(&self, segment: Segment, index: usize) -> Option<String> {
        self.captures(segment).get(index).map(|c| c.join(" "))
    }

    /// Literal words of the matched pattern in `segment`, wildcards skipped.
    #[must_use]
    pub fn literal_path(&self, segment: Segment) -> Vec<&str> {
        literal_words(&self.pattern, segment)
    }

    /// Detach from the store by cloning the payload.
    #[must_use]
    pub fn into_owned(self) -> OwnedMatch<V>
    where
        V: Clone,
    {
        OwnedMatch {
            node: self.node,
            payload: self.payload.clone(),
            pattern: self.pattern,
            query: self.query,
            captures: self.captures,
        }
    }
}

/// A [`Match`] that owns its payload, for use after the store lock is released.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OwnedMatch<V> {
    node: NodeId,
    payload: V,
    pattern: PatternKey,
    query: QueryKey,
    captures: [Vec<Vec<String>>; 3],
}

impl<V> OwnedMatch<V> {
    /// Terminal node of the matched path.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The payload.
    #[must_use]
    pub fn payload(&self) -> &V {
        &self.payload
    }

    /// Consume the match, returning the payload.
    #[must_use]
    pub fn into_payload(self) -> V {
        self.payload
    }

    /// The pattern that matched.
    #[must_use]
    pub fn pattern(&self) -> &PatternKey {
        &self.pattern
    }

    /// The query that was searched.
    #[must_use]
    pub fn query(&self) -> &QueryKey {
        &self.query
    }

    /// Tokens bound by each wildcard of `segment`.
    #[must_use]
    pub fn captures(&self, segment: Segment) -> &[Vec<String>] {
        &self.captures[segment.index()]
    }

    /// The `index`-th capture of `segment` joined with spaces (0-based).
    #[must_use]
    pub fn capture_text(&self, segment: Segment, index: usize) -> Option<String> {
        self.captures(segment).get(index).map(|c| c.join(" "))
    }

    /// Literal words of the matched pattern in `segment`.
    #[must_use]
    pub fn literal_path(&self, segment: Segment) -> Vec<&str> {
        literal_words(&self.pattern, segment)
    }
}

fn literal_words(pattern: &PatternKey, segment: Segment) -> Vec<&str> {
    pattern
        .segment(segment)
        .iter()
        .filter_map(PatternToken::as_word)
        .collect()
}
