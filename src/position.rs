// This file is part of safeshell-syntax.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Node identifiers and the position map (layer L1).
//!
//! Every AST node may carry an optional [`NodeId`], issued by a per-parse
//! [`NodeIdGenerator`]. Ids are unique only within one parse; a node that
//! receives an id also has its [`Span`] recorded in the [`PositionMap`], so
//! downstream tools can highlight source regions without walking the tree.

use std::collections::HashMap;

use crate::source::Span;

/// An opaque, monotonically increasing identifier issued by one parse.
///
/// `NodeId` doubles as the token identifier mentioned in spec terminology
/// ("TokenId / NodeId"): both tokens and AST nodes are tagged from the same
/// generator, since a token's id and the node it becomes share a span.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Returns the raw integer value. Callers must not depend on any
    /// meaning beyond "unique within one parse, monotonically increasing in
    /// issuance order".
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Issues unique, increasing [`NodeId`]s for one parse.
///
/// A generator is owned by exactly one `Lexer`/`Parser` pair and never
/// shared across parses; there is no global counter.
#[derive(Clone, Debug, Default)]
pub struct NodeIdGenerator {
    next: u64,
}

impl NodeIdGenerator {
    pub fn new() -> Self {
        NodeIdGenerator { next: 0 }
    }

    /// Issues the next id and advances the counter.
    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

/// Side-table associating [`NodeId`]s with their source [`Span`].
///
/// The parser is the only writer during one parse; after parsing completes,
/// the caller owns the map and may augment it (e.g. a later stage that
/// synthesizes nodes of its own), but within a single parse the keys are a
/// subset of the ids the returned AST actually carries.
#[derive(Clone, Debug, Default)]
pub struct PositionMap {
    entries: HashMap<NodeId, Span>,
}

impl PositionMap {
    pub fn new() -> Self {
        PositionMap {
            entries: HashMap::new(),
        }
    }

    pub fn set(&mut self, id: NodeId, span: Span) {
        self.entries.insert(id, span);
    }

    pub fn get(&self, id: NodeId) -> Option<Span> {
        self.entries.get(&id).copied()
    }

    pub fn has(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> impl Iterator<Item = (NodeId, Span)> + '_ {
        self.entries.iter().map(|(&id, &span)| (id, span))
    }

    /// The union span of two recorded ids: the start of `start_id`'s span to
    /// the end of `end_id`'s span. Returns `None` if either id was never
    /// recorded.
    pub fn span(&self, start_id: NodeId, end_id: NodeId) -> Option<Span> {
        let start = self.get(start_id)?;
        let end = self.get(end_id)?;
        Some(start.union(&end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Position;

    fn span(a: usize, b: usize) -> Span {
        Span::new(
            Position { line: 1, column: (a + 1) as u32, offset: a },
            Position { line: 1, column: (b + 1) as u32, offset: b },
        )
    }

    #[test]
    fn generator_issues_increasing_ids() {
        let mut gen = NodeIdGenerator::new();
        let a = gen.next_id();
        let b = gen.next_id();
        assert!(a.value() < b.value());
    }

    #[test]
    fn map_round_trips_spans() {
        let mut gen = NodeIdGenerator::new();
        let mut map = PositionMap::new();
        let id = gen.next_id();
        assert!(!map.has(id));
        map.set(id, span(0, 3));
        assert!(map.has(id));
        assert_eq!(map.get(id), Some(span(0, 3)));
        assert_eq!(map.size(), 1);
        map.clear();
        assert_eq!(map.size(), 0);
    }

    #[test]
    fn span_helper_unions_two_ids() {
        let mut gen = NodeIdGenerator::new();
        let mut map = PositionMap::new();
        let start_id = gen.next_id();
        let end_id = gen.next_id();
        map.set(start_id, span(0, 2));
        map.set(end_id, span(5, 9));
        let union = map.span(start_id, end_id).unwrap();
        assert_eq!(union.start.offset, 0);
        assert_eq!(union.end.offset, 9);
    }

    #[test]
    fn span_helper_missing_id_is_none() {
        let gen_map = PositionMap::new();
        let bogus = NodeId(42);
        assert_eq!(gen_map.span(bogus, bogus), None);
    }
}
