use std::fmt;

use itertools::Itertools;

use nwarust_utilities::Key;
use nwarust_utilities::KeyInterner;

/// The role of a position in a nested word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PositionKind {
    Call,
    Internal,
    Return,
}

/// A single position of a nested word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub symbol: Key,
    pub kind: PositionKind,
}

/// A nested word: a sequence of symbols where every position is a call, an
/// internal or a return position. Calls and returns are matched like
/// parentheses, unmatched ones are pending.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NestedWord {
    positions: Vec<Position>,
}

impl NestedWord {
    pub fn new() -> NestedWord {
        NestedWord::default()
    }

    pub fn append_call(&mut self, symbol: Key) {
        self.append(symbol, PositionKind::Call);
    }

    pub fn append_internal(&mut self, symbol: Key) {
        self.append(symbol, PositionKind::Internal);
    }

    pub fn append_return(&mut self, symbol: Key) {
        self.append(symbol, PositionKind::Return);
    }

    pub fn append(&mut self, symbol: Key, kind: PositionKind) {
        self.positions.push(Position { symbol, kind });
    }

    /// Appends all positions of the other word.
    pub fn extend(&mut self, other: &NestedWord) {
        self.positions.extend_from_slice(&other.positions);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> + '_ {
        self.positions.iter()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns the word read backwards, in which call positions become return
    /// positions and vice versa.
    pub fn reversed(&self) -> NestedWord {
        NestedWord {
            positions: self
                .positions
                .iter()
                .rev()
                .map(|position| Position {
                    symbol: position.symbol,
                    kind: match position.kind {
                        PositionKind::Call => PositionKind::Return,
                        PositionKind::Internal => PositionKind::Internal,
                        PositionKind::Return => PositionKind::Call,
                    },
                })
                .collect(),
        }
    }

    /// Returns the index of the first return position that has no matching
    /// call, if any.
    pub fn first_pending_return(&self) -> Option<usize> {
        let mut depth = 0usize;
        for (index, position) in self.positions.iter().enumerate() {
            match position.kind {
                PositionKind::Call => depth += 1,
                PositionKind::Internal => {}
                PositionKind::Return => {
                    if depth == 0 {
                        return Some(index);
                    }
                    depth -= 1;
                }
            }
        }

        None
    }

    /// Returns the indices of the calls that are never matched by a return.
    pub fn pending_calls(&self) -> Vec<usize> {
        let mut calls = Vec::new();
        for (index, position) in self.positions.iter().enumerate() {
            match position.kind {
                PositionKind::Call => calls.push(index),
                PositionKind::Internal => {}
                PositionKind::Return => {
                    calls.pop();
                }
            }
        }

        calls
    }

    /// Returns true iff every call is matched by a return and vice versa.
    pub fn is_well_matched(&self) -> bool {
        self.first_pending_return().is_none() && self.pending_calls().is_empty()
    }

    /// Returns an adaptor that prints the word with the names of its symbols,
    /// calls are prefixed with `<` and returns suffixed with `>`.
    pub fn display<'a>(&'a self, interner: &'a KeyInterner) -> NestedWordDisplay<'a> {
        NestedWordDisplay { word: self, interner }
    }
}

impl FromIterator<Position> for NestedWord {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        NestedWord {
            positions: iter.into_iter().collect(),
        }
    }
}

pub struct NestedWordDisplay<'a> {
    word: &'a NestedWord,
    interner: &'a KeyInterner,
}

impl fmt::Display for NestedWordDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.word.iter().format_with(" ", |position, f| {
                let name = self.interner.display(position.symbol);
                match position.kind {
                    PositionKind::Call => f(&format_args!("<{name}")),
                    PositionKind::Internal => f(&format_args!("{name}")),
                    PositionKind::Return => f(&format_args!("{name}>")),
                }
            })
        )
    }
}
