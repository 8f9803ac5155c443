use std::fmt;

use log::trace;
use rustc_hash::FxHashMap;

/// An opaque identifier for states and symbols. Keys are only meaningful with
/// respect to the [KeyInterner] that produced them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(usize);

/// The reserved key for the empty input, only valid on internal transitions.
pub const EPSILON: Key = Key(0);

/// The reserved key that matches every symbol in the alphabet of an automaton.
pub const WILD: Key = Key(1);

impl Key {
    /// Returns the underlying index of this key.
    pub fn index(&self) -> usize {
        self.0
    }

    /// Returns true iff this is one of the reserved keys.
    pub fn is_reserved(&self) -> bool {
        *self == EPSILON || *self == WILD
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            EPSILON => write!(f, "#eps"),
            WILD => write!(f, "#wild"),
            Key(index) => write!(f, "#{index}"),
        }
    }
}

/// The structure from which a key was created.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeySource {
    Name(String),
    Pair(Key, Key),
    Set(Vec<Key>),
    Relation(Vec<(Key, Key)>),
}

/// Maps names and structured identities to unique keys.
///
/// Unlike a process wide table the interner has an explicit owner, typically
/// the collection of automata that share identifiers or a test fixture.
pub struct KeyInterner {
    table: FxHashMap<KeySource, Key>,
    sources: Vec<KeySource>,
}

impl KeyInterner {
    /// Creates an interner in which only the reserved keys exist.
    pub fn new() -> KeyInterner {
        let mut result = KeyInterner {
            table: FxHashMap::default(),
            sources: Vec::new(),
        };

        let epsilon = result.intern(KeySource::Name("ε".to_string()));
        let wild = result.intern(KeySource::Name("@".to_string()));
        debug_assert_eq!(epsilon, EPSILON, "The epsilon key must be the first key");
        debug_assert_eq!(wild, WILD, "The wild key must be the second key");

        result
    }

    /// Returns the key for the given name.
    pub fn key(&mut self, name: &str) -> Key {
        if let Some(key) = self.table.get(&KeySource::Name(name.to_string())) {
            return *key;
        }

        self.intern(KeySource::Name(name.to_string()))
    }

    /// Returns the key for the ordered pair (first, second).
    pub fn pair_key(&mut self, first: Key, second: Key) -> Key {
        self.intern(KeySource::Pair(first, second))
    }

    /// Returns the key for the set of the given keys, duplicates and order are ignored.
    pub fn set_key(&mut self, keys: impl IntoIterator<Item = Key>) -> Key {
        let mut elements: Vec<Key> = keys.into_iter().collect();
        elements.sort_unstable();
        elements.dedup();
        self.intern(KeySource::Set(elements))
    }

    /// Returns the key for the binary relation consisting of the given pairs.
    pub fn relation_key(&mut self, pairs: impl IntoIterator<Item = (Key, Key)>) -> Key {
        let mut elements: Vec<(Key, Key)> = pairs.into_iter().collect();
        elements.sort_unstable();
        elements.dedup();
        self.intern(KeySource::Relation(elements))
    }

    /// Returns a key that has not been handed out before, its name starts with
    /// the given prefix and is extended with `~` until it is unused.
    pub fn fresh_key(&mut self, prefix: &str) -> Key {
        let mut name = prefix.to_string();
        while self.table.contains_key(&KeySource::Name(name.clone())) {
            name.push('~');
        }

        self.intern(KeySource::Name(name))
    }

    /// Returns the key for the given name if it was interned before.
    pub fn find(&self, name: &str) -> Option<Key> {
        self.table.get(&KeySource::Name(name.to_string())).copied()
    }

    /// Returns the structure from which the given key was created.
    pub fn source(&self, key: Key) -> &KeySource {
        &self.sources[key.0]
    }

    /// Returns a human readable name for the given key.
    pub fn name(&self, key: Key) -> String {
        match self.source(key) {
            KeySource::Name(name) => name.clone(),
            KeySource::Pair(first, second) => format!("({}, {})", self.name(*first), self.name(*second)),
            KeySource::Set(elements) => {
                let names: Vec<String> = elements.iter().map(|key| self.name(*key)).collect();
                format!("{{{}}}", names.join(", "))
            }
            KeySource::Relation(pairs) => {
                let names: Vec<String> = pairs
                    .iter()
                    .map(|(first, second)| format!("({}, {})", self.name(*first), self.name(*second)))
                    .collect();
                format!("{{{}}}", names.join(", "))
            }
        }
    }

    /// Returns an adaptor that prints the name of the key.
    pub fn display(&self, key: Key) -> KeyDisplay<'_> {
        KeyDisplay { interner: self, key }
    }

    /// Returns the number of keys handed out, including the reserved keys.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true iff only the reserved keys exist.
    pub fn is_empty(&self) -> bool {
        self.sources.len() <= 2
    }

    fn intern(&mut self, source: KeySource) -> Key {
        let next = Key(self.sources.len());
        let key = *self.table.entry(source.clone()).or_insert(next);

        if key == next {
            trace!("Interned {source:?} as {key:?}");
            self.sources.push(source);
        }

        key
    }
}

impl Default for KeyInterner {
    fn default() -> Self {
        KeyInterner::new()
    }
}

/// Prints a key using the names stored in its interner.
pub struct KeyDisplay<'a> {
    interner: &'a KeyInterner,
    key: Key,
}

impl fmt::Display for KeyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.interner.name(self.key))
    }
}
