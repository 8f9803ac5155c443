use std::collections::BTreeSet;

use nwarust_utilities::Key;

/// The alphabet of an automaton, never contains the epsilon or wild symbol.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolSet {
    symbols: BTreeSet<Key>,
}

impl SymbolSet {
    pub fn is_symbol(&self, symbol: Key) -> bool {
        self.symbols.contains(&symbol)
    }

    /// Adds the symbol, returns false if it was present or is a reserved key.
    pub fn add_symbol(&mut self, symbol: Key) -> bool {
        if symbol.is_reserved() {
            return false;
        }

        self.symbols.insert(symbol)
    }

    pub fn remove_symbol(&mut self, symbol: Key) -> bool {
        self.symbols.remove(&symbol)
    }

    pub fn clear_symbols(&mut self) {
        self.symbols.clear();
    }

    pub fn symbols(&self) -> impl Iterator<Item = Key> + '_ {
        self.symbols.iter().copied()
    }

    pub fn size_symbols(&self) -> usize {
        self.symbols.len()
    }
}

#[cfg(test)]
mod tests {
    use nwarust_utilities::KeyInterner;
    use nwarust_utilities::EPSILON;
    use nwarust_utilities::WILD;
    use test_log::test;

    use super::*;

    #[test]
    fn test_reserved_symbols_are_rejected() {
        let mut interner = KeyInterner::new();
        let mut set = SymbolSet::default();

        assert!(!set.add_symbol(EPSILON));
        assert!(!set.add_symbol(WILD));
        assert_eq!(set.size_symbols(), 0);

        let a = interner.key("a");
        assert!(set.add_symbol(a));
        assert!(!set.add_symbol(a));
        assert!(set.remove_symbol(a));
        assert!(!set.remove_symbol(a));
    }
}
