//! Global identifier interning.
//!
//! Identifiers looked up in the VM's globals table are compared far more
//! often than they are printed, so we intern them once at lex/emit time into
//! a compact [`Symbol`] and compare symbols (an integer) rather than bytes
//! for every `GBLA`/`GBLV` lookup. Interning is global and lives for the
//! process, not per-[`CodeObject`](crate::code::CodeObject) like the
//! constant-pool string interning the emitter does (see
//! `glintc-emit::Emitter::intern_str`) — the two interners solve different
//! problems and are intentionally not unified.

use ahash::AHasher;
use dashmap::DashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

/// A compact, `Copy` handle to an interned identifier string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// Interns `s`, returning the existing symbol if already known.
    pub fn intern(s: &str) -> Self {
        table().intern(s)
    }

    /// Returns the original string this symbol was interned from.
    pub fn as_str(&self) -> &'static str {
        table().resolve(*self)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

struct StringTable {
    // Hash of the string -> bucket of (leaked str, symbol index) sharing
    // that hash, for O(1) interning with explicit collision chaining.
    by_hash: DashMap<u64, Vec<(&'static str, u32)>>,
    by_index: DashMap<u32, &'static str>,
    next: AtomicU32,
}

impl StringTable {
    fn new() -> Self {
        Self {
            by_hash: DashMap::with_capacity(256),
            by_index: DashMap::with_capacity(256),
            next: AtomicU32::new(0),
        }
    }

    fn hash_of(s: &str) -> u64 {
        let mut h = AHasher::default();
        s.hash(&mut h);
        h.finish()
    }

    fn intern(&self, s: &str) -> Symbol {
        let hash = Self::hash_of(s);
        if let Some(bucket) = self.by_hash.get(&hash) {
            if let Some(entry) = bucket.iter().find(|entry| entry.0 == s) {
                return Symbol(entry.1);
            }
        }
        let idx = self.next.fetch_add(1, Ordering::Relaxed);
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        self.by_hash.entry(hash).or_default().push((leaked, idx));
        self.by_index.insert(idx, leaked);
        Symbol(idx)
    }

    fn resolve(&self, sym: Symbol) -> &'static str {
        self.by_index
            .get(&sym.0)
            .map(|r| *r)
            .expect("Symbol resolved outside its originating table")
    }
}

static TABLE: OnceLock<StringTable> = OnceLock::new();

fn table() -> &'static StringTable {
    TABLE.get_or_init(StringTable::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_string_yields_same_symbol() {
        let a = Symbol::intern("foo");
        let b = Symbol::intern("foo");
        assert_eq!(a, b);
    }

    #[test]
    fn interning_different_strings_yields_different_symbols() {
        let a = Symbol::intern("bar_unique_1");
        let b = Symbol::intern("bar_unique_2");
        assert_ne!(a, b);
    }

    #[test]
    fn round_trips_through_as_str() {
        let s = Symbol::intern("round_trip_me");
        assert_eq!(s.as_str(), "round_trip_me");
    }

    #[test]
    fn two_strings_sharing_a_hash_bucket_still_resolve_distinctly() {
        // A private table (not the process-global one) so a simulated
        // collision here can't affect other tests' interning.
        let table = StringTable::new();
        let hash = StringTable::hash_of("bucket_member_a");
        table
            .by_hash
            .insert(hash, vec![("bucket_member_a", 0), ("bucket_member_b", 1)]);
        table.by_index.insert(0, "bucket_member_a");
        table.by_index.insert(1, "bucket_member_b");
        table.next.store(2, Ordering::Relaxed);

        assert_eq!(table.intern("bucket_member_a"), Symbol(0));
        assert_eq!(table.intern("bucket_member_b"), Symbol(1));
    }
}
