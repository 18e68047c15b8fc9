//! Internal collection type aliases.
//!
//! Definition tables and aggregates key on small integer ids, so the crate
//! uses `rustc_hash::FxHashMap` throughout.

pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
