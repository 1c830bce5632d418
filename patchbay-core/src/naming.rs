//! Deterministic name generation for sockets and taps.
//!
//! Names are diagnostics only, never addressing. Generated names follow the
//! `base_N` convention with one counter per base string; derived names join
//! a parent name and a suffix with an underscore.

use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static COUNTERS: RefCell<HashMap<String, u64>> = RefCell::new(HashMap::new());
}

/// Generate a unique name from a base: `base_0`, `base_1`, and so on.
///
/// Counters are per base string and thread-local, matching the crate's
/// single-threaded discipline.
pub fn unique_name(base: &str) -> String {
    COUNTERS.with(|counters| {
        let mut counters = counters.borrow_mut();
        let n = counters.entry(base.to_string()).or_insert(0);
        let name = format!("{}_{}", base, n);
        *n += 1;
        name
    })
}

/// Join a base name and a suffix: `base_suffix`.
pub fn derived_name(base: &str, suffix: &str) -> String {
    format!("{}_{}", base, suffix)
}
