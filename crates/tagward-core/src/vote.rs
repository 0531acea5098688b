//! Majority voting over observed metadata values.
//!
//! Each album (and each artist) gets one vote per track for every field.
//! A value wins only with a strict majority: `1 + total/2` votes, integer
//! division. On an even split nothing wins and the caller reports the
//! tally instead of guessing.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::hash::Hash;

/// Outcome of a canonical-value vote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Choice<T> {
    /// No votes were cast; keep the existing default.
    Empty,
    /// Exactly one value reached the majority threshold.
    Majority(T),
    /// Votes were cast but nothing reached a majority; keep the default
    /// and report the tally.
    Ambiguous,
}

/// Pick the single value holding a strict majority of the votes.
///
/// The threshold `1 + total/2` makes ties impossible: at most one value
/// can reach it, so map iteration order cannot affect the result.
pub fn pick_canonical<T>(counts: &HashMap<T, u32>) -> Choice<T>
where
    T: Clone + Eq + Hash,
{
    if counts.is_empty() {
        return Choice::Empty;
    }
    let total: u32 = counts.values().sum();
    let majority = 1 + total / 2;
    for (value, count) in counts {
        if *count >= majority {
            return Choice::Majority(value.clone());
        }
    }
    Choice::Ambiguous
}

/// Render a vote tally as `{"value": N instances, ...}`, key-sorted so the
/// same tally always prints the same way.
pub fn format_tally(counts: &HashMap<String, u32>) -> String {
    let mut keys: Vec<&String> = counts.keys().collect();
    keys.sort();
    let mut out = String::from("{");
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let count = counts[*key];
        let noun = if count == 1 { "instance" } else { "instances" };
        let _ = write!(out, "{key:?}: {count} {noun}");
    }
    out.push('}');
    out
}
