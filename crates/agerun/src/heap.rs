//! Heap diagnostics (spec §6, §8): the core never calls a custom allocator
//! directly — ordinary values are allocated through the standard global
//! allocator via [`Value`]'s constructors and reclaimed by `Drop`. What
//! survives from the reference implementation's allocator contract is the
//! leak-report concept, here a pair of snapshot/diff counters, keyed by
//! [`ValueTag`], for exercising testable property 1 (zero leaks).
//!
//! Counters are thread-local: each test (or caller) gets an independent
//! count rather than one shared process-wide total.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;

use crate::value::ValueTag;

const TAGS: [ValueTag; 5] = [
    ValueTag::Integer,
    ValueTag::Double,
    ValueTag::String,
    ValueTag::List,
    ValueTag::Map,
];

thread_local! {
    static COUNTS: [Cell<usize>; 5] = [
        Cell::new(0),
        Cell::new(0),
        Cell::new(0),
        Cell::new(0),
        Cell::new(0),
    ];
}

fn tag_index(tag: ValueTag) -> usize {
    TAGS.iter().position(|t| *t == tag).expect("every tag appears in TAGS")
}

fn tag_name(tag: ValueTag) -> &'static str {
    match tag {
        ValueTag::Integer => "Integer",
        ValueTag::Double => "Double",
        ValueTag::String => "String",
        ValueTag::List => "List",
        ValueTag::Map => "Map",
    }
}

pub(crate) fn record_alloc(tag: ValueTag) {
    COUNTS.with(|counts| {
        let cell = &counts[tag_index(tag)];
        cell.set(cell.get() + 1);
    });
}

pub(crate) fn record_drop(tag: ValueTag) {
    COUNTS.with(|counts| {
        let cell = &counts[tag_index(tag)];
        cell.set(cell.get().saturating_sub(1));
    });
}

/// A point-in-time count of live `Value`s on the calling thread, by tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapStats {
    pub live_objects: usize,
    pub objects_by_type: BTreeMap<&'static str, usize>,
}

impl HeapStats {
    pub fn snapshot() -> Self {
        COUNTS.with(|counts| {
            let mut objects_by_type = BTreeMap::new();
            let mut live_objects = 0;
            for tag in TAGS {
                let count = counts[tag_index(tag)].get();
                live_objects += count;
                objects_by_type.insert(tag_name(tag), count);
            }
            Self { live_objects, objects_by_type }
        })
    }

    #[must_use]
    pub fn diff(&self, other: &Self) -> HeapDiff {
        let live_objects_delta = isize_delta(self.live_objects, other.live_objects);
        let mut objects_by_type_delta = BTreeMap::new();
        for tag in TAGS {
            let name = tag_name(tag);
            let before = *self.objects_by_type.get(name).unwrap_or(&0);
            let after = *other.objects_by_type.get(name).unwrap_or(&0);
            objects_by_type_delta.insert(name, isize_delta(before, after));
        }
        HeapDiff { live_objects_delta, objects_by_type_delta }
    }
}

/// Difference between two [`HeapStats`] snapshots. A positive delta means
/// growth from `before` to `after`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapDiff {
    pub live_objects_delta: isize,
    pub objects_by_type_delta: BTreeMap<&'static str, isize>,
}

impl HeapDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_objects_delta == 0 && self.objects_by_type_delta.values().all(|&d| d == 0)
    }
}

impl fmt::Display for HeapDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "HeapDiff: no changes");
        }
        write!(f, "HeapDiff: {:+} live objects", self.live_objects_delta)?;
        for (name, delta) in &self.objects_by_type_delta {
            if *delta != 0 {
                write!(f, "\n  {name}: {delta:+}")?;
            }
        }
        Ok(())
    }
}

fn isize_delta(before: usize, after: usize) -> isize {
    after as isize - before as isize
}
