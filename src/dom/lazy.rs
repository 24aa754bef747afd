//! Lazy, memoizing sequence
//!
//! `LazyList` wraps a generator and caches every item it pulls. Indexed
//! access only pulls the prefix it needs; `len` and other whole-sequence
//! operations pull everything. The cache lives behind a mutex so that readers
//! on several threads never observe a half-written prefix.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Source of items for a `LazyList`
///
/// The generator keeps only its own cursor; everything it reads comes from
/// the context handed to `next`, which lets a list stored inside a document
/// pull from that same document.
pub trait Generator {
    type Context: ?Sized;
    type Item: Copy;

    /// Produce the next item, or `None` once exhausted
    fn next(&mut self, ctx: &Self::Context) -> Option<Self::Item>;
}

struct LazyState<G: Generator> {
    items: Vec<G::Item>,
    /// `None` once the generator has been exhausted
    generator: Option<G>,
}

/// Cached, generator-backed, read-only sequence
pub struct LazyList<G: Generator> {
    state: Mutex<LazyState<G>>,
    complete: AtomicBool,
}

impl<G: Generator> LazyList<G> {
    pub fn new(generator: G) -> Self {
        Self {
            state: Mutex::new(LazyState {
                items: Vec::new(),
                generator: Some(generator),
            }),
            complete: AtomicBool::new(false),
        }
    }

    /// Item at `index`, pulling from the generator only as far as needed
    pub fn get(&self, ctx: &G::Context, index: usize) -> Option<G::Item> {
        let mut state = self.state.lock();
        while state.items.len() <= index {
            if !self.pull(&mut state, ctx) {
                return None;
            }
        }
        Some(state.items[index])
    }

    /// Total number of items; forces full materialization
    pub fn len(&self, ctx: &G::Context) -> usize {
        let mut state = self.state.lock();
        while self.pull(&mut state, ctx) {}
        state.items.len()
    }

    /// True if there is no first item; pulls at most one
    pub fn is_empty(&self, ctx: &G::Context) -> bool {
        self.get(ctx, 0).is_none()
    }

    /// Copy of every item; forces full materialization
    pub fn to_vec(&self, ctx: &G::Context) -> Vec<G::Item> {
        let mut state = self.state.lock();
        while self.pull(&mut state, ctx) {}
        state.items.clone()
    }

    /// True once the generator has been exhausted
    #[inline]
    pub fn is_fully_populated(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    /// Number of items pulled so far
    pub fn materialized_len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Last item, if the list has already been fully populated
    pub fn last_if_populated(&self) -> Option<Option<G::Item>> {
        if !self.is_fully_populated() {
            return None;
        }
        Some(self.state.lock().items.last().copied())
    }

    fn pull(&self, state: &mut LazyState<G>, ctx: &G::Context) -> bool {
        let Some(generator) = state.generator.as_mut() else {
            return false;
        };
        match generator.next(ctx) {
            Some(item) => {
                state.items.push(item);
                true
            }
            None => {
                state.generator = None;
                state.items.shrink_to_fit();
                self.complete.store(true, Ordering::Release);
                false
            }
        }
    }
}

impl<G: Generator> std::fmt::Debug for LazyList<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyList")
            .field("materialized", &self.materialized_len())
            .field("complete", &self.is_fully_populated())
            .finish()
    }
}
