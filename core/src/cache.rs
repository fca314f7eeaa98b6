use rustc_hash::FxHashMap;

use crate::{Coord, Dim, NodeRef, NoiseNode, OutputRange};

/// Per-query scratch state threaded through one evaluation.
///
/// The memo only lives as long as the context, and a fresh context is made
/// for every top-level query, so cached values never leak across queries.
#[derive(Debug, Default)]
pub struct EvalContext {
    memo: FxHashMap<(u32, [u64; 4]), f64>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_memo(&mut self) {
        self.memo.clear();
    }

    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }
}

/// Memoises a shared subgraph within one query.
///
/// Keyed by `(slot, coordinate bits)`: the same shared node reached through
/// different transformers sees different coordinates and is computed for
/// each of them.
pub struct Cached {
    slot: u32,
    inner: NodeRef,
}

impl Cached {
    pub fn new(slot: u32, inner: NodeRef) -> Self {
        Self { slot, inner }
    }
}

impl NoiseNode for Cached {
    fn sample(&self, p: &Coord, ctx: &mut EvalContext) -> f64 {
        let key = (self.slot, p.key_bits());
        if let Some(&v) = ctx.memo.get(&key) {
            return v;
        }
        let v = self.inner.sample(p, ctx);
        ctx.memo.insert(key, v);
        v
    }

    fn dim(&self) -> Dim {
        self.inner.dim()
    }

    fn range(&self) -> OutputRange {
        self.inner.range()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Counting {
        calls: AtomicUsize,
    }

    impl NoiseNode for Counting {
        fn sample(&self, p: &Coord, _ctx: &mut EvalContext) -> f64 {
            self.calls.fetch_add(1, Ordering::Relaxed);
            p.get(0)
        }
        fn dim(&self) -> Dim {
            Dim::D2
        }
        fn range(&self) -> OutputRange {
            OutputRange::UNIT
        }
    }

    #[test]
    fn cached_computes_once_per_coordinate() {
        let inner = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let cached = Cached::new(0, inner.clone());
        let mut ctx = EvalContext::new();
        let a = Coord::xy(0.25, 1.0);
        let b = Coord::xy(0.5, 1.0);
        assert_eq!(cached.sample(&a, &mut ctx), 0.25);
        assert_eq!(cached.sample(&a, &mut ctx), 0.25);
        assert_eq!(cached.sample(&b, &mut ctx), 0.5);
        assert_eq!(inner.calls.load(Ordering::Relaxed), 2);
        assert_eq!(ctx.memo_len(), 2);

        // a new query starts from an empty memo
        let mut ctx = EvalContext::new();
        cached.sample(&a, &mut ctx);
        assert_eq!(inner.calls.load(Ordering::Relaxed), 3);
    }
}
