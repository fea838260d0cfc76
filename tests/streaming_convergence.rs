//! Chunk-boundary independence: reconciling against the same final markup,
//! split into arbitrary chunks with injected delays, must converge to the
//! same live tree as a single-chunk pass.
//!
//! Fast CI mode: default seed count when `CI` is set. Extended local mode:
//! set `STREAMDOM_CONVERGENCE_SEEDS` to increase coverage.

use dom::snapshot::{DomSnapshotOptions, assert_dom_eq};
use std::time::Duration;
use streamdom::{BuildMode, ChunkSource, Node, ReconcileOptions, SliceSource, parse, reconcile};

const DEFAULT_SEEDS_CI: usize = 20;
const DEFAULT_SEEDS_LOCAL: usize = 80;
const SEED_MIX: u64 = 0x9e3779b97f4a7c15;

const INITIAL: &str = "<html><head><title>home</title></head><body>\
<nav><a href=\"/\">home</a></nav>\
<ul><li key=\"a\">alpha</li><li key=\"b\">beta</li><li>stale</li></ul>\
<footer>v1</footer>\
</body></html>";

const TARGET: &str = "<html><head><title>détail &amp; more</title></head><body>\
<nav><a href=\"/detail\" class=\"active\">detail</a></nav>\
<ul><li key=\"b\">beta</li><li key=\"a\">alpha²</li><li>fresh</li><li>appended</li></ul>\
<!-- build 2 -->\
<footer>v2</footer>\
</body></html>";

fn reconciled(initial: &str, source: impl streamdom::ByteSource + 'static) -> Node {
    let mut live = parse(initial, BuildMode::Document);
    reconcile(&mut live, source, ReconcileOptions::default()).expect("reconcile succeeds");
    live
}

fn assert_converged(live: &Node, target: &str, label: &str) {
    let expected = parse(target, BuildMode::Document);
    if let Err(mismatch) = dom::snapshot::compare_dom(&expected, live, DomSnapshotOptions::default())
    {
        panic!("convergence failed for {label}: {mismatch}");
    }
}

#[test]
fn single_chunk_pass_converges() {
    let live = reconciled(INITIAL, SliceSource::new(TARGET));
    assert_converged(&live, TARGET, "single chunk");
}

#[test]
fn fixed_size_chunking_is_boundary_independent() {
    for size in [1usize, 2, 3, 7, 16, 64] {
        let boundaries: Vec<usize> = (1..TARGET.len() / size + 1)
            .map(|i| i * size)
            .filter(|&idx| idx < TARGET.len())
            .collect();
        let live = reconciled(INITIAL, ChunkSource::split(TARGET, &boundaries));
        assert_converged(&live, TARGET, &format!("fixed size={size}"));
    }
}

#[test]
fn delayed_chunks_converge_like_immediate_ones() {
    let boundaries = [9, 40, 77, 120, 160, 200, 260];
    let source =
        ChunkSource::split(TARGET, &boundaries).with_delay(Duration::from_millis(2));
    let live = reconciled(INITIAL, source);
    assert_converged(&live, TARGET, "delayed chunks");

    let immediate = reconciled(INITIAL, ChunkSource::split(TARGET, &boundaries));
    assert_dom_eq(&immediate, &live, DomSnapshotOptions::default());
}

#[test]
fn seeded_random_boundaries_converge() {
    let seeds = seed_count();
    for iter in 0..seeds {
        let seed = 0x7374_7265_616d_646fu64 ^ (iter as u64).wrapping_mul(SEED_MIX);
        let mut rng = LcgRng::new(seed);
        let boundaries = random_boundaries(&mut rng, TARGET.len());
        let live = reconciled(INITIAL, ChunkSource::split(TARGET, &boundaries));
        assert_converged(&live, TARGET, &format!("seed=0x{seed:016x} {boundaries:?}"));
    }
}

#[test]
fn chunked_copy_of_same_structure_is_a_noop() {
    let mut live = parse(TARGET, BuildMode::Document);
    let report = reconcile(
        &mut live,
        ChunkSource::split(TARGET, &[13, 50, 99, 170, 230]).with_delay(Duration::from_millis(1)),
        ReconcileOptions::default(),
    )
    .expect("reconcile succeeds");
    assert!(report.is_noop(), "expected zero mutations, got {:?}", report.units);
}

fn seed_count() -> usize {
    if let Ok(value) = std::env::var("STREAMDOM_CONVERGENCE_SEEDS")
        && let Ok(parsed) = value.parse::<usize>()
        && parsed > 0
    {
        return parsed;
    }
    if std::env::var("CI").is_ok() {
        DEFAULT_SEEDS_CI
    } else {
        DEFAULT_SEEDS_LOCAL
    }
}

fn random_boundaries(rng: &mut LcgRng, len: usize) -> Vec<usize> {
    if len <= 1 {
        return Vec::new();
    }
    let max_points = (len - 1).min(48);
    let count = rng.gen_range_usize(0, max_points + 1);
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(rng.gen_range_usize(1, len));
    }
    out.sort_unstable();
    out.dedup();
    out
}

struct LcgRng {
    state: u64,
}

impl LcgRng {
    fn new(seed: u64) -> Self {
        let state = if seed == 0 { SEED_MIX } else { seed };
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    fn gen_range_usize(&mut self, start: usize, end: usize) -> usize {
        assert!(start < end, "invalid range: {start}..{end}");
        let span = (end - start) as u64;
        (self.next_u64() % span) as usize + start
    }
}
