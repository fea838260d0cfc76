//! The full builder pipeline must never panic and must keep node ids unique
//! for arbitrary byte input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use stream::{BuildMode, parse};

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);
    let root = parse(&input, BuildMode::Document);

    let mut ids = Vec::new();
    collect_ids(&root, &mut ids);
    let total = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), total, "builder produced duplicate node ids");
});

fn collect_ids(node: &dom::Node, out: &mut Vec<u32>) {
    out.push(node.id().0);
    if let Some(children) = node.children() {
        for child in children {
            collect_ids(child, out);
        }
    }
}
