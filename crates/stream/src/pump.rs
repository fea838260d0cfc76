//! The builder thread: drains a byte source into the shared document.

use crate::builder::TreeBuilder;
use crate::decode::Utf8Decoder;
use crate::shared::SharedDocument;
use crate::source::ByteSource;
use crate::tokenizer::Tokenizer;
use std::thread;

/// Spawn the thread that feeds `doc` from `source` until the source either
/// completes or fails. Each applied batch wakes suspended walkers.
pub fn spawn_builder<S: ByteSource + 'static>(
    mut source: S,
    doc: SharedDocument,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut decoder = Utf8Decoder::new();
        let mut tokenizer = Tokenizer::new();
        let mut builder = TreeBuilder::new();
        loop {
            match source.next_chunk() {
                Ok(Some(bytes)) => {
                    let mut text = String::new();
                    decoder.push(&bytes, &mut text);
                    let mut tokens = Vec::new();
                    tokenizer.push(&text, &mut tokens);
                    if tokens.is_empty() {
                        continue;
                    }
                    let count = tokens.len();
                    let revision = doc.mutate(|state| {
                        for token in tokens {
                            builder.apply(&mut state.root, token);
                        }
                        state.revision
                    });
                    log::trace!(
                        target: "stream.pump",
                        "applied {count} tokens (revision {revision})"
                    );
                }
                Ok(None) => {
                    let mut text = String::new();
                    decoder.finish(&mut text);
                    let mut tokens = Vec::new();
                    tokenizer.push(&text, &mut tokens);
                    tokenizer.finish(&mut tokens);
                    doc.mutate(|state| {
                        for token in tokens {
                            builder.apply(&mut state.root, token);
                        }
                        state.done = true;
                    });
                    log::trace!(target: "stream.pump", "stream complete");
                    return;
                }
                Err(err) => {
                    log::warn!(target: "stream.pump", "stream failed: {err}");
                    doc.mark_failed(err.to_string());
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuildMode, parse};
    use crate::source::{ChunkSource, FailingSource, SliceSource};
    use dom::snapshot::{DomSnapshotOptions, assert_dom_eq};
    use std::time::Duration;

    #[test]
    fn pump_builds_the_same_tree_as_whole_input_parse() {
        let input = "<html><head><title>t</title></head><body><p>hi</p></body></html>";
        let doc = SharedDocument::new(BuildMode::Document);
        spawn_builder(SliceSource::new(input), doc.clone())
            .join()
            .expect("builder thread");
        assert!(doc.is_done());
        assert_dom_eq(
            &parse(input, BuildMode::Document),
            &doc.snapshot_root(),
            DomSnapshotOptions::default(),
        );
    }

    #[test]
    fn pump_with_delayed_chunks_converges_to_same_tree() {
        let input = "<div><span>a</span>é<span>b</span></div>";
        let source = ChunkSource::split(input, &[3, 9, 17, 20, 21, 28])
            .with_delay(Duration::from_millis(2));
        let doc = SharedDocument::new(BuildMode::Document);
        spawn_builder(source, doc.clone()).join().expect("builder thread");
        assert_dom_eq(
            &parse(input, BuildMode::Document),
            &doc.snapshot_root(),
            DomSnapshotOptions::default(),
        );
    }

    #[test]
    fn pump_records_source_failure() {
        let source = FailingSource::new(vec![b"<div>".to_vec()], "connection reset");
        let doc = SharedDocument::new(BuildMode::Document);
        spawn_builder(source, doc.clone()).join().expect("builder thread");
        assert_eq!(doc.lock().failed.as_deref(), Some("connection reset"));
        assert!(!doc.is_done());
    }
}
