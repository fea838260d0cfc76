//! Chunk-boundary parity: feeding arbitrary bytes through the streaming
//! pipeline split at arbitrary points must build the same tree as feeding
//! them whole.

#![no_main]

use dom::snapshot::{DomSnapshotOptions, assert_dom_eq};
use libfuzzer_sys::fuzz_target;
use stream::{BuildMode, TreeBuilder, Tokenizer, Utf8Decoder, parse};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    // First byte picks the split stride; the rest is markup bytes.
    let stride = (data[0] as usize % 13) + 1;
    let bytes = &data[1..];

    let whole = parse(&String::from_utf8_lossy(bytes), BuildMode::Fragment);

    let mut chunked = BuildMode::Fragment.new_root();
    let mut decoder = Utf8Decoder::new();
    let mut tokenizer = Tokenizer::new();
    let mut builder = TreeBuilder::new();
    for chunk in bytes.chunks(stride) {
        let mut text = String::new();
        decoder.push(chunk, &mut text);
        let mut tokens = Vec::new();
        tokenizer.push(&text, &mut tokens);
        for token in tokens {
            builder.apply(&mut chunked, token);
        }
    }
    let mut text = String::new();
    decoder.finish(&mut text);
    let mut tokens = Vec::new();
    tokenizer.push(&text, &mut tokens);
    tokenizer.finish(&mut tokens);
    for token in tokens {
        builder.apply(&mut chunked, token);
    }

    assert_dom_eq(&whole, &chunked, DomSnapshotOptions::default());
});
