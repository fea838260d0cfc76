//! Incremental UTF-8 decoding for streaming byte sources.
//!
//! Multi-byte characters split across chunk boundaries are carried over to
//! the next call; invalid sequences become U+FFFD and decoding keeps moving.

pub struct Utf8Decoder {
    carry: Vec<u8>,
}

impl Default for Utf8Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self { carry: Vec::new() }
    }

    /// Decode `bytes` into `out`, holding back an incomplete trailing
    /// sequence for the next call.
    pub fn push(&mut self, bytes: &[u8], out: &mut String) {
        if bytes.is_empty() {
            return;
        }

        if self.carry.is_empty() {
            decode_bytes(out, &mut self.carry, bytes);
            return;
        }

        // The carry is an incomplete UTF-8 suffix, so it is at most 3 bytes.
        // Complete it with just enough prefix bytes from this chunk, then
        // decode the rest of the chunk directly.
        let mut remaining = bytes;
        while !self.carry.is_empty() && !remaining.is_empty() {
            let expected = utf8_seq_len(self.carry[0]);
            if expected == 0 {
                out.push('\u{FFFD}');
                self.carry.clear();
                break;
            }

            let needed = expected.saturating_sub(self.carry.len());
            if needed == 0 {
                let pending = std::mem::take(&mut self.carry);
                decode_bytes(out, &mut self.carry, &pending);
                continue;
            }
            if remaining.len() < needed {
                self.carry.extend_from_slice(remaining);
                return;
            }

            let mut scratch = [0u8; 8];
            let carry_len = self.carry.len();
            scratch[..carry_len].copy_from_slice(&self.carry);
            scratch[carry_len..carry_len + needed].copy_from_slice(&remaining[..needed]);
            self.carry.clear();
            decode_bytes(out, &mut self.carry, &scratch[..carry_len + needed]);
            remaining = &remaining[needed..];
        }

        if !remaining.is_empty() {
            decode_bytes(out, &mut self.carry, remaining);
        }
    }

    /// Flush any carried bytes lossily, so a completed stream is never
    /// silently truncated.
    pub fn finish(&mut self, out: &mut String) {
        if self.carry.is_empty() {
            return;
        }
        out.push_str(&String::from_utf8_lossy(&self.carry));
        self.carry.clear();
    }
}

fn utf8_seq_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

fn decode_bytes(out: &mut String, carry: &mut Vec<u8>, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        match std::str::from_utf8(bytes) {
            Ok(s) => {
                out.push_str(s);
                break;
            }
            Err(e) => {
                let valid_up_to = e.valid_up_to();
                if valid_up_to > 0 {
                    out.push_str(
                        std::str::from_utf8(&bytes[..valid_up_to]).expect("valid UTF-8 prefix"),
                    );
                }
                match e.error_len() {
                    Some(len) => {
                        out.push('\u{FFFD}');
                        bytes = &bytes[valid_up_to + len..];
                    }
                    None => {
                        carry.extend_from_slice(&bytes[valid_up_to..]);
                        break;
                    }
                }
            }
        }
    }
}
