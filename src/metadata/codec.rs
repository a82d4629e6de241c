//! Text chunking for ledger metadata strings.
//!
//! Cardano caps every metadata string at 64 *bytes*, not 64 characters, so
//! splitting has to walk the text char by char and recompute the encoded
//! size before each append. Chunks re-join losslessly in order.

/// Widest UTF-8 encoding of a single `char`.
pub const MAX_CHAR_BYTES: usize = 4;

/// Split `text` into chunks whose UTF-8 byte length never exceeds
/// `max_bytes`. Empty input produces no chunks.
///
/// `max_bytes` must be at least [`MAX_CHAR_BYTES`], otherwise a single
/// wide character could never be placed.
pub fn encode(text: &str, max_bytes: usize) -> Vec<String> {
    debug_assert!(max_bytes >= MAX_CHAR_BYTES);

    let mut chunks = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if current.len() + ch.len_utf8() > max_bytes {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Exact left-inverse of [`encode`]: concatenation in order.
pub fn decode<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks.iter().map(|c| c.as_ref()).collect()
}

/// Split `text` into self-describing frames: the first chunk is bare, every
/// continuation chunk carries a `"{tag}{index}:"` prefix so a flattened or
/// re-ordered chunk list can still be reassembled.
///
/// The payload budget of each frame is `frame_limit` minus the byte length
/// of that frame's own prefix. The prefix grows with the index (`T9:` is 3
/// bytes, `T10:` is 4), so the budget is recomputed for every frame rather
/// than fixed up front.
pub fn encode_labeled(text: &str, frame_limit: usize, tag: char) -> Vec<String> {
    let mut frames = Vec::new();
    let mut prefix_len = 0usize;
    let mut current = String::new();

    for ch in text.chars() {
        if current.len() + ch.len_utf8() > frame_limit {
            frames.push(current);
            let prefix = format!("{}{}:", tag, frames.len());
            debug_assert!(prefix.len() + MAX_CHAR_BYTES <= frame_limit);
            prefix_len = prefix.len();
            current = prefix;
        }
        current.push(ch);
    }

    if current.len() > prefix_len {
        frames.push(current);
    }

    frames
}

/// Reassemble frames produced by [`encode_labeled`]. Continuation prefixes
/// are stripped by position; a frame without its expected prefix is taken
/// verbatim, matching the lenient reconstruction of stored metadata.
pub fn decode_labeled<S: AsRef<str>>(frames: &[S], tag: char) -> String {
    frames
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            let frame = frame.as_ref();
            if i == 0 {
                return frame;
            }
            let prefix = format!("{}{}:", tag, i);
            frame.strip_prefix(prefix.as_str()).unwrap_or(frame)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_ascii() {
        let text = "the quick brown fox jumps over the lazy dog";
        for max in [4, 7, 16, 64] {
            let chunks = encode(text, max);
            assert_eq!(decode(&chunks), text);
            for chunk in &chunks {
                assert!(chunk.len() <= max);
            }
        }
    }

    #[test]
    fn round_trip_multibyte() {
        // mixes 1-, 2-, 3- and 4-byte characters
        let text = "caféを見る🙂 nötes ΣΩ 漢字テスト 🚀🚀🚀 end";
        for max in [4, 5, 11, 64] {
            let chunks = encode(text, max);
            assert_eq!(decode(&chunks), text);
            for chunk in &chunks {
                assert!(chunk.len() <= max, "chunk {:?} exceeds {} bytes", chunk, max);
            }
        }
    }

    #[test]
    fn multibyte_never_splits_mid_char() {
        // each char is 3 bytes; a 4-byte budget fits exactly one per chunk
        let text = "あいうえお";
        let chunks = encode(text, 4);
        assert_eq!(chunks.len(), 5);
        for chunk in &chunks {
            assert_eq!(chunk.chars().count(), 1);
        }
        assert_eq!(decode(&chunks), text);
    }

    #[test]
    fn empty_input() {
        assert!(encode("", 64).is_empty());
        assert!(encode_labeled("", 64, 'T').is_empty());
        assert_eq!(decode::<String>(&[]), "");
        assert_eq!(decode_labeled::<String>(&[], 'T'), "");
    }

    #[test]
    fn single_chunk_when_it_fits() {
        let chunks = encode("short", 64);
        assert_eq!(chunks, vec!["short".to_string()]);
    }

    #[test]
    fn labeled_round_trip_130_ascii() {
        // 130 ASCII chars at a 64-byte frame limit: first frame is bare (64
        // bytes), continuations carry a 3-byte prefix ("T1:", "T2:") leaving
        // a 61-byte payload budget each.
        let text: String = std::iter::repeat('x').take(130).collect();
        let frames = encode_labeled(&text, 64, 'T');

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].len(), 64);
        assert!(frames[1].starts_with("T1:"));
        assert_eq!(frames[1].len(), 64);
        assert!(frames[2].starts_with("T2:"));
        for frame in &frames {
            assert!(frame.len() <= 64);
        }

        assert_eq!(decode_labeled(&frames, 'T'), text);
    }

    #[test]
    fn labeled_prefix_budget_shrinks_with_index() {
        // enough text to pass frame index 9, where the prefix widens from
        // "C9:" to "C10:" and the payload budget drops by one byte
        let text: String = std::iter::repeat('y').take(64 + 61 * 12).collect();
        let frames = encode_labeled(&text, 64, 'C');

        assert!(frames.len() > 11);
        assert!(frames[10].starts_with("C10:"));
        for frame in &frames {
            assert!(frame.len() <= 64);
        }
        assert_eq!(decode_labeled(&frames, 'C'), text);
    }

    #[test]
    fn labeled_round_trip_multibyte() {
        let text = "🙂".repeat(50);
        let frames = encode_labeled(&text, 64, 'T');
        for frame in &frames {
            assert!(frame.len() <= 64);
        }
        assert_eq!(decode_labeled(&frames, 'T'), text);
    }
}
