use crate::domain::StreamFrame;

const FRAME_DELIMITER: &str = "\n\n";
const DATA_PREFIX: &str = "data: ";

/// Incremental splitter for event-stream bodies.
///
/// Bytes are decoded to UTF-8 as they arrive. A multi-byte sequence cut by a
/// chunk boundary is held back until the next chunk completes it. Decoded
/// text is split on blank lines; anything after the last delimiter stays
/// buffered until more data or [`FrameDecoder::finish`].
#[derive(Debug, Default)]
pub struct FrameDecoder {
    pending: Vec<u8>,
    text: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every frame it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.decode(chunk);
        self.drain_frames()
    }

    /// Flush at end of stream. Trailing text without a delimiter is returned
    /// as a last frame.
    pub fn finish(&mut self) -> Vec<String> {
        if !self.pending.is_empty() {
            self.text.push_str(&String::from_utf8_lossy(&self.pending));
            self.pending.clear();
        }

        let mut frames = self.drain_frames();
        let rest = std::mem::take(&mut self.text);
        if !rest.trim().is_empty() {
            frames.push(rest);
        }
        frames
    }

    fn decode(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(decoded) => {
                    self.text.push_str(decoded);
                    self.pending.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if let Ok(decoded) = std::str::from_utf8(&self.pending[..valid]) {
                        self.text.push_str(decoded);
                    }
                    match e.error_len() {
                        // Incomplete sequence at the end: wait for the next chunk.
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                        Some(len) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                    }
                }
            }
        }
    }

    fn drain_frames(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Some(pos) = self.text.find(FRAME_DELIMITER) {
            let frame = self.text[..pos].to_string();
            self.text.drain(..pos + FRAME_DELIMITER.len());
            if !frame.is_empty() {
                frames.push(frame);
            }
        }
        frames
    }
}

/// Parse one raw frame. Returns `None` for frames with no payload.
pub fn parse_frame(raw: &str) -> Option<Result<StreamFrame, serde_json::Error>> {
    let raw = raw.trim_start();
    let payload = raw.strip_prefix(DATA_PREFIX).unwrap_or(raw).trim();
    if payload.is_empty() {
        return None;
    }
    Some(serde_json::from_str(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_blank_lines() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(b"data: a\n\ndata: b\n\ndata: c");
        assert_eq!(frames, vec!["data: a", "data: b"]);
        assert_eq!(decoder.finish(), vec!["data: c"]);
    }

    #[test]
    fn frames_span_chunks() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"data: {\"type\":").is_empty());
        assert!(decoder.push(b"\"text\",\"value\":\"x\"}\n").is_empty());
        let frames = decoder.push(b"\n");
        assert_eq!(frames, vec!["data: {\"type\":\"text\",\"value\":\"x\"}"]);
    }

    #[test]
    fn empty_frames_are_dropped() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(b"\n\n\n\ndata: a\n\n");
        assert_eq!(frames, vec!["data: a"]);
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn multibyte_sequence_split_across_chunks_is_preserved() {
        let text = "data: héllo 🦀\n\n";
        let bytes = text.as_bytes();
        // Split inside the four-byte crab emoji.
        let cut = text.find('🦀').unwrap() + 2;

        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(&bytes[..cut]).is_empty());
        let frames = decoder.push(&bytes[cut..]);
        assert_eq!(frames, vec!["data: héllo 🦀"]);
    }

    #[test]
    fn byte_at_a_time_decoding() {
        let text = "data: ñandú\n\n";
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        for byte in text.as_bytes() {
            frames.extend(decoder.push(std::slice::from_ref(byte)));
        }
        assert_eq!(frames, vec!["data: ñandú"]);
    }

    #[test]
    fn invalid_bytes_become_replacement_characters() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(b"a\xffb\n\n");
        assert_eq!(frames, vec!["a\u{FFFD}b"]);
    }

    #[test]
    fn parse_frame_strips_prefix_and_whitespace() {
        let frame = parse_frame("data: {\"type\":\"text\",\"value\":\"He\"} ")
            .unwrap()
            .unwrap();
        assert_eq!(frame, StreamFrame::Text("He".into()));

        let frame = parse_frame("{\"type\":\"error\",\"value\":\"boom\"}")
            .unwrap()
            .unwrap();
        assert_eq!(frame, StreamFrame::Error("boom".into()));
    }

    #[test]
    fn parse_frame_skips_empty_payloads_and_reports_bad_json() {
        assert!(parse_frame("data: ").is_none());
        assert!(parse_frame("   ").is_none());
        assert!(parse_frame("data: {not json").unwrap().is_err());
    }
}
