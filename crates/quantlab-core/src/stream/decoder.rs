//! Frame decoder for the backtest event stream
//!
//! The service emits blank-line-delimited text frames over a chunked HTTP
//! body. Chunk boundaries carry no meaning: a frame may span several chunks
//! and a chunk may carry several frames. The decoder keeps a rolling buffer
//! and only ever hands out complete frames, exactly once, in arrival order.

/// Incremental decoder for one stream's chunk sequence.
///
/// One decoder instance per stream; the buffer is owned by the decoder and
/// persists across chunk arrivals until [`FrameDecoder::finish`].
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Accumulated text not yet closed off by a frame delimiter
    buffer: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and iterate the complete frames it unlocked.
    ///
    /// Frames are extracted lazily as the returned iterator is advanced.
    /// Anything after the last delimiter stays in the buffer for the next
    /// chunk, so a frame is never emitted before its delimiter arrives.
    pub fn push(&mut self, chunk: &[u8]) -> Frames<'_> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));
        Frames { decoder: self }
    }

    /// Signal end-of-stream.
    ///
    /// A trailing frame whose delimiter never arrived is not valid and is
    /// discarded; the dropped text is returned so the caller can log it.
    pub fn finish(self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.buffer)
        }
    }

    /// Extract the first complete frame from the buffer, if any.
    fn next_frame(&mut self) -> Option<String> {
        let lf = self.buffer.find("\n\n");
        let crlf = self.buffer.find("\r\n\r\n");
        let (end, delim_len) = match (lf, crlf) {
            (Some(a), Some(b)) if b < a => (b, 4),
            (Some(a), _) => (a, 2),
            (None, Some(b)) => (b, 4),
            (None, None) => return None,
        };
        let frame = self.buffer[..end].to_string();
        self.buffer.drain(..end + delim_len);
        Some(frame)
    }
}

/// Iterator over the complete frames currently sitting in the buffer.
///
/// Each frame is removed from the buffer as it is yielded.
pub struct Frames<'a> {
    decoder: &'a mut FrameDecoder,
}

impl Iterator for Frames<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.decoder.next_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(decoder: &mut FrameDecoder, chunk: &str) -> Vec<String> {
        decoder.push(chunk.as_bytes()).collect()
    }

    #[test]
    fn test_single_frame_in_one_chunk() {
        let mut decoder = FrameDecoder::new();
        let frames = collect(&mut decoder, "event: progress\ndata: {}\n\n");
        assert_eq!(frames, vec!["event: progress\ndata: {}"]);
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_multiple_frames_in_one_chunk() {
        let mut decoder = FrameDecoder::new();
        let frames = collect(&mut decoder, "a: 1\n\nb: 2\n\nc: 3\n\n");
        assert_eq!(frames, vec!["a: 1", "b: 2", "c: 3"]);
    }

    #[test]
    fn test_frame_spanning_chunks_emitted_once_after_delimiter() {
        let mut decoder = FrameDecoder::new();
        assert!(collect(&mut decoder, "event: prog").is_empty());
        assert!(collect(&mut decoder, "ress\ndata: 1\n").is_empty());
        let frames = collect(&mut decoder, "\n");
        assert_eq!(frames, vec!["event: progress\ndata: 1"]);
    }

    #[test]
    fn test_every_chunk_splitting_yields_identical_frames() {
        let input = "event: progress\ndata: {\"progress\":0.5}\n\nevent: complete\ndata: {}\n\n";
        let bytes = input.as_bytes();

        let mut reference = FrameDecoder::new();
        let expected: Vec<String> = reference.push(bytes).collect();
        assert_eq!(expected.len(), 2);

        for split in 0..=bytes.len() {
            let mut decoder = FrameDecoder::new();
            let mut frames: Vec<String> = decoder.push(&bytes[..split]).collect();
            frames.extend(decoder.push(&bytes[split..]));
            assert_eq!(frames, expected, "split at byte {split} changed output");
            assert_eq!(decoder.finish(), None);
        }
    }

    #[test]
    fn test_dangling_partial_frame_is_discarded() {
        let mut decoder = FrameDecoder::new();
        let frames = collect(&mut decoder, "a: 1\n\nevent: progress\ndata: half");
        assert_eq!(frames, vec!["a: 1"]);
        assert_eq!(
            decoder.finish(),
            Some("event: progress\ndata: half".to_string())
        );
    }

    #[test]
    fn test_crlf_delimiter() {
        let mut decoder = FrameDecoder::new();
        let frames = collect(&mut decoder, "event: error\r\ndata: boom\r\n\r\n");
        assert_eq!(frames, vec!["event: error\r\ndata: boom"]);
    }

    #[test]
    fn test_delimiter_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        assert!(collect(&mut decoder, "a: 1\n").is_empty());
        let frames = collect(&mut decoder, "\nb: 2\n\n");
        assert_eq!(frames, vec!["a: 1", "b: 2"]);
    }

    #[test]
    fn test_empty_chunk_is_harmless() {
        let mut decoder = FrameDecoder::new();
        assert!(collect(&mut decoder, "").is_empty());
        let frames = collect(&mut decoder, "a: 1\n\n");
        assert_eq!(frames, vec!["a: 1"]);
    }
}
