//! TCP frame reassembly: messages on the wire are prefixed by a 16-bit
//! big-endian length, and a single `read` can hand back part of a frame,
//! a whole frame, or several.

#[derive(Debug)]
enum State {
    WantLen,
    WantBody(usize),
}

/// Consumes bytes fed from successive TCP reads and yields complete,
/// length-delimited frames as soon as they're whole.
#[derive(Debug)]
pub struct FrameReader {
    state: State,
    buf: Vec<u8>,
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReader {
    pub fn new() -> Self {
        Self {
            state: State::WantLen,
            buf: Vec::new(),
        }
    }

    /// Appends newly-read bytes and drains as many complete frames as are
    /// now available. Partial trailing data stays buffered for the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        loop {
            match self.state {
                State::WantLen => {
                    if self.buf.len() < 2 {
                        break;
                    }
                    let len = u16::from_be_bytes([self.buf[0], self.buf[1]]) as usize;
                    self.buf.drain(0..2);
                    self.state = State::WantBody(len);
                }
                State::WantBody(len) => {
                    if self.buf.len() < len {
                        break;
                    }
                    frames.push(self.buf.drain(0..len).collect());
                    self.state = State::WantLen;
                }
            }
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_nothing_until_length_prefix_is_complete() {
        let mut reader = FrameReader::new();
        assert!(reader.feed(&[0]).is_empty());
    }

    #[test]
    fn yields_one_frame_per_read_when_aligned() {
        let mut reader = FrameReader::new();
        let frames = reader.feed(&[0, 3, b'a', b'b', b'c']);
        assert_eq!(frames, vec![vec![b'a', b'b', b'c']]);
    }

    #[test]
    fn reassembles_a_frame_split_across_several_reads() {
        let mut reader = FrameReader::new();
        assert!(reader.feed(&[0]).is_empty());
        assert!(reader.feed(&[3, b'a']).is_empty());
        assert!(reader.feed(&[b'b']).is_empty());
        let frames = reader.feed(&[b'c']);
        assert_eq!(frames, vec![vec![b'a', b'b', b'c']]);
    }

    #[test]
    fn yields_multiple_frames_from_one_read() {
        let mut reader = FrameReader::new();
        let frames = reader.feed(&[0, 1, b'x', 0, 2, b'y', b'z']);
        assert_eq!(frames, vec![vec![b'x'], vec![b'y', b'z']]);
    }
}
