pub mod reader;
pub mod writer;

pub use reader::ReaderError;
pub use writer::WriterError;

use std::collections::HashMap;

/// Buffer sizes tried in order when encoding a message: classic 512-byte UDP,
/// then progressively larger buffers, the last two carrying the 2-byte TCP
/// length prefix headroom. See [`crate::packet::DnsPacket::create_buffer`].
pub const ENCODE_SIZES: [usize; 4] = [512, 8 * 1024 + 2, 16 * 1024 + 2, 64 * 1024 + 2];

/// A byte buffer paired with a cursor, used for both reading and writing wire
/// format messages. Tracks the label-compression maps used while decoding
/// (`reading_labels`: offset -> already-decoded suffix) and encoding
/// (`writing_labels`: already-written suffix -> offset).
#[derive(Debug, Clone)]
pub struct BytePacketBuffer {
    pub buf: Vec<u8>,
    pub pos: usize,
    pub(crate) reading_labels: HashMap<usize, String>,
    pub(crate) writing_labels: HashMap<String, usize>,
}

impl Default for BytePacketBuffer {
    /// A fresh buffer sized for the classic 512-byte UDP payload.
    fn default() -> Self {
        Self::with_capacity(ENCODE_SIZES[0])
    }
}

impl BytePacketBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        BytePacketBuffer {
            buf: vec![0; capacity],
            pos: 0,
            reading_labels: HashMap::new(),
            writing_labels: HashMap::new(),
        }
    }

    /// Wraps already-received bytes (e.g. a UDP datagram or a reassembled
    /// TCP frame) for decoding.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        BytePacketBuffer {
            buf: bytes.to_vec(),
            pos: 0,
            reading_labels: HashMap::new(),
            writing_labels: HashMap::new(),
        }
    }

    /// Current position within buffer.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[cfg(feature = "fuzzing")]
impl<'a> arbitrary::Arbitrary<'a> for BytePacketBuffer {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let bytes: Vec<u8> = arbitrary::Arbitrary::arbitrary(u)?;
        Ok(BytePacketBuffer::from_bytes(&bytes))
    }
}
