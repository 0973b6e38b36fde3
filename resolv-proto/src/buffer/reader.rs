use std::fmt::Display;

use super::BytePacketBuffer;
use crate::name::{Label, Name};

const MAX_JUMPS: usize = 5;

#[derive(Debug, PartialEq, Eq)]
pub enum ReaderError {
    EndOfBuffer,
    TooManyJumps(usize),
    InvalidResponseCode(u8),
    InvalidClass(u16),
    InvalidRdata(&'static str),
}

impl Display for ReaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndOfBuffer => write!(f, "end of buffer"),
            Self::TooManyJumps(limit) => write!(f, "reached the limit of {limit} jumps"),
            Self::InvalidResponseCode(code) => write!(f, "invalid response code {code}"),
            Self::InvalidClass(code) => write!(f, "invalid class {code}"),
            Self::InvalidRdata(reason) => write!(f, "invalid rdata: {reason}"),
        }
    }
}

impl std::error::Error for ReaderError {}

impl From<ReaderError> for std::io::Error {
    fn from(value: ReaderError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidData, value.to_string())
    }
}

impl BytePacketBuffer {
    /// Step the buffer position forward a specific number of steps.
    pub fn step(&mut self, steps: usize) -> Result<(), ReaderError> {
        self.pos += steps;
        Ok(())
    }

    /// Change the buffer position.
    fn seek(&mut self, pos: usize) -> Result<(), ReaderError> {
        self.pos = pos;
        Ok(())
    }

    /// Read a single byte and move the position one step forward.
    pub fn read(&mut self) -> Result<u8, ReaderError> {
        if self.pos >= self.buf.len() {
            return Err(ReaderError::EndOfBuffer);
        }
        let res = self.buf[self.pos];
        self.pos += 1;
        Ok(res)
    }

    /// Get a single byte, without changing the buffer position.
    fn get(&self, pos: usize) -> Result<u8, ReaderError> {
        if pos >= self.buf.len() {
            return Err(ReaderError::EndOfBuffer);
        }
        Ok(self.buf[pos])
    }

    /// Get a range of bytes.
    pub fn get_range(&self, start: usize, len: usize) -> Result<&[u8], ReaderError> {
        let end = start + len;
        if end > self.buf.len() {
            return Err(ReaderError::EndOfBuffer);
        }
        Ok(&self.buf[start..end])
    }

    /// Read two bytes, stepping two steps forward.
    pub fn read_u16(&mut self) -> Result<u16, ReaderError> {
        Ok(((self.read()? as u16) << 8) | (self.read()? as u16))
    }

    /// Read four bytes, stepping four steps forward.
    pub fn read_u32(&mut self) -> Result<u32, ReaderError> {
        Ok(((self.read()? as u32) << 24)
            | ((self.read()? as u32) << 16)
            | ((self.read()? as u32) << 8)
            | (self.read()? as u32))
    }

    /// Reads a single length-prefixed character-string, as used in TXT rdata.
    pub fn read_character_string(&mut self) -> Result<Vec<u8>, ReaderError> {
        let len = self.read()? as usize;
        let bytes = self.get_range(self.pos, len)?.to_vec();
        self.step(len)?;
        Ok(bytes)
    }

    fn recursive_read_qname(
        &mut self,
        position: usize,
        jumps_count: usize,
    ) -> Result<(Vec<Label>, usize), ReaderError> {
        // Dns Packets are untrusted data, so we need to be paranoid.
        // Someone can craft a packet with a cycle in the jump instructions.
        // This guards against such packets.
        if jumps_count > MAX_JUMPS {
            return Err(ReaderError::TooManyJumps(MAX_JUMPS));
        }

        // At this point, we're always at the beginning of a label. Recall
        // that labels start with a length byte.
        let length = self.get(position)?;

        // If `length` has the two most significant bits set, it represents a
        // jump to some other offset in the packet.
        if (length & 0xC0) == 0xC0 {
            let b2 = self.get(position + 1)? as u16;
            let offset = ((((length as u16) ^ 0xC0) << 8) | b2) as usize;

            let labels = if let Some(rendered) = self.reading_labels.get(&offset) {
                rendered
                    .split('.')
                    .filter(|s| !s.is_empty())
                    .map(|s| Label::from_wire_bytes(s.as_bytes()))
                    .collect()
            } else {
                let (labels, _) = self.recursive_read_qname(offset, jumps_count + 1)?;
                labels
            };
            Ok((labels, position + 2))
        } else if length == 0 {
            // Domain names are terminated by an empty label of length 0.
            Ok((Vec::new(), position + 1))
        } else {
            let length = length as usize;
            let str_buffer = self.get_range(position + 1, length)?;
            let label = Label::from_wire_bytes(str_buffer);

            let next_position = position + 1 + length;
            let (mut rest, next_position) = self.recursive_read_qname(next_position, jumps_count)?;

            let rendered = std::iter::once(label.as_str().to_string())
                .chain(rest.iter().map(|l| l.as_str().to_string()))
                .collect::<Vec<_>>()
                .join(".");
            self.reading_labels.insert(position, rendered);

            let mut labels = vec![label];
            labels.append(&mut rest);
            Ok((labels, next_position))
        }
    }

    /// Reads a domain name, following any pointer chain and recording the
    /// suffixes visited so later names in the same message can reuse them.
    pub fn read_qname(&mut self) -> Result<Name, ReaderError> {
        let (labels, position) = self.recursive_read_qname(self.pos(), 0)?;
        self.seek(position)?;
        Ok(Name::from_wire_labels(labels))
    }
}

#[cfg(test)]
mod tests {
    use crate::name::Name;

    fn buffer_from(bytes: &[u8]) -> crate::buffer::BytePacketBuffer {
        crate::buffer::BytePacketBuffer::from_bytes(bytes)
    }

    #[test]
    fn should_read_empty_qname() {
        let mut buffer = buffer_from(&[0]);
        let result = buffer.read_qname().unwrap();
        assert_eq!(result, Name::root());
    }

    #[test]
    fn should_read_simple_qname() {
        let mut buffer = buffer_from(&[2, b'a', b'b', 0]);
        let result = buffer.read_qname().unwrap();
        assert_eq!(result.to_string(), "ab");
    }

    #[test]
    fn should_read_multiple_section_qname() {
        let mut buffer = buffer_from(&[2, b'a', b'b', 1, b'c', 1, b'd', 0]);
        let result = buffer.read_qname().unwrap();
        assert_eq!(result.to_string(), "ab.c.d");
    }

    #[test]
    fn should_fail_read_qname_with_loop() {
        let mut buffer = buffer_from(&[2, b'a', b'b', 0xC0, 0]);
        let error = buffer.read_qname().unwrap_err();
        assert_eq!(error, super::ReaderError::TooManyJumps(5));
    }

    #[test]
    fn should_read_qname_with_redirect() {
        let mut buffer = buffer_from(&[1, b'b', 1, b'c', 0, 1, b'd', 0xC0, 2]);
        buffer.pos = 5;
        let result = buffer.read_qname().unwrap();
        assert_eq!(result.to_string(), "d.c");
    }
}
