use crate::buffer::reader::ReaderError;
use crate::buffer::writer::WriterError;
use crate::buffer::BytePacketBuffer;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResponseCode {
    /// No error condition.
    NoError = 0,
    /// The name server was unable to interpret the query.
    FormatError = 1,
    /// The name server was unable to process this query due to a problem
    /// with the name server itself.
    ServerFailure = 2,
    /// The domain name referenced in the query does not exist. Previously
    /// named NXDOMAIN.
    NameError = 3,
    /// The name server does not support the requested kind of query.
    NotImplemented = 4,
    /// The name server refuses to perform the specified operation for
    /// policy reasons.
    Refused = 5,
}

impl TryFrom<u8> for ResponseCode {
    type Error = ReaderError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ResponseCode::NoError),
            1 => Ok(ResponseCode::FormatError),
            2 => Ok(ResponseCode::ServerFailure),
            3 => Ok(ResponseCode::NameError),
            4 => Ok(ResponseCode::NotImplemented),
            5 => Ok(ResponseCode::Refused),
            other => Err(ReaderError::InvalidResponseCode(other)),
        }
    }
}

/// The fixed 12-byte header at the front of every message: the id, the
/// flag bits, and the four section counts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// A 16 bit identifier assigned by the program that generates any kind
    /// of query, copied into the response so a requester can match replies
    /// to outstanding queries.
    pub id: u16,

    /// RD Recursion Desired. May be set in a query and is copied into the
    /// response; asks the name server to pursue the query recursively.
    pub recursion_desired: bool,
    /// TC TrunCation. The message was truncated due to length greater than
    /// permitted on the transmission channel.
    pub truncated_message: bool,
    /// AA Authoritative Answer. Valid in responses; the responding server
    /// is an authority for the domain name in the question section.
    pub authoritative_answer: bool,
    /// OPCODE, a four bit field specifying the kind of query (0 standard,
    /// 1 inverse, 2 status, 3-15 reserved).
    pub opcode: u8,
    /// QR. Whether this message is a query (false) or a response (true).
    pub response: bool,

    pub response_code: ResponseCode,
    pub checking_disabled: bool,
    pub authed_data: bool,
    /// Z. Reserved for future use, must be zero.
    pub z: bool,
    /// RA Recursion Available. Set or cleared in a response; denotes
    /// whether recursive query support is available.
    pub recursion_available: bool,

    /// QDCOUNT, the number of entries in the question section.
    pub questions: u16,
    /// ANCOUNT, the number of resource records in the answer section.
    pub answers: u16,
    /// NSCOUNT, the number of name server resource records in the
    /// authority records section.
    pub authoritative_entries: u16,
    /// ARCOUNT, the number of resource records in the additional records
    /// section.
    pub resource_entries: u16,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            id: 0,
            recursion_desired: false,
            truncated_message: false,
            authoritative_answer: false,
            opcode: 0,
            response: false,
            response_code: ResponseCode::NoError,
            checking_disabled: false,
            authed_data: false,
            z: false,
            recursion_available: false,
            questions: 0,
            answers: 0,
            authoritative_entries: 0,
            resource_entries: 0,
        }
    }
}

impl Header {
    pub fn question(id: u16) -> Self {
        Self {
            id,
            recursion_desired: true,
            ..Default::default()
        }
    }

    pub fn response(id: u16) -> Self {
        Self {
            id,
            response: true,
            ..Default::default()
        }
    }

    pub fn response_from(request: &Self) -> Self {
        Self {
            id: request.id,
            recursion_desired: request.recursion_desired,
            opcode: request.opcode,
            response: true,
            recursion_available: true,
            ..Default::default()
        }
    }

    pub fn with_response_code(mut self, value: ResponseCode) -> Self {
        self.response_code = value;
        self
    }
}

impl Header {
    /// Reads the 12-byte header.
    pub fn read(buffer: &mut BytePacketBuffer) -> Result<Self, ReaderError> {
        let id = buffer.read_u16()?;

        let head = buffer.read()?;
        let tail = buffer.read()?;

        let questions = buffer.read_u16()?;
        let answers = buffer.read_u16()?;
        let authoritative_entries = buffer.read_u16()?;
        let resource_entries = buffer.read_u16()?;

        Ok(Self {
            id,
            recursion_desired: (head & (1 << 0)) > 0,
            truncated_message: (head & (1 << 1)) > 0,
            authoritative_answer: (head & (1 << 2)) > 0,
            opcode: (head >> 3) & 0x0F,
            response: (head & (1 << 7)) > 0,
            response_code: ResponseCode::try_from(tail & 0x0F)?,
            checking_disabled: (tail & (1 << 4)) > 0,
            authed_data: (tail & (1 << 5)) > 0,
            z: (tail & (1 << 6)) > 0,
            recursion_available: (tail & (1 << 7)) > 0,
            questions,
            answers,
            authoritative_entries,
            resource_entries,
        })
    }

    pub fn write(&self, buffer: &mut BytePacketBuffer) -> Result<(), WriterError> {
        buffer.write_u16(self.id)?;

        buffer.write_u8(
            (self.recursion_desired as u8)
                | ((self.truncated_message as u8) << 1)
                | ((self.authoritative_answer as u8) << 2)
                | (self.opcode << 3)
                | ((self.response as u8) << 7),
        )?;

        buffer.write_u8(
            (self.response_code as u8)
                | ((self.checking_disabled as u8) << 4)
                | ((self.authed_data as u8) << 5)
                | ((self.z as u8) << 6)
                | ((self.recursion_available as u8) << 7),
        )?;

        buffer.write_u16(self.questions)?;
        buffer.write_u16(self.answers)?;
        buffer.write_u16(self.authoritative_entries)?;
        buffer.write_u16(self.resource_entries)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BytePacketBuffer;

    #[test]
    fn should_round_trip_header() {
        let header = Header {
            id: 1,
            recursion_desired: true,
            authoritative_answer: true,
            recursion_available: true,
            questions: 1,
            answers: 2,
            ..Default::default()
        };
        let mut buffer = BytePacketBuffer::default();
        header.write(&mut buffer).unwrap();
        buffer.pos = 0;
        let decoded = Header::read(&mut buffer).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn response_from_copies_id_and_flips_qr() {
        let request = Header::question(42);
        let response = Header::response_from(&request);
        assert_eq!(response.id, 42);
        assert!(response.response);
        assert!(response.recursion_desired);
    }
}
