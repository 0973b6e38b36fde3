pub mod header;
pub mod question;
pub mod record;

use crate::buffer::{BytePacketBuffer, ReaderError, WriterError, ENCODE_SIZES};

#[derive(PartialEq, Eq, Debug, Clone, Hash, Copy)]
#[allow(clippy::upper_case_acronyms)]
pub enum QueryType {
    Unknown(u16),
    /// a host address
    A, // 1
    /// an authoritative name server
    NS, // 2
    /// the canonical name for an alias
    CNAME, // 5
    /// mail exchange
    MX, // 15
    /// a domain name pointer
    PTR, // 12
    /// text strings
    TXT, // 16
    /// marks the start of a zone of authority
    SOA, // 6
    /// a host address (IPv6)
    AAAA, // 28
}

impl QueryType {
    pub fn into_num(self) -> u16 {
        match self {
            QueryType::Unknown(x) => x,
            QueryType::A => 1,
            QueryType::NS => 2,
            QueryType::SOA => 6,
            QueryType::CNAME => 5,
            QueryType::PTR => 12,
            QueryType::MX => 15,
            QueryType::TXT => 16,
            QueryType::AAAA => 28,
        }
    }

    pub fn from_num(num: u16) -> QueryType {
        match num {
            1 => QueryType::A,
            2 => QueryType::NS,
            5 => QueryType::CNAME,
            6 => QueryType::SOA,
            12 => QueryType::PTR,
            15 => QueryType::MX,
            16 => QueryType::TXT,
            28 => QueryType::AAAA,
            _ => QueryType::Unknown(num),
        }
    }
}

#[derive(Debug)]
pub enum EncodeError {
    Writer(WriterError),
    /// Every buffer size in [`ENCODE_SIZES`] overflowed.
    BufferOverflow,
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Writer(err) => write!(f, "{err}"),
            Self::BufferOverflow => write!(f, "message does not fit in {} bytes", ENCODE_SIZES[ENCODE_SIZES.len() - 1]),
        }
    }
}

impl std::error::Error for EncodeError {}

impl From<WriterError> for EncodeError {
    fn from(value: WriterError) -> Self {
        Self::Writer(value)
    }
}

#[derive(Clone, Debug, Default)]
pub struct DnsPacket {
    pub header: header::Header,
    pub questions: Vec<question::Question>,
    pub answers: Vec<record::Record>,
    pub authorities: Vec<record::Record>,
    pub resources: Vec<record::Record>,
}

impl TryFrom<BytePacketBuffer> for DnsPacket {
    type Error = ReaderError;

    fn try_from(mut buffer: BytePacketBuffer) -> Result<Self, Self::Error> {
        let header = header::Header::read(&mut buffer)?;

        let mut questions = Vec::with_capacity(header.questions as usize);
        for _ in 0..header.questions {
            questions.push(question::Question::read(&mut buffer)?);
        }

        let mut answers = Vec::with_capacity(header.answers as usize);
        for _ in 0..header.answers {
            answers.push(record::Record::read(&mut buffer)?);
        }

        let mut authorities = Vec::with_capacity(header.authoritative_entries as usize);
        for _ in 0..header.authoritative_entries {
            authorities.push(record::Record::read(&mut buffer)?);
        }

        let mut resources = Vec::with_capacity(header.resource_entries as usize);
        for _ in 0..header.resource_entries {
            resources.push(record::Record::read(&mut buffer)?);
        }

        Ok(DnsPacket {
            header,
            questions,
            answers,
            authorities,
            resources,
        })
    }
}

impl DnsPacket {
    fn write_into(&mut self, buffer: &mut BytePacketBuffer) -> Result<(), WriterError> {
        self.header.questions = self.questions.len() as u16;
        self.header.answers = self.answers.len() as u16;
        self.header.authoritative_entries = self.authorities.len() as u16;
        self.header.resource_entries = self.resources.len() as u16;

        self.header.write(buffer)?;

        for question in &self.questions {
            question.write(buffer)?;
        }
        for rec in &self.answers {
            rec.write(buffer)?;
        }
        for rec in &self.authorities {
            rec.write(buffer)?;
        }
        for rec in &self.resources {
            rec.write(buffer)?;
        }

        Ok(())
    }

    /// Encodes the message, growing through [`ENCODE_SIZES`] until it fits.
    /// The caller picks which of the returned bytes to actually send: a UDP
    /// agent sends the whole buffer, truncating per RFC 1035 if it still
    /// doesn't fit the transport's datagram size; a TCP agent prefixes the
    /// message with its 2-byte length.
    pub fn create_buffer(&mut self) -> Result<BytePacketBuffer, EncodeError> {
        for &size in ENCODE_SIZES.iter() {
            let mut buffer = BytePacketBuffer::with_capacity(size);
            match self.write_into(&mut buffer) {
                Ok(()) => return Ok(buffer),
                Err(WriterError::EndOfBuffer) => continue,
                Err(other) => return Err(other.into()),
            }
        }
        Err(EncodeError::BufferOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Name;
    use crate::packet::question::{DnsClass, Question};
    use crate::packet::record::Record;
    use std::net::Ipv4Addr;

    #[test]
    fn should_round_trip_simple_query() {
        let mut packet = DnsPacket {
            header: header::Header::question(7),
            questions: vec![Question::new(Name::parse("example.com").unwrap(), QueryType::A)],
            ..Default::default()
        };
        let buffer = packet.create_buffer().unwrap();
        let decoded = DnsPacket::try_from(buffer).unwrap();
        assert_eq!(decoded.header.id, 7);
        assert_eq!(decoded.questions.len(), 1);
        assert_eq!(decoded.questions[0].name.to_string(), "example.com");
        assert_eq!(decoded.questions[0].qtype, QueryType::A);
    }

    #[test]
    fn should_round_trip_response_with_answer() {
        let mut packet = DnsPacket {
            header: header::Header::response(7).with_response_code(header::ResponseCode::NoError),
            questions: vec![Question::new(Name::parse("example.com").unwrap(), QueryType::A)],
            answers: vec![Record::A {
                domain: Name::parse("example.com").unwrap(),
                addr: Ipv4Addr::new(93, 184, 216, 34),
                ttl: 300,
            }],
            ..Default::default()
        };
        let buffer = packet.create_buffer().unwrap();
        let decoded = DnsPacket::try_from(buffer).unwrap();
        assert_eq!(decoded.answers.len(), 1);
        assert_eq!(decoded.answers[0].ttl(), 300);
    }

    #[test]
    fn should_overflow_into_the_next_encode_size() {
        // A handful of long TXT records push a 512-byte encode past its
        // limit; the retry ladder should pick the next size up.
        let mut packet = DnsPacket {
            header: header::Header::response(1),
            questions: vec![Question::new(Name::root(), QueryType::TXT)],
            answers: (0..20)
                .map(|i| Record::TXT {
                    domain: Name::parse("example.com").unwrap(),
                    data: vec![vec![b'x'; 200], vec![i as u8; 10]],
                    ttl: 60,
                })
                .collect(),
            ..Default::default()
        };
        let buffer = packet.create_buffer().unwrap();
        assert!(buffer.len() > 512);
    }

    #[test]
    fn unknown_qclass_or_type_round_trips_as_number() {
        let question = Question {
            name: Name::parse("example.com").unwrap(),
            qtype: QueryType::Unknown(65399),
            qclass: DnsClass::Internet,
        };
        let mut buffer = crate::buffer::BytePacketBuffer::default();
        question.write(&mut buffer).unwrap();
        buffer.pos = 0;
        let decoded = Question::read(&mut buffer).unwrap();
        assert_eq!(decoded.qtype, QueryType::Unknown(65399));
    }
}
