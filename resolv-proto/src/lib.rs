pub mod buffer;
pub mod name;
pub mod packet;

pub use buffer::BytePacketBuffer;
pub use name::{Label, Name, NameError};
pub use packet::header::{Header, ResponseCode};
pub use packet::question::{DnsClass, Question};
pub use packet::record::Record;
pub use packet::{DnsPacket, EncodeError, QueryType};

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn query_for(name: &str, qtype: QueryType) -> DnsPacket {
        DnsPacket {
            header: Header::question(38005),
            questions: vec![Question::new(Name::parse(name).unwrap(), qtype)],
            ..Default::default()
        }
    }

    #[test]
    fn should_round_trip_a_query_packet() {
        let mut packet = query_for("google.com", QueryType::A);
        let buffer = packet.create_buffer().unwrap();

        let decoded = DnsPacket::try_from(buffer).unwrap();
        assert_eq!(decoded.header.id, 38005);
        assert!(decoded.header.recursion_desired);
        assert!(!decoded.header.truncated_message);

        assert_eq!(decoded.questions.len(), 1);
        assert_eq!(decoded.questions[0].name.to_string(), "google.com");
        assert_eq!(decoded.questions[0].qtype, QueryType::A);

        assert!(decoded.answers.is_empty());
        assert!(decoded.authorities.is_empty());
        assert!(decoded.resources.is_empty());
    }

    #[test]
    fn should_round_trip_a_response_packet() {
        let mut packet = query_for("google.com", QueryType::A);
        packet.header = Header::response_from(&packet.header);
        packet.answers.push(Record::A {
            domain: Name::parse("google.com").unwrap(),
            addr: Ipv4Addr::new(172, 217, 20, 206),
            ttl: 8,
        });

        let buffer = packet.create_buffer().unwrap();
        let decoded = DnsPacket::try_from(buffer).unwrap();

        assert_eq!(decoded.answers.len(), 1);
        assert_eq!(
            decoded.answers[0],
            Record::A {
                domain: Name::parse("google.com").unwrap(),
                addr: Ipv4Addr::new(172, 217, 20, 206),
                ttl: 8,
            }
        );
    }

    #[test]
    fn should_round_trip_a_cname_chain_with_compression() {
        // Exercises qname compression: the CNAME target and the later A
        // record both reuse the alias name already written.
        let mut packet = query_for("app.example.com", QueryType::A);
        packet.header = Header::response_from(&packet.header);
        packet.answers.push(Record::CNAME {
            domain: Name::parse("app.example.com").unwrap(),
            host: Name::parse("edge.example.com").unwrap(),
            ttl: 39,
        });
        packet.answers.push(Record::A {
            domain: Name::parse("edge.example.com").unwrap(),
            addr: Ipv4Addr::new(3, 233, 151, 184),
            ttl: 60,
        });

        let buffer = packet.create_buffer().unwrap();
        // Compressed encoding must be smaller than writing every name in full.
        assert!(buffer.pos() < 512);

        let decoded = DnsPacket::try_from(buffer).unwrap();
        assert_eq!(decoded.answers.len(), 2);
        assert_eq!(
            decoded.answers[0],
            Record::CNAME {
                domain: Name::parse("app.example.com").unwrap(),
                host: Name::parse("edge.example.com").unwrap(),
                ttl: 39,
            }
        );
        assert_eq!(decoded.answers[1].domain().to_string(), "edge.example.com");
    }
}
