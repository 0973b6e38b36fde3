use super::QueryType;
use crate::buffer::reader::ReaderError;
use crate::buffer::writer::WriterError;
use crate::buffer::BytePacketBuffer;
use crate::name::Name;
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Record {
    Unknown {
        domain: Name,
        qtype: u16,
        data: Vec<u8>,
        ttl: u32,
    }, // 0
    A {
        domain: Name,
        addr: Ipv4Addr,
        ttl: u32,
    }, // 1
    NS {
        domain: Name,
        host: Name,
        ttl: u32,
    }, // 2
    CNAME {
        domain: Name,
        host: Name,
        ttl: u32,
    }, // 5
    SOA {
        domain: Name,
        mname: Name,
        rname: Name,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
        ttl: u32,
    }, // 6
    PTR {
        domain: Name,
        host: Name,
        ttl: u32,
    }, // 12
    MX {
        domain: Name,
        priority: u16,
        host: Name,
        ttl: u32,
    }, // 15
    TXT {
        domain: Name,
        /// One entry per character-string carried in the RDATA.
        data: Vec<Vec<u8>>,
        ttl: u32,
    }, // 16
    AAAA {
        domain: Name,
        addr: Ipv6Addr,
        ttl: u32,
    }, // 28
}

impl Record {
    pub fn ttl(&self) -> u32 {
        match self {
            Self::A { ttl, .. } => *ttl,
            Self::AAAA { ttl, .. } => *ttl,
            Self::CNAME { ttl, .. } => *ttl,
            Self::MX { ttl, .. } => *ttl,
            Self::NS { ttl, .. } => *ttl,
            Self::PTR { ttl, .. } => *ttl,
            Self::TXT { ttl, .. } => *ttl,
            Self::SOA { ttl, .. } => *ttl,
            Self::Unknown { ttl, .. } => *ttl,
        }
    }

    pub fn domain(&self) -> &Name {
        match self {
            Self::A { domain, .. } => domain,
            Self::AAAA { domain, .. } => domain,
            Self::CNAME { domain, .. } => domain,
            Self::MX { domain, .. } => domain,
            Self::NS { domain, .. } => domain,
            Self::PTR { domain, .. } => domain,
            Self::TXT { domain, .. } => domain,
            Self::SOA { domain, .. } => domain,
            Self::Unknown { domain, .. } => domain,
        }
    }

    /// The record type this instance carries, whatever the unknown/known split.
    pub fn qtype(&self) -> QueryType {
        match self {
            Self::A { .. } => QueryType::A,
            Self::AAAA { .. } => QueryType::AAAA,
            Self::CNAME { .. } => QueryType::CNAME,
            Self::MX { .. } => QueryType::MX,
            Self::NS { .. } => QueryType::NS,
            Self::PTR { .. } => QueryType::PTR,
            Self::TXT { .. } => QueryType::TXT,
            Self::SOA { .. } => QueryType::SOA,
            Self::Unknown { qtype, .. } => QueryType::from_num(*qtype),
        }
    }

    /// Returns a copy of this record identical in every field except its
    /// owner name, as happens when a CNAME target's records are re-homed
    /// under the alias that was actually queried.
    pub fn with_owner(&self, name: Name) -> Self {
        match self.clone() {
            Self::A { addr, ttl, .. } => Self::A { domain: name, addr, ttl },
            Self::AAAA { addr, ttl, .. } => Self::AAAA { domain: name, addr, ttl },
            Self::CNAME { host, ttl, .. } => Self::CNAME { domain: name, host, ttl },
            Self::MX { priority, host, ttl, .. } => Self::MX {
                domain: name,
                priority,
                host,
                ttl,
            },
            Self::NS { host, ttl, .. } => Self::NS { domain: name, host, ttl },
            Self::PTR { host, ttl, .. } => Self::PTR { domain: name, host, ttl },
            Self::TXT { data, ttl, .. } => Self::TXT { domain: name, data, ttl },
            Self::SOA {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
                ttl,
                ..
            } => Self::SOA {
                domain: name,
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
                ttl,
            },
            Self::Unknown { qtype, data, ttl, .. } => Self::Unknown {
                domain: name,
                qtype,
                data,
                ttl,
            },
        }
    }

    /// Returns a copy of this record with its TTL replaced, as happens when
    /// a cached record's remaining lifetime is substituted for the
    /// originally-received TTL.
    pub fn with_ttl(&self, ttl: u32) -> Self {
        match self.clone() {
            Self::A { domain, addr, .. } => Self::A { domain, addr, ttl },
            Self::AAAA { domain, addr, .. } => Self::AAAA { domain, addr, ttl },
            Self::CNAME { domain, host, .. } => Self::CNAME { domain, host, ttl },
            Self::MX {
                domain,
                priority,
                host,
                ..
            } => Self::MX {
                domain,
                priority,
                host,
                ttl,
            },
            Self::NS { domain, host, .. } => Self::NS { domain, host, ttl },
            Self::PTR { domain, host, .. } => Self::PTR { domain, host, ttl },
            Self::TXT { domain, data, .. } => Self::TXT { domain, data, ttl },
            Self::SOA {
                domain,
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
                ..
            } => Self::SOA {
                domain,
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
                ttl,
            },
            Self::Unknown {
                domain,
                qtype,
                data,
                ..
            } => Self::Unknown {
                domain,
                qtype,
                data,
                ttl,
            },
        }
    }

    pub fn read(buffer: &mut BytePacketBuffer) -> Result<Record, ReaderError> {
        // NAME a domain name to which this resource record pertains.
        let domain = buffer.read_qname()?;

        // TYPE two octets containing one of the RR type codes.
        let qtype_num = buffer.read_u16()?;
        let qtype = QueryType::from_num(qtype_num);

        // CLASS two octets which specify the class of the data in the RDATA field.
        let _qclass = buffer.read_u16()?;

        // TTL a 32 bit unsigned integer that specifies the time interval (in seconds)
        // that the resource record may be cached before it should be discarded.
        let ttl = buffer.read_u32()?;

        // RDLENGTH an unsigned 16 bit integer that specifies the length in octets of the RDATA field.
        let data_len = buffer.read_u16()?;
        let rdata_start = buffer.pos();

        let record = match qtype {
            QueryType::A => {
                let raw_addr = buffer.read_u32()?;
                let addr = Ipv4Addr::from(raw_addr);
                Record::A { domain, addr, ttl }
            }
            QueryType::AAAA => {
                let mut octets = [0u8; 16];
                for chunk in octets.chunks_mut(4) {
                    let raw = buffer.read_u32()?;
                    chunk.copy_from_slice(&raw.to_be_bytes());
                }
                Record::AAAA {
                    domain,
                    addr: Ipv6Addr::from(octets),
                    ttl,
                }
            }
            QueryType::NS => Record::NS {
                domain,
                host: buffer.read_qname()?,
                ttl,
            },
            QueryType::CNAME => Record::CNAME {
                domain,
                host: buffer.read_qname()?,
                ttl,
            },
            QueryType::PTR => Record::PTR {
                domain,
                host: buffer.read_qname()?,
                ttl,
            },
            QueryType::MX => {
                let priority = buffer.read_u16()?;
                let host = buffer.read_qname()?;
                Record::MX {
                    domain,
                    priority,
                    host,
                    ttl,
                }
            }
            QueryType::SOA => {
                let mname = buffer.read_qname()?;
                let rname = buffer.read_qname()?;
                let serial = buffer.read_u32()?;
                let refresh = buffer.read_u32()?;
                let retry = buffer.read_u32()?;
                let expire = buffer.read_u32()?;
                let minimum = buffer.read_u32()?;
                Record::SOA {
                    domain,
                    mname,
                    rname,
                    serial,
                    refresh,
                    retry,
                    expire,
                    minimum,
                    ttl,
                }
            }
            QueryType::TXT => {
                let mut data = Vec::new();
                while buffer.pos() < rdata_start + data_len as usize {
                    data.push(buffer.read_character_string()?);
                }
                Record::TXT { domain, data, ttl }
            }
            QueryType::Unknown(_) => {
                let data = buffer.get_range(buffer.pos(), data_len as usize)?.to_vec();
                buffer.step(data_len as usize)?;
                Record::Unknown {
                    domain,
                    qtype: qtype_num,
                    data,
                    ttl,
                }
            }
        };

        Ok(record)
    }

    fn write_rdata_with_length(
        &self,
        buffer: &mut BytePacketBuffer,
        write_rdata: impl FnOnce(&mut BytePacketBuffer) -> Result<(), WriterError>,
    ) -> Result<(), WriterError> {
        let pos = buffer.pos();
        buffer.write_u16(0)?;
        write_rdata(buffer)?;
        let size = buffer.pos() - (pos + 2);
        buffer.set_u16(pos, size as u16)?;
        Ok(())
    }

    pub fn write(&self, buffer: &mut BytePacketBuffer) -> Result<usize, WriterError> {
        let start_pos = buffer.pos();

        match self {
            Record::A { domain, addr, ttl } => {
                buffer.write_qname(domain)?;
                buffer.write_u16(QueryType::A.into_num())?;
                buffer.write_u16(1)?;
                buffer.write_u32(*ttl)?;
                buffer.write_u16(4)?;
                for octet in addr.octets() {
                    buffer.write_u8(octet)?;
                }
            }
            Record::AAAA { domain, addr, ttl } => {
                buffer.write_qname(domain)?;
                buffer.write_u16(QueryType::AAAA.into_num())?;
                buffer.write_u16(1)?;
                buffer.write_u32(*ttl)?;
                buffer.write_u16(16)?;
                for segment in addr.segments() {
                    buffer.write_u16(segment)?;
                }
            }
            Record::NS { domain, host, ttl } => {
                buffer.write_qname(domain)?;
                buffer.write_u16(QueryType::NS.into_num())?;
                buffer.write_u16(1)?;
                buffer.write_u32(*ttl)?;
                self.write_rdata_with_length(buffer, |buffer| buffer.write_qname(host))?;
            }
            Record::CNAME { domain, host, ttl } => {
                buffer.write_qname(domain)?;
                buffer.write_u16(QueryType::CNAME.into_num())?;
                buffer.write_u16(1)?;
                buffer.write_u32(*ttl)?;
                self.write_rdata_with_length(buffer, |buffer| buffer.write_qname(host))?;
            }
            Record::PTR { domain, host, ttl } => {
                buffer.write_qname(domain)?;
                buffer.write_u16(QueryType::PTR.into_num())?;
                buffer.write_u16(1)?;
                buffer.write_u32(*ttl)?;
                self.write_rdata_with_length(buffer, |buffer| buffer.write_qname(host))?;
            }
            Record::MX {
                domain,
                priority,
                host,
                ttl,
            } => {
                buffer.write_qname(domain)?;
                buffer.write_u16(QueryType::MX.into_num())?;
                buffer.write_u16(1)?;
                buffer.write_u32(*ttl)?;
                self.write_rdata_with_length(buffer, |buffer| {
                    buffer.write_u16(*priority)?;
                    buffer.write_qname(host)
                })?;
            }
            Record::SOA {
                domain,
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
                ttl,
            } => {
                buffer.write_qname(domain)?;
                buffer.write_u16(QueryType::SOA.into_num())?;
                buffer.write_u16(1)?;
                buffer.write_u32(*ttl)?;
                self.write_rdata_with_length(buffer, |buffer| {
                    buffer.write_qname(mname)?;
                    buffer.write_qname(rname)?;
                    buffer.write_u32(*serial)?;
                    buffer.write_u32(*refresh)?;
                    buffer.write_u32(*retry)?;
                    buffer.write_u32(*expire)?;
                    buffer.write_u32(*minimum)
                })?;
            }
            Record::TXT { domain, data, ttl } => {
                buffer.write_qname(domain)?;
                buffer.write_u16(QueryType::TXT.into_num())?;
                buffer.write_u16(1)?;
                buffer.write_u32(*ttl)?;
                self.write_rdata_with_length(buffer, |buffer| {
                    for chunk in data {
                        buffer.write_character_string(chunk)?;
                    }
                    Ok(())
                })?;
            }
            Record::Unknown {
                domain,
                qtype,
                data,
                ttl,
            } => {
                buffer.write_qname(domain)?;
                buffer.write_u16(*qtype)?;
                buffer.write_u16(1)?;
                buffer.write_u32(*ttl)?;
                self.write_rdata_with_length(buffer, |buffer| {
                    for byte in data {
                        buffer.write_u8(*byte)?;
                    }
                    Ok(())
                })?;
            }
        }

        Ok(buffer.pos() - start_pos)
    }
}
