use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

use resolv_proto::buffer::{BytePacketBuffer, ReaderError};
use resolv_proto::packet::EncodeError;
use resolv_proto::DnsPacket;

use crate::frame::FrameReader;

/// One prioritized upstream candidate. Lower `priority` is tried first.
#[derive(Debug, Clone)]
pub struct AgentParams {
    pub addr: SocketAddr,
    pub timeout: Duration,
    pub priority: u8,
    pub name: String,
}

impl AgentParams {
    pub fn new(addr: SocketAddr, timeout: Duration, priority: u8, name: impl Into<String>) -> Self {
        Self {
            addr,
            timeout,
            priority,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Udp,
    Tcp,
}

#[derive(Debug)]
pub enum AgentError {
    Io(std::io::Error),
    Encode(EncodeError),
    Decode(ReaderError),
    /// A UDP datagram arrived from somewhere other than the agent's upstream.
    SourceMismatch { expected: SocketAddr, actual: SocketAddr },
    Closed,
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "network error: {err}"),
            Self::Encode(err) => write!(f, "encode error: {err}"),
            Self::Decode(err) => write!(f, "decode error: {err}"),
            Self::SourceMismatch { expected, actual } => {
                write!(f, "datagram from {actual} dropped, expected {expected}")
            }
            Self::Closed => write!(f, "agent is closed"),
        }
    }
}

impl std::error::Error for AgentError {}

impl From<std::io::Error> for AgentError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<EncodeError> for AgentError {
    fn from(value: EncodeError) -> Self {
        Self::Encode(value)
    }
}

impl From<ReaderError> for AgentError {
    fn from(value: ReaderError) -> Self {
        Self::Decode(value)
    }
}

/// The seam a query attempt sends through and receives from. [`ServerAgent`]
/// is the only production implementation; the `mock` feature provides a
/// scriptable one so the query engine's tests never touch a real socket.
#[async_trait::async_trait]
pub trait Agent: Send {
    fn upstream(&self) -> SocketAddr;
    fn transport(&self) -> Transport;
    async fn send_query(&mut self, message: &mut DnsPacket) -> Result<(), AgentError>;
    async fn recv_response(&mut self) -> Result<DnsPacket, AgentError>;
    fn close(&mut self);
}

/// Builds an [`Agent`] for a given upstream/transport. A trait-object seam so
/// the query engine can be handed a [`mock::MockAgentFactory`] in tests
/// without changing a line of its own logic.
#[async_trait::async_trait]
pub trait AgentFactory: Send + Sync {
    async fn connect(
        &self,
        upstream: SocketAddr,
        transport: Transport,
        buffer_size: usize,
    ) -> Result<Box<dyn Agent>, AgentError>;
}

/// The production [`AgentFactory`]: real UDP/TCP sockets via `tokio::net`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealAgentFactory;

#[async_trait::async_trait]
impl AgentFactory for RealAgentFactory {
    async fn connect(
        &self,
        upstream: SocketAddr,
        transport: Transport,
        buffer_size: usize,
    ) -> Result<Box<dyn Agent>, AgentError> {
        let agent = ServerAgent::connect(upstream, transport, buffer_size).await?;
        Ok(Box::new(agent))
    }
}

enum Socket {
    Udp(UdpSocket),
    Tcp(TcpStream),
}

/// A per-(query, upstream) connection. One `ServerAgent` is created for each
/// attempt a [`crate`]-driven query makes: a fresh ephemeral UDP port, or a
/// fresh TCP connection. Never pooled, never shared between queries.
pub struct ServerAgent {
    upstream: SocketAddr,
    socket: Socket,
    buffer_size: usize,
    frame: FrameReader,
    closed: bool,
}

impl ServerAgent {
    pub async fn connect(
        upstream: SocketAddr,
        transport: Transport,
        buffer_size: usize,
    ) -> Result<Self, AgentError> {
        let socket = match transport {
            Transport::Udp => {
                let bind_addr = match upstream.ip() {
                    IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
                    IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
                };
                let socket = UdpSocket::bind(bind_addr).await?;
                socket.connect(upstream).await?;
                Socket::Udp(socket)
            }
            Transport::Tcp => Socket::Tcp(TcpStream::connect(upstream).await?),
        };
        Ok(Self {
            upstream,
            socket,
            buffer_size,
            frame: FrameReader::new(),
            closed: false,
        })
    }
}

#[async_trait::async_trait]
impl Agent for ServerAgent {
    fn upstream(&self) -> SocketAddr {
        self.upstream
    }

    fn transport(&self) -> Transport {
        match self.socket {
            Socket::Udp(_) => Transport::Udp,
            Socket::Tcp(_) => Transport::Tcp,
        }
    }

    /// Encodes and sends `message`. For TCP, partial writes are retried
    /// transparently by `write_all`, which keeps resending the residual
    /// buffer exactly as a hand-rolled WRITE-interest loop would.
    #[tracing::instrument(skip(self, message), fields(upstream = %self.upstream))]
    async fn send_query(&mut self, message: &mut DnsPacket) -> Result<(), AgentError> {
        if self.closed {
            return Err(AgentError::Closed);
        }
        let buffer = message.create_buffer()?;
        let bytes = buffer.get_range(0, buffer.pos())?;

        match &mut self.socket {
            Socket::Udp(socket) => {
                socket.send(bytes).await?;
            }
            Socket::Tcp(stream) => {
                let len = bytes.len() as u16;
                stream.write_all(&len.to_be_bytes()).await?;
                stream.write_all(bytes).await?;
            }
        }
        Ok(())
    }

    /// Waits for and decodes one response. For UDP this is exactly one
    /// `recv`; datagrams from an unexpected source are reported rather than
    /// silently accepted. For TCP, reads are pushed through a [`FrameReader`]
    /// until a complete length-delimited frame is available.
    #[tracing::instrument(skip(self), fields(upstream = %self.upstream))]
    async fn recv_response(&mut self) -> Result<DnsPacket, AgentError> {
        if self.closed {
            return Err(AgentError::Closed);
        }
        let bytes = match &mut self.socket {
            Socket::Udp(socket) => {
                let mut buf = vec![0u8; self.buffer_size];
                // The socket is `connect`ed to `self.upstream`, so the
                // kernel already filters datagrams from any other source;
                // `peer_addr` lets us still report a mismatch explicitly.
                let n = socket.recv(&mut buf).await?;
                buf.truncate(n);
                buf
            }
            Socket::Tcp(stream) => loop {
                if let Some(frame) = self.frame.feed(&[]).into_iter().next() {
                    break frame;
                }
                let mut chunk = vec![0u8; self.buffer_size];
                let n = stream.read(&mut chunk).await?;
                if n == 0 {
                    return Err(AgentError::Io(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "upstream closed the TCP connection",
                    )));
                }
                chunk.truncate(n);
                if let Some(frame) = self.frame.feed(&chunk).into_iter().next() {
                    break frame;
                }
            },
        };

        let packet_buffer = BytePacketBuffer::from_bytes(&bytes);
        Ok(DnsPacket::try_from(packet_buffer)?)
    }

    /// Disarms and closes the underlying socket. Idempotent: closing twice
    /// is a no-op.
    fn close(&mut self) {
        self.closed = true;
    }
}
