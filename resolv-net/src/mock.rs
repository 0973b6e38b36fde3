//! A scriptable [`AgentFactory`] so the query engine's tests never open a
//! real socket. Mirrors the `mock` feature of the resolver crate this
//! workspace was built from: canned responses keyed by upstream address,
//! consumed one per round trip.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use resolv_proto::DnsPacket;

use crate::agent::{Agent, AgentError, AgentFactory, Transport};

/// One scripted outcome for a single send/receive round trip.
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(DnsPacket),
    /// Never answers; the query engine's own timeout is what resolves this.
    Timeout,
}

/// Canned responses keyed by upstream address. Each upstream holds a queue
/// consumed in order, which is what lets a single test script a UDP reply
/// with TC=1 followed by the TCP follow-up's full answer, or a first
/// upstream's SERVFAIL followed by a second upstream's answer.
#[derive(Debug, Default)]
pub struct MockNetwork {
    replies: Mutex<HashMap<SocketAddr, VecDeque<MockReply>>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `reply` to be returned the next time `upstream` is asked.
    pub fn script(&self, upstream: SocketAddr, reply: MockReply) -> &Self {
        self.replies.lock().unwrap().entry(upstream).or_default().push_back(reply);
        self
    }
}

/// Builds [`MockAgent`]s that all read from the same [`MockNetwork`].
#[derive(Clone)]
pub struct MockAgentFactory {
    network: Arc<MockNetwork>,
}

impl MockAgentFactory {
    pub fn new(network: Arc<MockNetwork>) -> Self {
        Self { network }
    }
}

#[async_trait::async_trait]
impl AgentFactory for MockAgentFactory {
    async fn connect(
        &self,
        upstream: SocketAddr,
        transport: Transport,
        _buffer_size: usize,
    ) -> Result<Box<dyn Agent>, AgentError> {
        Ok(Box::new(MockAgent {
            upstream,
            transport,
            network: self.network.clone(),
            closed: false,
        }))
    }
}

struct MockAgent {
    upstream: SocketAddr,
    transport: Transport,
    network: Arc<MockNetwork>,
    closed: bool,
}

#[async_trait::async_trait]
impl Agent for MockAgent {
    fn upstream(&self) -> SocketAddr {
        self.upstream
    }

    fn transport(&self) -> Transport {
        self.transport
    }

    async fn send_query(&mut self, _message: &mut DnsPacket) -> Result<(), AgentError> {
        if self.closed {
            return Err(AgentError::Closed);
        }
        Ok(())
    }

    async fn recv_response(&mut self) -> Result<DnsPacket, AgentError> {
        if self.closed {
            return Err(AgentError::Closed);
        }
        let reply = self
            .network
            .replies
            .lock()
            .unwrap()
            .get_mut(&self.upstream)
            .and_then(VecDeque::pop_front);
        match reply {
            Some(MockReply::Response(packet)) => Ok(packet),
            Some(MockReply::Timeout) | None => futures::future::pending().await,
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolv_proto::packet::header::Header;

    #[tokio::test]
    async fn replies_are_consumed_in_order() {
        let network = Arc::new(MockNetwork::new());
        let upstream: SocketAddr = "127.0.0.1:53".parse().unwrap();
        let packet = DnsPacket {
            header: Header::response_from(&Header::question(1)),
            ..Default::default()
        };
        network.script(upstream, MockReply::Response(packet.clone()));

        let factory = MockAgentFactory::new(network);
        let mut agent = factory.connect(upstream, Transport::Udp, 512).await.unwrap();
        let mut query = packet.clone();
        agent.send_query(&mut query).await.unwrap();
        let got = agent.recv_response().await.unwrap();
        assert_eq!(got.header.id, packet.header.id);
    }

    #[tokio::test]
    async fn closed_agent_rejects_sends() {
        let network = Arc::new(MockNetwork::new());
        let upstream: SocketAddr = "127.0.0.1:53".parse().unwrap();
        let factory = MockAgentFactory::new(network);
        let mut agent = factory.connect(upstream, Transport::Udp, 512).await.unwrap();
        agent.close();
        let mut query = DnsPacket::default();
        assert!(matches!(agent.send_query(&mut query).await, Err(AgentError::Closed)));
    }
}
