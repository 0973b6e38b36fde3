//! The query engine: forwarding and recursive resolution wired on top of the
//! wire codec, the transport agents, and the record cache.
//!
//! A [`Resolver`] is the one thing callers hold onto. It owns a shared
//! [`resolv_cache::Cache`] and a [`registry::QueryRegistry`] of in-flight
//! queries; [`Resolver::resolve`] allocates an id, drives the forwarding or
//! recursive walk in [`query`], and retires the id whichever way the query
//! ends -- answer, error, or cancellation.

pub mod options;
pub mod outcome;
pub mod query;
pub mod registry;
pub mod roots;

use resolv_proto::{DnsClass, Name, Question, QueryType};

pub use options::{ResolveOptions, DEFAULT_MAX_CNAME_CHAIN, HARD_TIMEOUT_CEILING};
pub use outcome::{Answers, ErrorKind, LogEntry, LogEvent, Outcome, ResolveError};

use registry::QueryRegistry;
use std::sync::Arc;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: resolv_cache::Config,
    #[serde(default = "Config::default_udp_buffer_bytes")]
    pub udp_buffer_bytes: usize,
    #[serde(default = "Config::default_max_cname_chain")]
    pub max_cname_chain: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: resolv_cache::Config::default(),
            udp_buffer_bytes: Self::default_udp_buffer_bytes(),
            max_cname_chain: Self::default_max_cname_chain(),
        }
    }
}

impl Config {
    fn default_udp_buffer_bytes() -> usize {
        4096
    }

    fn default_max_cname_chain() -> usize {
        DEFAULT_MAX_CNAME_CHAIN
    }

    pub fn build(self) -> Resolver {
        Resolver::new(self)
    }
}

/// The query engine proper. Cheap to clone: the cache is reference-counted
/// and the registry is shared behind the same handle every clone carries.
#[derive(Clone)]
pub struct Resolver {
    cache: resolv_cache::Cache,
    registry: std::sync::Arc<QueryRegistry>,
    agent_factory: Arc<dyn resolv_net::AgentFactory>,
    udp_buffer_bytes: usize,
    max_cname_chain: usize,
}

impl Resolver {
    pub fn new(config: Config) -> Self {
        Self {
            cache: config.cache.build(),
            registry: std::sync::Arc::new(QueryRegistry::new()),
            agent_factory: Arc::new(resolv_net::RealAgentFactory),
            udp_buffer_bytes: config.udp_buffer_bytes,
            max_cname_chain: config.max_cname_chain,
        }
    }

    /// Swaps in a different agent factory, e.g. [`resolv_net::mock::MockAgentFactory`]
    /// in tests so a query never opens a real socket.
    pub fn with_agent_factory(mut self, factory: Arc<dyn resolv_net::AgentFactory>) -> Self {
        self.agent_factory = factory;
        self
    }

    pub fn cache(&self) -> &resolv_cache::Cache {
        &self.cache
    }

    /// Resolves `name`/`qtype` under `class`, honoring whatever mode and
    /// upstream set `opts` carries. Allocates and retires a query id around
    /// the whole attempt so `cancel` can interrupt it from another task.
    #[tracing::instrument(skip(self, opts), fields(name = %name, qtype = ?qtype))]
    pub async fn resolve(&self, name: Name, qtype: QueryType, class: DnsClass, opts: ResolveOptions) -> Outcome {
        let (id, shutdown) = self.registry.allocate().await;
        let question = Question { name, qtype, qclass: class };
        let result = query::execute(self, question, class, opts, shutdown).await;
        self.registry.remove(id).await;
        result
    }

    /// Convenience wrapper over [`Resolver::resolve`] using the default
    /// forwarding options against `upstreams`.
    pub async fn resolve_blocking(
        &self,
        name: Name,
        qtype: QueryType,
        class: DnsClass,
        upstreams: Vec<resolv_net::AgentParams>,
    ) -> Outcome {
        self.resolve(name, qtype, class, ResolveOptions::forwarding(upstreams)).await
    }

    /// Runs `resolve` to completion, invoking `callback` with its outcome.
    /// Distinct from `resolve` only in shape: a caller that wants to fire a
    /// query and move on, rather than await it inline, spawns this.
    pub async fn resolve_with<F>(&self, name: Name, qtype: QueryType, class: DnsClass, opts: ResolveOptions, callback: F)
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        let outcome = self.resolve(name, qtype, class, opts).await;
        callback(outcome);
    }

    /// Cancels an outstanding query by id. A no-op if it already completed.
    pub async fn cancel(&self, id: u16) -> bool {
        self.registry.cancel(id).await
    }

    pub async fn outstanding(&self) -> usize {
        self.registry.len().await
    }
}

/// Spawns a fresh, independently-cancellable query sharing this resolver's
/// cache and registry. Used for the glue-less NS resolution a referral walk
/// needs partway through its own query -- boxed so the mutual recursion with
/// [`query::execute`] doesn't require an infinitely-sized future.
pub(crate) fn resolve_inner<'a>(
    resolver: &'a Resolver,
    question: Question,
    class: DnsClass,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Outcome> + Send + 'a>> {
    Box::pin(async move {
        let (id, shutdown) = resolver.registry.allocate().await;
        let opts = ResolveOptions::recursive();
        let result = query::execute(resolver, question, class, opts, shutdown).await;
        resolver.registry.remove(id).await;
        result
    })
}

/// The resolver seam named by the query engine's ambient trait-object
/// commitments: lets a caller depend on "something that resolves names"
/// rather than on [`Resolver`] concretely.
#[async_trait::async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(&self, name: Name, qtype: QueryType, class: DnsClass, opts: ResolveOptions) -> Outcome;
}

#[async_trait::async_trait]
impl Resolve for Resolver {
    async fn resolve(&self, name: Name, qtype: QueryType, class: DnsClass, opts: ResolveOptions) -> Outcome {
        Resolver::resolve(self, name, qtype, class, opts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_against_an_unreachable_upstream_times_out_cleanly() {
        let resolver = Config::default().build();
        // TEST-NET-1 (RFC 5737): guaranteed not to answer, so this exercises
        // the timeout path without touching a real network.
        let upstream = resolv_net::AgentParams::new(
            "192.0.2.1:53".parse().unwrap(),
            std::time::Duration::from_millis(20),
            0,
            "test-net",
        );
        let opts = ResolveOptions::forwarding(vec![upstream]);
        let outcome = resolver
            .resolve(Name::parse("example.com").unwrap(), QueryType::A, DnsClass::Internet, opts)
            .await;
        assert!(outcome.is_err());
        assert_eq!(resolver.outstanding().await, 0);
    }

    #[tokio::test]
    async fn cancel_of_unknown_id_is_a_no_op() {
        let resolver = Config::default().build();
        assert!(!resolver.cancel(0xBEEF).await);
    }

    mod scenarios {
        use super::*;
        use resolv_net::mock::{MockAgentFactory, MockNetwork, MockReply};
        use resolv_proto::packet::header::{Header, ResponseCode};
        use resolv_proto::{DnsPacket, Record};
        use std::net::{Ipv4Addr, SocketAddr};
        use std::sync::Arc;

        fn resolver_with(network: Arc<MockNetwork>) -> Resolver {
            Config::default()
                .build()
                .with_agent_factory(Arc::new(MockAgentFactory::new(network)))
        }

        fn ok_response(name: &str, answers: Vec<Record>) -> DnsPacket {
            let mut header = Header::response(0);
            header.recursion_available = true;
            DnsPacket {
                header,
                questions: vec![Question {
                    name: Name::parse(name).unwrap(),
                    qtype: QueryType::A,
                    qclass: DnsClass::Internet,
                }],
                answers,
                ..Default::default()
            }
        }

        fn a_record(name: &str, addr: Ipv4Addr, ttl: u32) -> Record {
            Record::A {
                domain: Name::parse(name).unwrap(),
                addr,
                ttl,
            }
        }

        #[tokio::test]
        async fn forwarding_happy_path_then_cache_hit() {
            let network = Arc::new(MockNetwork::new());
            let upstream: SocketAddr = "198.51.100.1:53".parse().unwrap();
            network.script(
                upstream,
                MockReply::Response(ok_response(
                    "example.com",
                    vec![a_record("example.com", Ipv4Addr::new(93, 184, 216, 34), 300)],
                )),
            );
            let resolver = resolver_with(network);
            let params = resolv_net::AgentParams::new(upstream, std::time::Duration::from_millis(500), 0, "upstream-1");

            let first = resolver
                .resolve(
                    Name::parse("example.com").unwrap(),
                    QueryType::A,
                    DnsClass::Internet,
                    ResolveOptions::forwarding(vec![params.clone()]),
                )
                .await
                .expect("first resolve should succeed over the network");
            assert_eq!(first.answers.len(), 1);

            // Second resolve never touches the (now-empty) mock queue, so it
            // can only have come from the cache.
            let second = resolver
                .resolve(
                    Name::parse("example.com").unwrap(),
                    QueryType::A,
                    DnsClass::Internet,
                    ResolveOptions::forwarding(vec![params]),
                )
                .await
                .expect("second resolve should be served from cache");
            assert!(second.log.iter().any(|e| matches!(e.event, LogEvent::CacheHit)));
        }

        #[tokio::test]
        async fn truncated_udp_response_is_promoted_to_tcp() {
            let network = Arc::new(MockNetwork::new());
            let upstream: SocketAddr = "198.51.100.2:53".parse().unwrap();

            let mut truncated = ok_response("big.example", Vec::new());
            truncated.header.truncated_message = true;
            network.script(upstream, MockReply::Response(truncated));
            network.script(
                upstream,
                MockReply::Response(ok_response(
                    "big.example",
                    vec![a_record("big.example", Ipv4Addr::new(203, 0, 113, 9), 60)],
                )),
            );

            let resolver = resolver_with(network);
            let params = resolv_net::AgentParams::new(upstream, std::time::Duration::from_millis(500), 0, "upstream-2");
            let outcome = resolver
                .resolve(
                    Name::parse("big.example").unwrap(),
                    QueryType::A,
                    DnsClass::Internet,
                    ResolveOptions::forwarding(vec![params]),
                )
                .await
                .expect("promoted TCP attempt should answer");
            assert_eq!(outcome.answers.len(), 1);

            let sent: Vec<_> = outcome
                .log
                .iter()
                .filter(|e| matches!(e.event, LogEvent::Truncated | LogEvent::Responded { .. }))
                .collect();
            assert_eq!(sent.len(), 2);
            assert!(matches!(sent[0].event, LogEvent::Truncated));
            assert_eq!(sent[0].transport, resolv_net::Transport::Udp);
            assert_eq!(sent[1].transport, resolv_net::Transport::Tcp);
        }

        #[tokio::test]
        async fn fails_over_to_the_next_upstream_on_servfail() {
            let network = Arc::new(MockNetwork::new());
            let bad: SocketAddr = "198.51.100.3:53".parse().unwrap();
            let good: SocketAddr = "198.51.100.4:53".parse().unwrap();

            let mut servfail = ok_response("example.net", Vec::new());
            servfail.header.response_code = ResponseCode::ServerFailure;
            network.script(bad, MockReply::Response(servfail));
            network.script(
                good,
                MockReply::Response(ok_response(
                    "example.net",
                    vec![a_record("example.net", Ipv4Addr::new(198, 51, 100, 200), 60)],
                )),
            );

            let resolver = resolver_with(network);
            let upstreams = vec![
                resolv_net::AgentParams::new(bad, std::time::Duration::from_millis(500), 0, "primary"),
                resolv_net::AgentParams::new(good, std::time::Duration::from_millis(500), 1, "secondary"),
            ];
            let outcome = resolver
                .resolve(
                    Name::parse("example.net").unwrap(),
                    QueryType::A,
                    DnsClass::Internet,
                    ResolveOptions::forwarding(upstreams),
                )
                .await
                .expect("failover should reach the second upstream");
            assert_eq!(outcome.answers.len(), 1);
        }

        #[tokio::test]
        async fn authoritative_nxdomain_is_cached_negatively() {
            let network = Arc::new(MockNetwork::new());
            let upstream: SocketAddr = "198.51.100.5:53".parse().unwrap();

            let mut nxdomain = ok_response("no-such.example", Vec::new());
            nxdomain.header.authoritative_answer = true;
            nxdomain.header.response_code = ResponseCode::NameError;
            network.script(upstream, MockReply::Response(nxdomain));

            let resolver = resolver_with(network);
            let params = resolv_net::AgentParams::new(upstream, std::time::Duration::from_millis(500), 0, "authority");

            let first = resolver
                .resolve(
                    Name::parse("no-such.example").unwrap(),
                    QueryType::A,
                    DnsClass::Internet,
                    ResolveOptions::forwarding(vec![params.clone()]),
                )
                .await;
            assert!(matches!(first, Err(ref e) if e.kind == ErrorKind::NameError));

            // Second lookup must not touch the network at all: the mock queue
            // for this upstream is already empty, so a second network hit
            // would hang instead of failing fast.
            let second = resolver
                .resolve(
                    Name::parse("no-such.example").unwrap(),
                    QueryType::A,
                    DnsClass::Internet,
                    ResolveOptions::forwarding(vec![params]),
                )
                .await;
            assert!(matches!(second, Err(ref e) if e.kind == ErrorKind::NameError));
        }

        #[tokio::test]
        async fn recursive_walk_follows_referrals_to_an_answer() {
            let network = Arc::new(MockNetwork::new());
            let root: SocketAddr = "198.41.0.4:53".parse().unwrap();
            let com_ns: SocketAddr = "192.5.6.30:53".parse().unwrap();

            let com_glue = a_record("a.gtld-servers.net", Ipv4Addr::new(192, 5, 6, 30), 172_800);
            let mut root_referral = ok_response("example.com", Vec::new());
            root_referral.authorities = vec![Record::NS {
                domain: Name::parse("com").unwrap(),
                host: Name::parse("a.gtld-servers.net").unwrap(),
                ttl: 172_800,
            }];
            root_referral.resources = vec![com_glue];
            network.script(root, MockReply::Response(root_referral));

            let mut authoritative = ok_response(
                "example.com",
                vec![a_record("example.com", Ipv4Addr::new(93, 184, 216, 34), 300)],
            );
            authoritative.header.authoritative_answer = true;
            network.script(com_ns, MockReply::Response(authoritative));

            let resolver = resolver_with(network);
            let mut opts = ResolveOptions::recursive();
            opts.upstreams = vec![resolv_net::AgentParams::new(root, std::time::Duration::from_millis(500), 0, "a.root-servers.net")];

            let outcome = resolver
                .resolve(Name::parse("example.com").unwrap(), QueryType::A, DnsClass::Internet, opts)
                .await
                .expect("delegation walk should reach an answer");
            assert_eq!(outcome.answers.len(), 1);
            assert!(outcome.log.iter().any(|e| matches!(e.event, LogEvent::Referral { .. })));
        }
    }
}
