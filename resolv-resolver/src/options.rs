use resolv_net::{AgentParams, Transport};
use std::time::Duration;

/// The hard ceiling on how long a single query (across all its attempts)
/// may run, regardless of a per-agent timeout.
pub const HARD_TIMEOUT_CEILING: Duration = Duration::from_secs(5);

pub const DEFAULT_MAX_CNAME_CHAIN: usize = 16;

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Upstreams to try, in priority order, when resolving in forwarding
    /// mode. Empty in recursive mode, where the engine bootstraps from root
    /// hints instead.
    pub upstreams: Vec<AgentParams>,
    pub initial_transport: Transport,
    pub timeout: Option<Duration>,
    pub recursive: bool,
    pub use_cache: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            upstreams: Vec::new(),
            initial_transport: Transport::Udp,
            timeout: None,
            recursive: false,
            use_cache: true,
        }
    }
}

impl ResolveOptions {
    pub fn forwarding(upstreams: Vec<AgentParams>) -> Self {
        Self {
            upstreams,
            ..Default::default()
        }
    }

    pub fn recursive() -> Self {
        Self {
            recursive: true,
            ..Default::default()
        }
    }

    pub fn effective_timeout(&self) -> Duration {
        self.timeout.unwrap_or(HARD_TIMEOUT_CEILING).min(HARD_TIMEOUT_CEILING)
    }
}
