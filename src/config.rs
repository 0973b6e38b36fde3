use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use resolv_net::AgentParams;

/// One upstream forwarder, as it appears in the `[[upstreams]]` array of the
/// configuration file.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct UpstreamConfig {
    pub addr: SocketAddr,
    #[serde(default = "UpstreamConfig::default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub priority: u8,
    pub name: String,
}

impl UpstreamConfig {
    fn default_timeout_ms() -> u64 {
        2000
    }

    fn into_params(self) -> AgentParams {
        AgentParams::new(self.addr, Duration::from_millis(self.timeout_ms), self.priority, self.name)
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub upstreams: Vec<UpstreamConfig>,
    #[serde(default = "Config::default_worker_threads")]
    pub worker_threads: usize,
    #[serde(default = "Config::default_udp_buffer_bytes")]
    pub udp_buffer_bytes: usize,
    #[serde(default = "Config::default_positive_cache_cap_s")]
    pub positive_cache_cap_s: u32,
    #[serde(default = "Config::default_negative_cache_cap_s")]
    pub negative_cache_cap_s: u32,
    #[serde(default = "Config::default_max_cname_chain")]
    pub max_cname_chain: usize,
    #[serde(default = "Config::default_bool_true")]
    pub use_ipv4: bool,
    #[serde(default = "Config::default_bool_true")]
    pub use_ipv6: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstreams: Vec::new(),
            worker_threads: Self::default_worker_threads(),
            udp_buffer_bytes: Self::default_udp_buffer_bytes(),
            positive_cache_cap_s: Self::default_positive_cache_cap_s(),
            negative_cache_cap_s: Self::default_negative_cache_cap_s(),
            max_cname_chain: Self::default_max_cname_chain(),
            use_ipv4: true,
            use_ipv6: true,
        }
    }
}

impl Config {
    fn default_worker_threads() -> usize {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
    }

    fn default_udp_buffer_bytes() -> usize {
        4096
    }

    fn default_positive_cache_cap_s() -> u32 {
        3600
    }

    fn default_negative_cache_cap_s() -> u32 {
        300
    }

    fn default_max_cname_chain() -> usize {
        resolv_resolver::DEFAULT_MAX_CNAME_CHAIN
    }

    fn default_bool_true() -> bool {
        true
    }
}

impl Config {
    /// Loads the file at `path` if it exists, layering environment
    /// overrides (`DNSRESOLVE_<FIELD>`) on top. A missing file is not an
    /// error: the CLI is useful with defaults alone.
    pub fn load(path: &Path) -> Self {
        let conf = ::config::Config::builder()
            .add_source(::config::File::from(path).required(false))
            .add_source(::config::Environment::with_prefix("dnsresolve").separator("_"))
            .build()
            .expect("unable to build configuration");
        conf.try_deserialize().unwrap_or_default()
    }

    /// The configured upstreams, filtered by the `use_ipv4`/`use_ipv6` toggles.
    pub fn upstream_params(&self) -> Vec<AgentParams> {
        self.upstreams
            .iter()
            .cloned()
            .filter(|u| if u.addr.is_ipv6() { self.use_ipv6 } else { self.use_ipv4 })
            .map(UpstreamConfig::into_params)
            .collect()
    }

    pub fn resolver(&self) -> resolv_resolver::Resolver {
        resolv_resolver::Config {
            cache: resolv_cache::Config {
                positive_cap_s: self.positive_cache_cap_s,
                negative_cap_s: self.negative_cache_cap_s,
                ..resolv_cache::Config::default()
            },
            udp_buffer_bytes: self.udp_buffer_bytes,
            max_cname_chain: self.max_cname_chain,
        }
        .build()
    }
}
