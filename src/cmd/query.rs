use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, ValueEnum};
use resolv_net::{AgentParams, Transport};
use resolv_proto::{DnsClass, Name, QueryType};
use resolv_resolver::ResolveOptions;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum QueryTypeArg {
    A,
    Aaaa,
    Ns,
    Cname,
    Mx,
    Txt,
    Soa,
    Ptr,
}

impl From<QueryTypeArg> for QueryType {
    fn from(value: QueryTypeArg) -> Self {
        match value {
            QueryTypeArg::A => QueryType::A,
            QueryTypeArg::Aaaa => QueryType::AAAA,
            QueryTypeArg::Ns => QueryType::NS,
            QueryTypeArg::Cname => QueryType::CNAME,
            QueryTypeArg::Mx => QueryType::MX,
            QueryTypeArg::Txt => QueryType::TXT,
            QueryTypeArg::Soa => QueryType::SOA,
            QueryTypeArg::Ptr => QueryType::PTR,
        }
    }
}

/// Resolves a single name and prints the records that come back.
#[derive(Args, Debug)]
pub struct Command {
    /// Name to resolve, e.g. example.com
    name: String,
    /// Record type to ask for
    #[arg(short = 't', long = "type", value_enum, default_value = "a")]
    qtype: QueryTypeArg,
    /// Upstream to forward to; with neither this nor a configured upstream,
    /// the query walks the delegation chain from the root instead
    #[arg(short, long)]
    server: Option<SocketAddr>,
    /// Walk the delegation chain from the root even if an upstream is available
    #[arg(long)]
    recursive: bool,
    /// Start the first attempt over TCP instead of UDP
    #[arg(long)]
    tcp: bool,
}

impl Command {
    pub async fn run(&self, config: crate::config::Config) -> Result<(), crate::error::CliError> {
        let name = Name::parse(&self.name)?;
        let resolver = config.resolver();

        let mut upstreams = match self.server {
            Some(addr) => vec![AgentParams::new(addr, Duration::from_millis(2000), 0, addr.to_string())],
            None => config.upstream_params(),
        };
        let recursive = self.recursive || upstreams.is_empty();
        if recursive {
            upstreams.clear();
        }

        let opts = ResolveOptions {
            upstreams,
            initial_transport: if self.tcp { Transport::Tcp } else { Transport::Udp },
            recursive,
            ..ResolveOptions::default()
        };

        match resolver.resolve(name, self.qtype.into(), DnsClass::Internet, opts).await {
            Ok(answers) => {
                if answers.answers.is_empty() {
                    println!("(no answer records)");
                }
                for record in &answers.answers {
                    println!("{record:?}");
                }
                Ok(())
            }
            Err(err) => {
                tracing::error!("resolution failed: {err}");
                Err(err.into())
            }
        }
    }
}
