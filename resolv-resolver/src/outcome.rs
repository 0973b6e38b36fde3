use resolv_proto::packet::header::ResponseCode;
use resolv_proto::Record;
use std::fmt;

/// One attempt logged for diagnostics: which agent, what happened.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub agent: String,
    pub transport: resolv_net::Transport,
    pub event: LogEvent,
}

#[derive(Debug, Clone)]
pub enum LogEvent {
    Timeout,
    Truncated,
    Responded { rcode: ResponseCode },
    Error(String),
    CacheHit,
    Referral { to: String },
    CnameFollowed { to: String },
}

/// The resolved records plus the sections they came with and a log of the
/// attempts it took to get there.
#[derive(Debug, Clone, Default)]
pub struct Answers {
    pub answers: Vec<Record>,
    pub authorities: Vec<Record>,
    pub additional: Vec<Record>,
    pub log: Vec<LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidDomainName,
    Timeout,
    Network,
    ServerError { rcode: ResponseCode },
    NameError,
    NoData,
    Protocol,
    Cancelled,
    MalformedMessage,
}

#[derive(Debug, Clone)]
pub struct ResolveError {
    pub kind: ErrorKind,
    pub message: String,
    pub log: Vec<LogEntry>,
}

impl ResolveError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, log: Vec<LogEntry>) -> Self {
        Self {
            kind,
            message: message.into(),
            log,
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ResolveError {}

pub type Outcome = Result<Answers, ResolveError>;
