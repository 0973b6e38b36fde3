//! Transport: per-(query, upstream) server agents over UDP and TCP, and a
//! timeout wheel used to bound how long a query waits for a response.
//!
//! There is no explicit reactor type here. On `tokio`, the reactor and the
//! worker pool are the same thing: the multi-thread scheduler polls socket
//! readiness and resumes whichever task is waiting, and `tokio::time`'s
//! internal timer is itself a hashed timing wheel -- [`timeout::TimeoutWheel`]
//! is a thin, typed handle onto that existing machinery rather than a
//! reimplementation of one.

pub mod agent;
pub mod frame;
#[cfg(feature = "mock")]
pub mod mock;
pub mod shutdown;
pub mod timeout;

pub use agent::{Agent, AgentError, AgentFactory, AgentParams, RealAgentFactory, ServerAgent, Transport};
pub use shutdown::{shutdown_channel, Shutdown, ShutdownHandle};
pub use timeout::{TimeoutToken, TimeoutWheel};
