//! # reqwest-agent-pool
//!
//! A health-tracking proxy agent pool for reqwest.
//!
//! The pool distributes outbound requests across a set of proxy agents,
//! derives each agent's availability from its rate-gate tokens and the last
//! classified outcome, and retries failed requests on alternate agents. A
//! caller-supplied [`Policy`] decides after every attempt what the outcome
//! means for the agent's health and whether to keep trying.

pub mod agent;
pub mod config;
pub mod error;
pub mod gate;
pub mod middleware;
pub mod policy;
pub mod pool;
pub mod sources;
pub mod transport;
mod utils;

pub use agent::{AgentInfo, HealthState, ProxyAgent, StateReport};
pub use config::{AgentConfig, AgentConfigBuilder};
pub use error::{BoxError, Error};
pub use gate::{GovernorGate, RateGate};
pub use middleware::PoolMiddleware;
pub use policy::{DefaultPolicy, Policy};
pub use pool::{BufferedResponse, Outcome, Pool, MAX_RETRY};
pub use transport::{ProxyClient, Transport};
