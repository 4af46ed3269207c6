//! Pool of proxy agents with policy-driven retry.

use crate::agent::{AgentInfo, HealthState, ProxyAgent};
use crate::error::Error;
use crate::policy::Policy;
use crate::utils;

use bytes::Bytes;
use http::Version;
use log::{info, warn};
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use reqwest::header::HeaderMap;
use reqwest::{Request, Response, StatusCode};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

/// Total attempts one `Pool::execute` call may spend across candidates.
pub const MAX_RETRY: usize = 3;

/// A response captured in full. The live transport response is consumed so
/// the classification policy can inspect the body; the caller gets a
/// response rebuilt from these parts. Streaming responses are therefore not
/// supported through the pool.
#[derive(Debug, Clone)]
pub struct BufferedResponse {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl BufferedResponse {
    async fn capture(response: Response) -> Result<Self, Error> {
        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Self {
            status,
            version,
            headers,
            body,
        })
    }

    /// Rebuild a `reqwest::Response` from the buffered parts.
    pub fn into_response(self) -> Response {
        let mut rebuilt = http::Response::new(self.body);
        *rebuilt.status_mut() = self.status;
        *rebuilt.version_mut() = self.version;
        *rebuilt.headers_mut() = self.headers;
        Response::from(rebuilt)
    }
}

/// Everything the classification policy sees about one attempt.
pub struct Outcome {
    /// Agent that served the attempt. The policy records its verdict here
    /// through [`ProxyAgent::set_state`].
    pub agent: Arc<ProxyAgent>,
    /// The buffered response or the error the attempt produced.
    pub result: Result<BufferedResponse, Error>,
    /// Set by the policy: try the next candidate instead of returning.
    pub retry: bool,
}

impl Outcome {
    async fn capture(
        agent: Arc<ProxyAgent>,
        result: Result<Response, Error>,
    ) -> Result<Self, Error> {
        let result = match result {
            Ok(response) => Ok(BufferedResponse::capture(response).await?),
            Err(err) => Err(err),
        };
        Ok(Self {
            agent,
            result,
            retry: false,
        })
    }

    /// Status code of the buffered response, if the attempt produced one.
    pub fn status(&self) -> Option<StatusCode> {
        self.result.as_ref().ok().map(|r| r.status)
    }

    /// Buffered response body, if the attempt produced one.
    pub fn body(&self) -> Option<&[u8]> {
        self.result.as_ref().ok().map(|r| r.body.as_ref())
    }

    /// Error of the attempt, if it failed.
    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }
}

/// A named collection of proxy agents sharing one classification policy.
pub struct Pool {
    agents: RwLock<HashMap<String, Arc<ProxyAgent>>>,
    policy: Arc<dyn Policy>,
    rng: Mutex<StdRng>,
}

impl Pool {
    /// Create a pool classifying outcomes with `policy`.
    pub fn new<P: Policy + 'static>(policy: P) -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            policy: Arc::new(policy),
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Register an agent under `name`. A duplicate name keeps the existing
    /// agent and only logs.
    pub fn add(&self, name: impl Into<String>, agent: Arc<ProxyAgent>) {
        match self.agents.write().entry(name.into()) {
            Entry::Vacant(entry) => {
                entry.insert(agent);
            }
            Entry::Occupied(entry) => warn!("agent {} already exists", entry.key()),
        }
    }

    /// Close and remove the named agent.
    pub async fn delete(&self, name: &str) -> Result<(), Error> {
        let agent = self
            .agents
            .write()
            .remove(name)
            .ok_or_else(|| Error::AgentNotFound {
                name: name.to_string(),
            })?;
        agent.close().await;
        Ok(())
    }

    /// Names of all registered agents.
    pub fn list(&self) -> Vec<String> {
        self.agents.read().keys().cloned().collect()
    }

    /// Status of every registered agent.
    pub fn status(&self) -> Vec<AgentInfo> {
        self.agents.read().values().map(|a| a.info()).collect()
    }

    /// Candidate order for one call: a single randomly chosen out-of-date
    /// agent probes first, healthy agents follow least-recently-used, and
    /// the remaining out-of-date agents are the last resort. Agents in any
    /// other state are excluded. The order is always computed here; the
    /// map's iteration order never leaks through.
    fn candidates(&self) -> Vec<Arc<ProxyAgent>> {
        let (mut healthy, mut stale) = {
            let agents = self.agents.read();
            let mut healthy = Vec::new();
            let mut stale = Vec::new();
            for agent in agents.values() {
                match agent.state().state {
                    HealthState::Ok => healthy.push(Arc::clone(agent)),
                    HealthState::OutOfDate => stale.push(Arc::clone(agent)),
                    _ => {}
                }
            }
            (healthy, stale)
        };
        healthy.sort_by_key(|agent| agent.last_request_time());
        stale.shuffle(&mut *self.rng.lock());
        let (probe, rest) = utils::split_at_most(stale, 1);
        let mut candidates = probe;
        candidates.extend(healthy);
        candidates.extend(rest);
        candidates
    }

    /// Send `request` through the pool.
    ///
    /// The candidate list is a snapshot computed once per call; attempts
    /// draw from it in order, wrapping around, up to [`MAX_RETRY`] total.
    /// After each attempt the policy decides between retrying and
    /// returning. Cancellation from the caller's deadline is returned
    /// immediately without classification.
    pub async fn execute(&self, request: Request) -> Result<Response, Error> {
        if request.body().is_some() && request.try_clone().is_none() {
            return Err(Error::StreamingBody);
        }
        let candidates = self.candidates();
        if candidates.is_empty() {
            return Err(Error::NoHealthyAgents);
        }
        for attempt in 0..MAX_RETRY {
            let agent = &candidates[attempt % candidates.len()];
            if attempt > 0 {
                info!("retry #{} with agent {}", attempt + 1, agent.name());
            }
            let attempt_request = request.try_clone().ok_or(Error::StreamingBody)?;
            let result = match agent.execute(attempt_request).await {
                Err(err) if err.is_cancelled() => return Err(err),
                result => result,
            };
            let mut outcome = Outcome::capture(Arc::clone(agent), result).await?;
            self.policy.classify(&mut outcome);
            if outcome.retry {
                continue;
            }
            return match outcome.result {
                Ok(buffered) => Ok(buffered.into_response()),
                Err(err) => Err(err),
            };
        }
        warn!("max retry reached after {} attempts", MAX_RETRY);
        Err(Error::NoHealthyAgents)
    }
}
