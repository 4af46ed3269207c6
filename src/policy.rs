//! Outcome classification.

use crate::agent::HealthState;
use crate::pool::Outcome;

use reqwest::StatusCode;

/// Decides, after every attempt, whether the pool should keep trying and
/// what the serving agent's new health report is.
///
/// The pool itself has no notion of what counts as failure beyond caller
/// cancellation; this is the single place that knowledge lives. A policy
/// runs inline in the retry loop and must not block.
pub trait Policy: Send + Sync {
    fn classify(&self, outcome: &mut Outcome);
}

impl<F> Policy for F
where
    F: Fn(&mut Outcome) + Send + Sync,
{
    fn classify(&self, outcome: &mut Outcome) {
        self(outcome)
    }
}

/// Reference classification: a transport failure marks the agent `Error`
/// and retries, HTTP 403 marks it `Banned` and retries, anything else marks
/// it `Ok` and returns to the caller.
pub struct DefaultPolicy;

impl Policy for DefaultPolicy {
    fn classify(&self, outcome: &mut Outcome) {
        if let Some(err) = outcome.error() {
            let message = err.to_string();
            outcome.agent.set_state(HealthState::Error, message);
            outcome.retry = true;
            return;
        }
        match outcome.status() {
            Some(StatusCode::FORBIDDEN) => {
                outcome.agent.set_state(HealthState::Banned, "403");
                outcome.retry = true;
            }
            _ => {
                outcome.agent.set_state(HealthState::Ok, "");
                outcome.retry = false;
            }
        }
    }
}
