//! Middleware adapter for reqwest.

use crate::pool::Pool;

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest_middleware::{Error, Middleware, Next, Result};
use std::sync::Arc;

/// Routes every request of a `reqwest_middleware` client through a pool.
///
/// The pool is terminal: requests are dispatched to its agents instead of
/// continuing down the middleware chain.
#[derive(Clone)]
pub struct PoolMiddleware {
    pool: Arc<Pool>,
}

impl PoolMiddleware {
    /// Create a middleware over an existing pool.
    pub fn new(pool: Arc<Pool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Middleware for PoolMiddleware {
    async fn handle(
        &self,
        req: reqwest::Request,
        _extensions: &mut http::Extensions,
        _next: Next<'_>,
    ) -> Result<reqwest::Response> {
        self.pool
            .execute(req)
            .await
            .map_err(|err| Error::Middleware(anyhow!(err)))
    }
}
