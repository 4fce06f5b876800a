//! Request lifecycle hook: binds the tenant from inbound headers for exactly one request.

use crate::context::{ContextGuard, RequestContext, TenantContext};
use crate::extractors::tenant::tenant_from_headers;
use axum::http::{HeaderMap, Request};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower layer that runs every request inside its own tenant context scope.
///
/// The scope is seeded from `X-Tenant-Id` (or `X-Client`). A missing header is not an error
/// here; handlers that need a tenant fail through [`TenantContext::require_current_tenant`].
/// The context is discarded when the response future completes, fails, panics or is dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct TenantLayer;

impl TenantLayer {
    pub fn new() -> Self {
        TenantLayer
    }
}

impl<S> Layer<S> for TenantLayer {
    type Service = TenantService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TenantService { inner }
    }
}

#[derive(Clone, Debug)]
pub struct TenantService<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for TenantService<S>
where
    S: Service<Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<S::Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let tenant = tenant_from_headers(req.headers());
        match &tenant {
            Some(t) => tracing::debug!("tenant context established for {}", t),
            None => tracing::debug!("request carries no tenant header"),
        }
        // The clone is not guaranteed ready; keep the one poll_ready was called on.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(TenantContext::scope(RequestContext::new(tenant), async move {
            inner.call(req).await
        }))
    }
}

/// Synchronous form of the hook for thread-per-request workers: binds the header tenant on the
/// current thread and restores the previous context when the returned guard drops.
pub fn enter_request(headers: &HeaderMap) -> ContextGuard {
    TenantContext::enter(tenant_from_headers(headers))
}
