//! Per-request tenant context.
//!
//! Inside a request scope (see [`TenantContext::scope`], entered by [`crate::TenantLayer`]) the
//! context lives in a tokio task-local and follows the task across worker threads. Outside any
//! scope it falls back to a thread-local, which synchronous workers enter and leave with
//! [`TenantContext::enter`]. Nothing is shared between units.

use crate::config::DatastoreDefaults;
use crate::error::TenantError;
use crate::tenant::TenantId;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// State bound to one request-processing unit.
#[derive(Clone, Default)]
pub struct RequestContext {
    tenant: Option<TenantId>,
    connection: Option<String>,
    attributes: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl RequestContext {
    pub fn new(tenant: Option<TenantId>) -> Self {
        RequestContext {
            tenant,
            ..Default::default()
        }
    }

    pub fn tenant(&self) -> Option<&TenantId> {
        self.tenant.as_ref()
    }

    pub fn connection(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.tenant.is_none() && self.connection.is_none() && self.attributes.is_empty()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Connection strings carry credentials; only report whether one is bound.
        f.debug_struct("RequestContext")
            .field("tenant", &self.tenant)
            .field("connection_bound", &self.connection.is_some())
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .finish()
    }
}

tokio::task_local! {
    static TASK_CONTEXT: RefCell<RequestContext>;
}

thread_local! {
    static THREAD_CONTEXT: RefCell<RequestContext> = RefCell::new(RequestContext::default());
}

/// Run `f` against the context of the calling unit. `f` must not re-enter this module.
fn with_context<R>(f: impl FnOnce(&mut RequestContext) -> R) -> R {
    if TASK_CONTEXT.try_with(|_| ()).is_ok() {
        TASK_CONTEXT.with(|cell| f(&mut cell.borrow_mut()))
    } else {
        THREAD_CONTEXT.with(|cell| f(&mut cell.borrow_mut()))
    }
}

/// Ambient access to the calling unit's [`RequestContext`].
pub struct TenantContext;

impl TenantContext {
    /// Bind `tenant` to the calling unit, replacing any previous binding. A blank id unbinds,
    /// the same as a blank header.
    pub fn set_current_tenant(tenant: impl Into<TenantId>) {
        let tenant = TenantId::parse(tenant.into().as_str());
        with_context(|ctx| ctx.tenant = tenant);
    }

    pub fn current_tenant() -> Option<TenantId> {
        with_context(|ctx| ctx.tenant.clone())
    }

    pub fn require_current_tenant() -> Result<TenantId, TenantError> {
        Self::current_tenant().ok_or(TenantError::ContextNotSet)
    }

    pub fn has_tenant() -> bool {
        with_context(|ctx| ctx.tenant.is_some())
    }

    /// Absent when no tenant is bound or the bound id is not numeric.
    pub fn current_tenant_as_int() -> Option<i64> {
        Self::current_tenant().and_then(|t| t.as_int().ok())
    }

    pub fn require_current_tenant_as_int() -> Result<i64, TenantError> {
        Self::require_current_tenant()?.as_int()
    }

    /// Store a small per-request value (e.g. something derived from the tenant).
    pub fn set_attribute<T: Any + Send + Sync>(key: impl Into<String>, value: T) {
        let key = key.into();
        with_context(|ctx| {
            ctx.attributes.insert(key, Arc::new(value));
        });
    }

    /// Typed read of an attribute. `None` when missing or stored with a different type.
    pub fn attribute<T: Any + Clone>(key: &str) -> Option<T> {
        with_context(|ctx| {
            ctx.attributes
                .get(key)
                .and_then(|value| (**value).downcast_ref::<T>())
                .cloned()
        })
    }

    pub fn remove_attribute(key: &str) -> bool {
        with_context(|ctx| ctx.attributes.remove(key).is_some())
    }

    /// Bind the datastore connection storage code should use for this request.
    pub fn set_connection(connection: impl Into<String>) {
        let connection = connection.into();
        with_context(|ctx| ctx.connection = Some(connection));
    }

    pub fn connection() -> Option<String> {
        with_context(|ctx| ctx.connection.clone())
    }

    /// The bound connection, else the configured central or default datastore.
    pub fn connection_or_default(defaults: &DatastoreDefaults, central: bool) -> Option<String> {
        Self::connection().or_else(|| {
            if central {
                defaults.central_url.clone()
            } else {
                defaults.default_url.clone()
            }
        })
    }

    /// Drop tenant, connection and attributes. Safe to call when nothing is set.
    pub fn clear() {
        with_context(|ctx| *ctx = RequestContext::default());
    }

    pub fn snapshot() -> RequestContext {
        with_context(|ctx| ctx.clone())
    }

    /// Run `block` with `tenant` bound, then restore the previous context exactly, even if
    /// `block` panics. The block starts without the outer attributes and connection.
    pub fn execute_with_tenant<R>(tenant: impl Into<TenantId>, block: impl FnOnce() -> R) -> R {
        let inner = RequestContext::new(Some(tenant.into()));
        let previous = with_context(|ctx| std::mem::replace(ctx, inner));
        let _restore = RestoreGuard {
            previous: Some(previous),
        };
        block()
    }

    /// Async form of [`TenantContext::execute_with_tenant`]: `fut` runs in a nested scope, the
    /// outer binding is visible again once it completes or is dropped.
    pub fn execute_with_tenant_async<F: Future>(
        tenant: impl Into<TenantId>,
        fut: F,
    ) -> impl Future<Output = F::Output> {
        Self::scope(RequestContext::new(Some(tenant.into())), fut)
    }

    /// Run `fut` with its own task-local context. `tokio::spawn` does not inherit task-locals,
    /// so background tasks that need a tenant must be wrapped in a scope too.
    pub fn scope<F: Future>(context: RequestContext, fut: F) -> impl Future<Output = F::Output> {
        TASK_CONTEXT.scope(RefCell::new(context), fut)
    }

    /// Start a fresh context on the current unit. Whatever was bound before is put back when
    /// the guard drops; on a pooled worker thread that is the empty context.
    pub fn enter(tenant: Option<TenantId>) -> ContextGuard {
        let previous = with_context(|ctx| std::mem::replace(ctx, RequestContext::new(tenant)));
        ContextGuard {
            _restore: RestoreGuard {
                previous: Some(previous),
            },
            _not_send: PhantomData,
        }
    }
}

struct RestoreGuard {
    previous: Option<RequestContext>,
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            with_context(|ctx| *ctx = previous);
        }
    }
}

/// Restores the context that was bound before [`TenantContext::enter`] on drop, on every exit
/// path including unwinding. Bound to the thread that created it.
#[must_use = "the previous context is restored as soon as the guard is dropped"]
pub struct ContextGuard {
    _restore: RestoreGuard,
    _not_send: PhantomData<*const ()>,
}
