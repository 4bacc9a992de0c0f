//! Request-scoped context: cancellation, deadlines, a log id and typed values.
//!
//! Every RPC the framework dispatches gets its own `Context` derived from the
//! server's root context, so `StopProvider` cancels all in-flight work at once.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Context carries request-scoped values like cancellation signals, timeouts, and metadata
/// Pass this as first parameter to all async trait methods
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    deadline: Option<Instant>,
    log_id: String,
    values: HashMap<String, Arc<dyn Any + Send + Sync>>,
    cancel: Arc<watch::Sender<bool>>,
}

impl Context {
    pub fn new() -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            inner: Arc::new(ContextInner {
                deadline: None,
                log_id: String::new(),
                values: HashMap::new(),
                cancel: Arc::new(cancel),
            }),
        }
    }

    /// Derive a context for a single request. Shares the parent's
    /// cancellation, gets a fresh log id.
    pub fn child(&self) -> Self {
        self.derive(|inner| inner.log_id = uuid::Uuid::new_v4().to_string())
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.derive(|inner| {
            inner.deadline = Some(match inner.deadline {
                Some(existing) if existing < deadline => existing,
                _ => deadline,
            })
        })
    }

    pub fn with_log_id(self, log_id: impl Into<String>) -> Self {
        let log_id = log_id.into();
        self.derive(|inner| inner.log_id = log_id)
    }

    pub fn with_value<T: Send + Sync + 'static>(self, key: &str, value: T) -> Self {
        self.derive(|inner| {
            inner.values.insert(key.to_string(), Arc::new(value));
        })
    }

    pub fn get_value<T>(&self, key: &str) -> Option<T>
    where
        T: Send + Sync + Clone + 'static,
    {
        self.inner
            .values
            .get(key)
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    /// Identifier correlating every log line emitted on behalf of one request.
    pub fn log_id(&self) -> &str {
        &self.inner.log_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        if *self.inner.cancel.borrow() {
            return true;
        }
        matches!(self.inner.deadline, Some(d) if Instant::now() >= d)
    }

    pub fn cancel(&self) {
        self.inner.cancel.send_replace(true);
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) {
        let mut rx = self.inner.cancel.subscribe();
        let deadline = self.inner.deadline;
        let cancelled = async move {
            while !*rx.borrow_and_update() {
                if rx.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
        };
        match deadline {
            Some(d) => {
                tokio::select! {
                    _ = cancelled => {}
                    _ = tokio::time::sleep_until(d.into()) => {}
                }
            }
            None => cancelled.await,
        }
    }

    fn derive(&self, f: impl FnOnce(&mut ContextInner)) -> Self {
        let mut inner = ContextInner {
            deadline: self.inner.deadline,
            log_id: self.inner.log_id.clone(),
            values: self.inner.values.clone(),
            cancel: self.inner.cancel.clone(),
        };
        f(&mut inner);
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
