//! Executor for asynchronous observers
//!
//! Asynchronous observers run on a tokio runtime. The manager owns one
//! lazily-started multi-thread runtime; a caller can hand in the handle of
//! a runtime it already runs instead.

use cdi_domain::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, info};

/// Thread name prefix of the default worker pool
pub const ASYNC_THREAD_NAME: &str = "cdi-async";

/// Worker pool shared by the asynchronous observers of one manager
pub struct AsyncExecutor {
    worker_threads: Option<usize>,
    external: Option<Handle>,
    runtime: Mutex<Option<Runtime>>,
    closed: AtomicBool,
}

impl AsyncExecutor {
    /// Executor owning its runtime; `None` uses tokio's default thread count
    pub fn new(worker_threads: Option<usize>) -> Self {
        Self {
            worker_threads,
            external: None,
            runtime: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Executor running on an existing runtime
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            worker_threads: None,
            external: Some(handle),
            runtime: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Handle of the worker pool, starting it on first use
    pub fn handle(&self) -> Result<Handle> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::illegal_state("Asynchronous executor is shut down"));
        }
        if let Some(handle) = &self.external {
            return Ok(handle.clone());
        }
        let mut runtime = self.runtime.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(runtime) = runtime.as_ref() {
            return Ok(runtime.handle().clone());
        }
        let mut builder = Builder::new_multi_thread();
        builder.thread_name(ASYNC_THREAD_NAME).enable_all();
        if let Some(threads) = self.worker_threads {
            builder.worker_threads(threads);
        }
        let started = builder.build()?;
        debug!(worker_threads = ?self.worker_threads, "Started asynchronous executor");
        let handle = started.handle().clone();
        *runtime = Some(started);
        Ok(handle)
    }

    /// Whether the owned runtime was started
    pub fn is_started(&self) -> bool {
        self.external.is_some()
            || self
                .runtime
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_some()
    }

    /// Whether the executor was shut down
    pub fn is_shutdown(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop accepting work and shut the owned runtime down without waiting
    ///
    /// Observers still running complete in the background.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let runtime = self
            .runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(runtime) = runtime {
            runtime.shutdown_background();
            info!("Asynchronous executor shut down");
        }
    }
}

impl Drop for AsyncExecutor {
    fn drop(&mut self) {
        if let Some(runtime) = self
            .runtime
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for AsyncExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncExecutor")
            .field("worker_threads", &self.worker_threads)
            .field("external", &self.external.is_some())
            .field("closed", &self.is_shutdown())
            .finish_non_exhaustive()
    }
}
