//! Event dispatch
//!
//! Looks the observers of a delivery up in the registry and notifies them,
//! either sequentially on the caller's thread or as independent tasks on a
//! tokio runtime.

use crate::bean_manager::BeanManager;
use crate::event::Delivery;
use crate::observer::ObserverMethod;
use cdi_domain::error::{Error, Result};
use futures::future::join_all;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Notify the synchronous observers of `delivery` in priority order
///
/// The first failure stops delivery and is returned wrapped with the
/// observer's description.
pub fn fire_sync(manager: &BeanManager, delivery: &Delivery) -> Result<()> {
    manager.ensure_running()?;
    let observers = manager
        .observers()
        .find_list(&delivery.event_type(), delivery.qualifiers());
    let mut notified = 0_usize;
    for observer in observers.iter().filter(|o| !o.is_async()) {
        observer
            .notify(manager, delivery)
            .map_err(|e| Error::observer(observer.description(), e))?;
        notified += 1;
    }
    debug!(
        event = delivery.event_type().simple_name(),
        qualifiers = %delivery.qualifiers(),
        observers = notified,
        "Fired event"
    );
    Ok(())
}

/// Schedule the asynchronous observers of `delivery`
///
/// Each observer runs as its own blocking task on `executor`, or on the
/// manager's executor when `None`. Returns `None` when no asynchronous
/// observer matches; otherwise a task resolving once every observer
/// returned, failing with every captured failure.
pub fn fire_async(
    manager: &BeanManager,
    delivery: Delivery,
    executor: Option<Handle>,
) -> Result<Option<JoinHandle<Result<()>>>> {
    manager.ensure_running()?;
    let observers: Vec<Arc<ObserverMethod>> = manager
        .observers()
        .find_list(&delivery.event_type(), delivery.qualifiers())
        .iter()
        .filter(|o| o.is_async())
        .cloned()
        .collect();
    if observers.is_empty() {
        return Ok(None);
    }
    let handle = match executor {
        Some(handle) => handle,
        None => manager.executor().handle()?,
    };

    debug!(
        event = delivery.event_type().simple_name(),
        qualifiers = %delivery.qualifiers(),
        observers = observers.len(),
        "Firing event asynchronously"
    );

    let delivery = Arc::new(delivery);
    let tasks: Vec<JoinHandle<Result<()>>> = observers
        .into_iter()
        .map(|observer| {
            let manager = manager.clone();
            let delivery = Arc::clone(&delivery);
            handle.spawn_blocking(move || {
                observer.notify(&manager, &delivery).inspect_err(|e| {
                    warn!(observer = %observer, error = %e, "Asynchronous observer failed");
                })
            })
        })
        .collect();

    Ok(Some(handle.spawn(async move {
        let failures: Vec<Error> = join_all(tasks)
            .await
            .into_iter()
            .filter_map(|joined| match joined {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e),
                Err(join) => Some(Error::application(join)),
            })
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::async_failures(failures))
        }
    })))
}
