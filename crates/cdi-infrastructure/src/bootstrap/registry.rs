//! Container registry
//!
//! Tracks the containers started through it by id. A process may own any
//! number of registries; nothing here is global.

use super::builder::ContainerBuilder;
use super::container::CdiContainer;
use cdi_domain::error::{Error, Result};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::warn;

pub(crate) type Containers = DashMap<String, CdiContainer>;

/// Running containers by id
#[derive(Clone, Default)]
pub struct ContainerRegistry {
    containers: Arc<Containers>,
}

impl ContainerRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a container and register it
    ///
    /// Fails when a container with the same id is already running.
    pub fn start(&self, builder: ContainerBuilder) -> Result<CdiContainer> {
        builder.launch(Some(&self.containers))
    }

    /// The only running container
    ///
    /// Fails when no container, or more than one, is running.
    pub fn current(&self) -> Result<CdiContainer> {
        let mut running: Vec<CdiContainer> = self
            .containers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        match running.len() {
            0 => Err(Error::illegal_state("No container is running")),
            1 => Ok(running.swap_remove(0)),
            n => Err(Error::illegal_state(format!(
                "{n} containers are running, look one up by id"
            ))),
        }
    }

    /// Running container with `id`
    pub fn get(&self, id: &str) -> Option<CdiContainer> {
        self.containers.get(id).map(|entry| entry.value().clone())
    }

    /// Close the container with `id`
    pub fn close(&self, id: &str) -> Result<()> {
        let container = self
            .get(id)
            .ok_or_else(|| Error::illegal_argument(format!("No running container with id {id}")))?;
        container.close()
    }

    /// Close every running container
    ///
    /// Every container is closed; the first failure is returned.
    pub fn close_all(&self) -> Result<()> {
        let containers: Vec<CdiContainer> = self
            .containers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        let mut first = None;
        for container in containers {
            if let Err(e) = container.close() {
                warn!(container = %container.id(), error = %e, "Closing container failed");
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }

    /// Ids of the running containers, sorted
    pub fn running(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .containers
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        ids.sort();
        ids
    }

    /// Number of running containers
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// Whether no container is running
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

impl std::fmt::Debug for ContainerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerRegistry")
            .field("running", &self.running())
            .finish()
    }
}
