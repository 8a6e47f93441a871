use serde::{Deserialize, Serialize};

/// Fired once after a container finished starting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Startup {
    /// Id of the container that started
    pub container_id: String,
}

/// Fired once when a container begins shutting down, before any context is
/// destroyed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shutdown {
    /// Id of the container that is shutting down
    pub container_id: String,
}
