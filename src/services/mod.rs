//! Everything that touches the host: app catalogue, classifier HTTP client, action handlers.

pub mod apps;
pub mod classifier;
pub mod handlers;
