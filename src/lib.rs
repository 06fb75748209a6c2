pub mod config;
pub mod kernel;
pub mod services;

// Re-export specific items for convenient access
pub use config::AssistantConfig;
pub use kernel::reactor::Reactor;
pub use kernel::router::{Decision, Outcome, Route, Router};
