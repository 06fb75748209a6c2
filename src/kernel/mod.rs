pub mod dialogue;
pub mod event;
pub mod history;
pub mod intent;
pub mod parse;
pub mod presence;
pub mod reactor;
pub mod router;
pub mod scheduler;
pub mod speech;
pub mod telemetry;
pub mod time;
pub mod ttl;
