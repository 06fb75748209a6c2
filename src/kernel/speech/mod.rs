pub mod planner;

pub use planner::{acknowledgement, Cue};
