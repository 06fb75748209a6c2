//! Pure text parsers. No state, no clock.

pub mod delay;
pub mod numeric;
pub mod text;

pub use delay::{parse_delay, DelayForm, DelayRequest};
pub use numeric::{clamp_steps, extract_steps, parse_numeric};
pub use text::normalize;
