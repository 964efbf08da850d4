#![forbid(unsafe_code)]

pub mod model;
pub mod time;
pub mod verifier;

pub use time::Clock;
