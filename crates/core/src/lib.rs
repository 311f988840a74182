#![forbid(unsafe_code)]

pub mod countdown;
pub mod model;
pub mod scoring;
pub mod shuffle;
pub mod time;

pub use time::Clock;
