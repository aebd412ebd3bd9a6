//! Monitor mode derivation and multi-point gesture recognition.

pub mod cli;
pub mod gesture;
pub mod monitor;
