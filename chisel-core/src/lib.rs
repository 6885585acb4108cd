//! Chisel release model and slice selection

pub mod setup;
