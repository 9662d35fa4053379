//! lexidrill-core — Entry model, weighted sampler, CSV codec and reply
//! interpreter.
//!
//! This crate holds everything the drill flows need that does not talk to
//! the network. Text generation and speech synthesis are reached through the
//! traits in [`traits`]; `lexidrill-providers` implements them.

pub mod csv;
pub mod error;
pub mod interpreter;
pub mod model;
pub mod practice;
pub mod prompt;
pub mod sampler;
pub mod store;
pub mod traits;
