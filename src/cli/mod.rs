//! Command line interface module
//!
//! Argument parsing and the runner that drives pipes and authentication modules
//! from the `aerogear-pipes` binary.

pub mod args;
pub mod runner;

pub use args::{Args, Command, Credentials};
pub use runner::Runner;
