//! jazz2d - 2D spatial collision engine
//!
//! The engine itself lives in the workspace crates; this crate holds the
//! application layer (configuration) shared by the headless runner and
//! its integration tests.

pub mod config;
