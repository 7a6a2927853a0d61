//! Command Line Interface (CLI) layer for MOSAICPRO.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! batch file-name patterns (`pattern`), and the orchestration logic
//! (`runner`) for the `process`, `batch`, `folder`, `init-config` and
//! `info` commands. It wires user-provided options to the library
//! functionality exposed via `mosaicpro::api`.
//!
//! If you are embedding MOSAICPRO into another application, prefer using
//! the high-level `mosaicpro::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod pattern;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
