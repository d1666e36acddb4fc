//! Interactive CLI layer (cliclack-based)
//!
//! Feature-gated behind `tui`; the rest of the library has no terminal
//! dependency.

pub mod prompts;

pub use prompts::{run, UnboxArgs};
