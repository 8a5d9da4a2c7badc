//! Compilation integration tests.
//!
//! Each module drives full compilations through `CompilationBuilder` with a
//! scripted backend and inspects the results.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

pub mod diagnostics;
pub mod folding;
pub mod roots;
pub mod scenarios;

pub mod util;
