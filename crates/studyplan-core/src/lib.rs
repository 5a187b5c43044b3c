//! Rule-based study planning.
//!
//! [`plan`] holds the request and plan types and the generator itself;
//! [`runner`] is the boundary callers go through to run it, either in
//! process or in a child process.

pub mod plan;
pub mod runner;
