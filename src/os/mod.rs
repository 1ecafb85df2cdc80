//! OS-level interactions.
//!
//! Provides access to the process environment via [`env`].

pub mod env;
