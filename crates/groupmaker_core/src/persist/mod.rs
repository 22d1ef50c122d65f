//! Persistence boundary for roster and group-set snapshots.
//!
//! # Responsibility
//! - Define the gateway contract the session talks to.
//! - Run gateway calls off the caller's thread, with detached saves.

pub mod gateway;
pub mod worker;
