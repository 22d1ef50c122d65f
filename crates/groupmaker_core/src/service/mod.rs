//! Core use-case services.
//!
//! # Responsibility
//! - Allocate rosters into balanced groups.
//! - Orchestrate roster edits, allocation and moves over persistence.

pub mod allocator;
pub mod session;
