//! Domain model for rosters and group partitions.
//!
//! # Responsibility
//! - Define canonical data structures used by allocation and session logic.
//!
//! # Invariants
//! - Every member is identified by a stable `MemberId`.
//! - A `GroupSet` is an independent snapshot, never a live view of a roster.

pub mod group;
pub mod member;
