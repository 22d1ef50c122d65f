//! Core domain logic for groupmaker.
//! This crate is the single source of truth for roster and grouping invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod persist;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::group::{Group, GroupSet, GroupSetError, GroupingMode, MoveIndex};
pub use model::member::{
    parse_member_names, Member, MemberId, MemberValidationError, Roster, RosterError,
};
pub use persist::gateway::{PersistResult, PersistenceError, PersistenceGateway, SqliteGateway};
pub use persist::worker::{PersistenceEvent, PersistenceWorker};
pub use repo::group_set_repo::{GroupSetRecord, GroupSetRepository, SqliteGroupSetRepository};
pub use repo::member_repo::{MemberRepository, SqliteMemberRepository};
pub use repo::{RepoError, RepoResult};
pub use service::allocator::{
    allocate, parse_target, shuffled, AllocationError, AllocationPlan, ScriptedSource,
    ShuffleSource,
};
pub use service::session::{GroupingSession, SessionError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
