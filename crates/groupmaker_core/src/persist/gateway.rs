//! Persistence gateway contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the storage surface the session depends on.
//! - Compose member and group-set repositories over one connection.
//!
//! # Invariants
//! - `init` is idempotent.
//! - Every call either completes fully or returns an error; no retries.

use crate::db::{migrations::apply_migrations, open_db, open_db_in_memory, DbError};
use crate::model::group::GroupSet;
use crate::model::member::{Member, MemberId};
use crate::repo::group_set_repo::{GroupSetRecord, GroupSetRepository, SqliteGroupSetRepository};
use crate::repo::member_repo::{MemberRepository, SqliteMemberRepository};
use crate::repo::RepoError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type PersistResult<T> = Result<T, PersistenceError>;

/// Storage failure seen by persistence callers.
#[derive(Debug)]
pub enum PersistenceError {
    /// Repository or database failure.
    Repo(RepoError),
    /// Background worker thread could not be started.
    Spawn(std::io::Error),
    /// Background worker is gone; the request was not executed.
    WorkerStopped,
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Spawn(err) => write!(f, "failed to start persistence worker: {err}"),
            Self::WorkerStopped => write!(f, "persistence worker is not running"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Spawn(err) => Some(err),
            Self::WorkerStopped => None,
        }
    }
}

impl From<RepoError> for PersistenceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for PersistenceError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

/// Durable store for the roster and the latest group-set snapshot.
pub trait PersistenceGateway {
    /// Prepares storage for use.
    fn init(&mut self) -> PersistResult<()>;
    /// Returns all members in insertion order.
    fn get_all_members(&mut self) -> PersistResult<Vec<Member>>;
    /// Stores a new member and returns it with its assigned id.
    fn add_member(&mut self, name: &str) -> PersistResult<Member>;
    fn update_member(&mut self, id: MemberId, name: &str) -> PersistResult<Member>;
    fn delete_member(&mut self, id: MemberId) -> PersistResult<()>;
    fn clear_all_members(&mut self) -> PersistResult<()>;
    fn get_latest_group_set(&mut self) -> PersistResult<Option<GroupSetRecord>>;
    /// Appends a snapshot and returns its storage id.
    fn save_group_set(&mut self, group_set: &GroupSet) -> PersistResult<i64>;
    fn clear_all_group_sets(&mut self) -> PersistResult<()>;
}

/// SQLite-backed gateway owning one connection.
pub struct SqliteGateway {
    conn: Connection,
}

impl SqliteGateway {
    /// Opens (or creates) a database file with migrations applied.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    /// Opens a private in-memory database with migrations applied.
    pub fn open_in_memory() -> PersistResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }
}

impl PersistenceGateway for SqliteGateway {
    fn init(&mut self) -> PersistResult<()> {
        apply_migrations(&mut self.conn)?;
        Ok(())
    }

    fn get_all_members(&mut self) -> PersistResult<Vec<Member>> {
        Ok(SqliteMemberRepository::new(&self.conn).list_members()?)
    }

    fn add_member(&mut self, name: &str) -> PersistResult<Member> {
        Ok(SqliteMemberRepository::new(&self.conn).create_member(name)?)
    }

    fn update_member(&mut self, id: MemberId, name: &str) -> PersistResult<Member> {
        Ok(SqliteMemberRepository::new(&self.conn).rename_member(id, name)?)
    }

    fn delete_member(&mut self, id: MemberId) -> PersistResult<()> {
        Ok(SqliteMemberRepository::new(&self.conn).delete_member(id)?)
    }

    fn clear_all_members(&mut self) -> PersistResult<()> {
        SqliteMemberRepository::new(&self.conn).clear_members()?;
        Ok(())
    }

    fn get_latest_group_set(&mut self) -> PersistResult<Option<GroupSetRecord>> {
        Ok(SqliteGroupSetRepository::new(&self.conn).latest_group_set()?)
    }

    fn save_group_set(&mut self, group_set: &GroupSet) -> PersistResult<i64> {
        Ok(SqliteGroupSetRepository::new(&self.conn).save_group_set(group_set)?)
    }

    fn clear_all_group_sets(&mut self) -> PersistResult<()> {
        SqliteGroupSetRepository::new(&self.conn).clear_group_sets()?;
        Ok(())
    }
}
