//! Group-set snapshot repository.
//!
//! # Responsibility
//! - Append JSON snapshots of group sets to `group_sets`.
//! - Return the most recent snapshot on load.
//!
//! # Invariants
//! - Latest snapshot is the row with the highest `id`.
//! - Snapshots are immutable once written; edits append a new row.
//! - Loaded snapshots hold only members that pass record validation.

use crate::model::group::GroupSet;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Stored group-set snapshot with storage metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSetRecord {
    /// Storage row id; increases with every save.
    pub id: i64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub data: GroupSet,
}

/// Repository interface for group-set snapshots.
pub trait GroupSetRepository {
    /// Appends a snapshot and returns its row id.
    fn save_group_set(&self, group_set: &GroupSet) -> RepoResult<i64>;
    fn latest_group_set(&self) -> RepoResult<Option<GroupSetRecord>>;
    /// Removes every snapshot; returns how many rows were deleted.
    fn clear_group_sets(&self) -> RepoResult<usize>;
}

/// SQLite-backed group-set repository.
pub struct SqliteGroupSetRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGroupSetRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl GroupSetRepository for SqliteGroupSetRepository<'_> {
    fn save_group_set(&self, group_set: &GroupSet) -> RepoResult<i64> {
        let payload = serde_json::to_string(group_set).map_err(RepoError::Encode)?;
        let group_count = count_to_db(group_set.group_count())?;
        let member_count = count_to_db(group_set.member_count())?;

        self.conn.execute(
            "INSERT INTO group_sets (payload, group_count, member_count)
             VALUES (?1, ?2, ?3);",
            params![payload, group_count, member_count],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn latest_group_set(&self) -> RepoResult<Option<GroupSetRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, created_at, payload
                 FROM group_sets
                 ORDER BY id DESC
                 LIMIT 1;",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>("id")?,
                        row.get::<_, i64>("created_at")?,
                        row.get::<_, String>("payload")?,
                    ))
                },
            )
            .optional()?;

        let Some((id, created_at, payload)) = row else {
            return Ok(None);
        };

        let data = serde_json::from_str::<GroupSet>(&payload).map_err(|err| {
            RepoError::InvalidData(format!("invalid payload in group_sets row {id}: {err}"))
        })?;
        if let Some(member) = data
            .groups()
            .iter()
            .flat_map(|group| group.members())
            .find(|member| member.validate().is_err())
        {
            return Err(RepoError::InvalidData(format!(
                "invalid member {} in group_sets row {id}",
                member.id
            )));
        }

        Ok(Some(GroupSetRecord {
            id,
            created_at,
            data,
        }))
    }

    fn clear_group_sets(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM group_sets;", [])?)
    }
}

fn count_to_db(value: usize) -> RepoResult<i64> {
    i64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("count {value} does not fit in i64")))
}
