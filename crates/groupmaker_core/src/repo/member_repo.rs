//! Member repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `members` table.
//! - Preserve roster insertion order on read.
//!
//! # Invariants
//! - Listing is ordered by `seq ASC` (insertion order).
//! - Write paths validate names before SQL mutations.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::model::member::{normalize_name, Member, MemberId};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

/// Repository interface for roster members.
pub trait MemberRepository {
    fn list_members(&self) -> RepoResult<Vec<Member>>;
    fn create_member(&self, name: &str) -> RepoResult<Member>;
    fn rename_member(&self, id: MemberId, name: &str) -> RepoResult<Member>;
    fn delete_member(&self, id: MemberId) -> RepoResult<()>;
    /// Removes every member; returns how many rows were deleted.
    fn clear_members(&self) -> RepoResult<usize>;
}

/// SQLite-backed member repository.
pub struct SqliteMemberRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMemberRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl MemberRepository for SqliteMemberRepository<'_> {
    fn list_members(&self) -> RepoResult<Vec<Member>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid, name FROM members ORDER BY seq ASC;")?;
        let mut rows = stmt.query([])?;
        let mut members = Vec::new();

        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }

        Ok(members)
    }

    fn create_member(&self, name: &str) -> RepoResult<Member> {
        let member = Member::new(name)?;

        self.conn.execute(
            "INSERT INTO members (uuid, name) VALUES (?1, ?2);",
            params![member.id.to_string(), member.name.as_str()],
        )?;

        Ok(member)
    }

    fn rename_member(&self, id: MemberId, name: &str) -> RepoResult<Member> {
        let name = normalize_name(name)?;

        let changed = self.conn.execute(
            "UPDATE members
             SET
                name = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?2;",
            params![name.as_str(), id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(Member { id, name })
    }

    fn delete_member(&self, id: MemberId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM members WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn clear_members(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM members;", [])?)
    }
}

fn parse_member_row(row: &Row<'_>) -> RepoResult<Member> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in members.uuid"))
    })?;
    let name: String = row.get("name")?;

    let member = Member { id, name };
    member.validate().map_err(|err| {
        RepoError::InvalidData(format!("invalid member `{}` in members.name: {err}", member.id))
    })?;
    Ok(member)
}
