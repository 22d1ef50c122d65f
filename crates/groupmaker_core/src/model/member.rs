//! Member and roster domain model.
//!
//! # Responsibility
//! - Define the canonical member record shared by roster and group views.
//! - Keep roster ordering and id-based lookup in one place.
//!
//! # Invariants
//! - `id` is stable and never reused for another member.
//! - `name` is non-blank after trim.
//! - Roster order is insertion order; uniqueness is by id, not by name.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static NAME_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,\n]").expect("valid name separator regex"));

/// Stable identifier for a roster member.
pub type MemberId = Uuid;

/// Validation failures for member records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberValidationError {
    /// Name is empty after trimming whitespace.
    BlankName,
}

impl Display for MemberValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "member name must not be blank"),
        }
    }
}

impl Error for MemberValidationError {}

/// One named entity in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
}

impl Member {
    /// Creates a member with a generated id and a trimmed name.
    pub fn new(name: impl AsRef<str>) -> Result<Self, MemberValidationError> {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Creates a member with a caller-provided id.
    ///
    /// Used by storage read paths where identity already exists.
    pub fn with_id(id: MemberId, name: impl AsRef<str>) -> Result<Self, MemberValidationError> {
        Ok(Self {
            id,
            name: normalize_name(name.as_ref())?,
        })
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), MemberValidationError> {
        if self.name.trim().is_empty() {
            return Err(MemberValidationError::BlankName);
        }
        Ok(())
    }
}

/// Trims a member name and rejects blank input.
pub fn normalize_name(name: &str) -> Result<String, MemberValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(MemberValidationError::BlankName);
    }
    Ok(trimmed.to_string())
}

/// Splits free-text input into member names.
///
/// Entries are separated by comma or newline, trimmed, and empty entries are
/// dropped. Duplicates are kept.
pub fn parse_member_names(input: &str) -> Vec<String> {
    NAME_SEPARATOR_RE
        .split(input)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Errors from in-memory roster edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    /// No member with this id exists in the roster.
    NotFound(MemberId),
    /// Member input failed validation.
    Validation(MemberValidationError),
}

impl Display for RosterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "member not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RosterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<MemberValidationError> for RosterError {
    fn from(value: MemberValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Ordered member collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    members: Vec<Member>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a roster from already-identified members, keeping their order.
    pub fn from_members(members: Vec<Member>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, id: MemberId) -> Option<&Member> {
        self.members.iter().find(|member| member.id == id)
    }

    /// Appends a member record that already has its identity.
    pub fn push(&mut self, member: Member) -> &Member {
        self.members.push(member);
        &self.members[self.members.len() - 1]
    }

    /// Renames a member in place.
    pub fn update(&mut self, id: MemberId, name: impl AsRef<str>) -> Result<&Member, RosterError> {
        let name = normalize_name(name.as_ref())?;
        let index = self.position(id).ok_or(RosterError::NotFound(id))?;
        self.members[index].name = name;
        Ok(&self.members[index])
    }

    /// Removes a member, keeping the relative order of the others.
    pub fn remove(&mut self, id: MemberId) -> Result<Member, RosterError> {
        let index = self.position(id).ok_or(RosterError::NotFound(id))?;
        Ok(self.members.remove(index))
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    fn position(&self, id: MemberId) -> Option<usize> {
        self.members.iter().position(|member| member.id == id)
    }
}
