//! Group partition model and move mutation.
//!
//! # Responsibility
//! - Define the persisted partition shape (`GroupSet` of `Group`s).
//! - Apply single-member relocations between groups.
//!
//! # Invariants
//! - A move never changes the total member count.
//! - A failed move leaves the group set untouched.
//! - Moved members are appended to the end of the destination group.

use crate::model::member::{Member, MemberId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// How the allocation target value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingMode {
    /// Target is the number of groups.
    #[default]
    ByGroupCount,
    /// Target is the number of members per group.
    ByGroupSize,
}

impl GroupingMode {
    /// Returns the other mode.
    pub fn toggled(self) -> Self {
        match self {
            Self::ByGroupCount => Self::ByGroupSize,
            Self::ByGroupSize => Self::ByGroupCount,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ByGroupCount => "count",
            Self::ByGroupSize => "size",
        }
    }

    /// Parses `count` or `size` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "count" => Some(Self::ByGroupCount),
            "size" => Some(Self::ByGroupSize),
            _ => None,
        }
    }
}

/// Which index of a move request was out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveIndex {
    FromGroup,
    Member,
    ToGroup,
}

impl Display for MoveIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FromGroup => write!(f, "source group"),
            Self::Member => write!(f, "member"),
            Self::ToGroup => write!(f, "destination group"),
        }
    }
}

/// Errors from group set mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupSetError {
    /// A move referenced a position outside current bounds.
    IndexOutOfRange {
        kind: MoveIndex,
        index: usize,
        len: usize,
    },
}

impl Display for GroupSetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange { kind, index, len } => {
                write!(f, "{kind} index {index} out of range (len {len})")
            }
        }
    }
}

impl Error for GroupSetError {}

/// One subset of the partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Group {
    members: Vec<Member>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
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

    pub(crate) fn push(&mut self, member: Member) {
        self.members.push(member);
    }
}

impl From<Vec<Member>> for Group {
    fn from(members: Vec<Member>) -> Self {
        Self { members }
    }
}

/// Complete partition produced by one allocation, later edited by moves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupSet {
    groups: Vec<Group>,
}

impl GroupSet {
    pub fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    /// Group set with `count` empty groups.
    pub(crate) fn with_empty_groups(count: usize) -> Self {
        Self {
            groups: vec![Group::new(); count],
        }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub(crate) fn groups_mut(&mut self) -> &mut [Group] {
        &mut self.groups
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total members across all groups.
    pub fn member_count(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }

    /// Group sizes in group order.
    pub fn sizes(&self) -> Vec<usize> {
        self.groups.iter().map(Group::len).collect()
    }

    /// Returns whether every member of `members` appears exactly once across
    /// all groups and nothing else does.
    pub fn is_partition_of(&self, members: &[Member]) -> bool {
        let mut expected: HashMap<MemberId, usize> = HashMap::new();
        for member in members {
            *expected.entry(member.id).or_default() += 1;
        }
        for member in self.groups.iter().flat_map(|group| group.members.iter()) {
            match expected.get_mut(&member.id) {
                Some(count) if *count > 0 => *count -= 1,
                _ => return false,
            }
        }
        expected.values().all(|count| *count == 0)
    }

    /// Moves one member from `from_group` to the end of `to_group`.
    ///
    /// # Contract
    /// - `from_group == to_group` is a no-op once `from_group` is in range;
    ///   the member index is not looked at.
    /// - Otherwise all indices are validated before anything is removed, so
    ///   failure leaves the set unchanged.
    ///
    /// # Errors
    /// - `IndexOutOfRange` when any index is outside current bounds.
    pub fn move_member(
        &mut self,
        from_group: usize,
        member_index: usize,
        to_group: usize,
    ) -> Result<(), GroupSetError> {
        let group_len = self.groups.len();
        let source = self
            .groups
            .get(from_group)
            .ok_or(GroupSetError::IndexOutOfRange {
                kind: MoveIndex::FromGroup,
                index: from_group,
                len: group_len,
            })?;
        if from_group == to_group {
            return Ok(());
        }
        if to_group >= group_len {
            return Err(GroupSetError::IndexOutOfRange {
                kind: MoveIndex::ToGroup,
                index: to_group,
                len: group_len,
            });
        }
        if member_index >= source.len() {
            return Err(GroupSetError::IndexOutOfRange {
                kind: MoveIndex::Member,
                index: member_index,
                len: source.len(),
            });
        }

        let member = self.groups[from_group].members.remove(member_index);
        self.groups[to_group].members.push(member);
        Ok(())
    }

    /// Consuming variant of [`GroupSet::move_member`].
    pub fn with_member_moved(
        mut self,
        from_group: usize,
        member_index: usize,
        to_group: usize,
    ) -> Result<Self, GroupSetError> {
        self.move_member(from_group, member_index, to_group)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{GroupSet, GroupSetError, GroupingMode, MoveIndex};
    use crate::model::member::Member;

    fn members(names: &[&str]) -> Vec<Member> {
        names.iter().map(|name| Member::new(name).unwrap()).collect()
    }

    fn set_of(groups: &[&[Member]]) -> GroupSet {
        GroupSet::new(groups.iter().map(|g| g.to_vec().into()).collect())
    }

    #[test]
    fn mode_toggle_and_parse() {
        assert_eq!(GroupingMode::default(), GroupingMode::ByGroupCount);
        assert_eq!(
            GroupingMode::ByGroupCount.toggled(),
            GroupingMode::ByGroupSize
        );
        assert_eq!(GroupingMode::parse(" SIZE "), Some(GroupingMode::ByGroupSize));
        assert_eq!(GroupingMode::parse("pairs"), None);
    }

    #[test]
    fn move_member_checks_every_index() {
        let m = members(&["A", "B", "C"]);
        let mut set = set_of(&[&m[..2], &m[2..]]);
        let before = set.clone();

        assert_eq!(
            set.move_member(2, 0, 0).unwrap_err(),
            GroupSetError::IndexOutOfRange {
                kind: MoveIndex::FromGroup,
                index: 2,
                len: 2
            }
        );
        assert!(matches!(
            set.move_member(0, 0, 5),
            Err(GroupSetError::IndexOutOfRange {
                kind: MoveIndex::ToGroup,
                ..
            })
        ));
        assert!(matches!(
            set.move_member(1, 1, 0),
            Err(GroupSetError::IndexOutOfRange {
                kind: MoveIndex::Member,
                ..
            })
        ));
        assert_eq!(set, before);
    }

    #[test]
    fn same_group_move_ignores_member_index() {
        let m = members(&["A", "B"]);
        let mut set = set_of(&[&m[..1], &m[1..]]);
        let before = set.clone();

        set.move_member(0, 9, 0).unwrap();
        set.move_member(1, 0, 1).unwrap();
        assert_eq!(set, before);

        assert!(matches!(
            set.move_member(4, 9, 4),
            Err(GroupSetError::IndexOutOfRange {
                kind: MoveIndex::FromGroup,
                ..
            })
        ));
    }

    #[test]
    fn is_partition_of_detects_missing_and_duplicate_members() {
        let m = members(&["A", "B", "C"]);
        assert!(set_of(&[&m[..1], &m[1..]]).is_partition_of(&m));
        assert!(!set_of(&[&m[..1]]).is_partition_of(&m));

        let duplicated = vec![m[0].clone(), m[0].clone()];
        assert!(!set_of(&[&duplicated, &m[1..]]).is_partition_of(&m));
    }

    #[test]
    fn serializes_as_nested_arrays() {
        let m = members(&["A"]);
        let set = set_of(&[&m[..], &[]]);
        let json = serde_json::to_value(&set).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0][0]["name"], "A");
        assert_eq!(json[1].as_array().unwrap().len(), 0);
    }
}
