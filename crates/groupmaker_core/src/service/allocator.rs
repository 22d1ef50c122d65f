//! Balanced random group allocation.
//!
//! # Responsibility
//! - Shuffle a roster uniformly and deal it into groups round-robin.
//! - Resolve the group count from a target value and grouping mode.
//!
//! # Invariants
//! - Output groups partition the input exactly (each member once).
//! - Group sizes differ by at most one.
//! - Every group is non-empty when the roster is non-empty.
//! - Allocation has no persistence side effects.

use crate::model::group::{GroupSet, GroupingMode};
use crate::model::member::Member;
use rand::{Rng, RngCore};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from allocation input checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// Target value is below 1.
    InvalidTarget(usize),
    /// Target text is empty, non-numeric, or below 1.
    InvalidTargetInput(String),
}

impl Display for AllocationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTarget(value) => write!(f, "target must be at least 1, got {value}"),
            Self::InvalidTargetInput(value) => {
                write!(f, "target must be a whole number of at least 1, got `{value}`")
            }
        }
    }
}

impl Error for AllocationError {}

/// Source of uniform index draws for shuffling.
pub trait ShuffleSource {
    /// Returns an index in `0..=upper`.
    fn pick(&mut self, upper: usize) -> usize;
}

impl<R: RngCore> ShuffleSource for R {
    fn pick(&mut self, upper: usize) -> usize {
        self.gen_range(0..=upper)
    }
}

/// Replays a fixed sequence of index draws.
///
/// Each scripted value is reduced modulo `upper + 1`. Once the script is
/// exhausted every draw returns `upper`, which leaves the remaining prefix in
/// place, so an empty script yields the identity permutation.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    picks: VecDeque<usize>,
}

impl ScriptedSource {
    pub fn new(picks: impl IntoIterator<Item = usize>) -> Self {
        Self {
            picks: picks.into_iter().collect(),
        }
    }

    /// Source that never reorders anything.
    pub fn identity() -> Self {
        Self::default()
    }
}

impl ShuffleSource for ScriptedSource {
    fn pick(&mut self, upper: usize) -> usize {
        match self.picks.pop_front() {
            Some(value) => value % (upper + 1),
            None => upper,
        }
    }
}

/// Resolved group shape for one allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationPlan {
    pub group_count: usize,
    /// Upper bound on members per group; informational in count mode.
    pub size_per_group: usize,
}

impl AllocationPlan {
    /// Resolves group count and per-group size for `member_count` members.
    ///
    /// Targets larger than the roster are clamped so that no group is empty.
    /// An empty roster resolves to zero groups.
    ///
    /// # Errors
    /// - `InvalidTarget` when `target < 1`.
    pub fn resolve(
        member_count: usize,
        target: usize,
        mode: GroupingMode,
    ) -> Result<Self, AllocationError> {
        if target < 1 {
            return Err(AllocationError::InvalidTarget(target));
        }
        if member_count == 0 {
            return Ok(Self {
                group_count: 0,
                size_per_group: 0,
            });
        }

        let plan = match mode {
            GroupingMode::ByGroupCount => {
                let group_count = target.min(member_count);
                Self {
                    group_count,
                    size_per_group: member_count.div_ceil(group_count),
                }
            }
            GroupingMode::ByGroupSize => {
                let size_per_group = target.min(member_count);
                Self {
                    group_count: member_count.div_ceil(size_per_group),
                    size_per_group,
                }
            }
        };
        Ok(plan)
    }
}

/// Parses the target field as typed by a user.
///
/// # Errors
/// - `InvalidTargetInput` for empty, non-numeric, or sub-1 values.
pub fn parse_target(input: &str) -> Result<usize, AllocationError> {
    let trimmed = input.trim();
    match trimmed.parse::<usize>() {
        Ok(value) if value >= 1 => Ok(value),
        _ => Err(AllocationError::InvalidTargetInput(trimmed.to_string())),
    }
}

/// Returns a uniformly shuffled copy of `members` (Fisher-Yates).
pub fn shuffled<S: ShuffleSource + ?Sized>(members: &[Member], source: &mut S) -> Vec<Member> {
    let mut order = members.to_vec();
    for i in (1..order.len()).rev() {
        let j = source.pick(i);
        order.swap(i, j);
    }
    order
}

/// Partitions `members` into balanced random groups.
///
/// Members are shuffled, then dealt round-robin: shuffled index `i` lands in
/// group `i % group_count`.
///
/// # Errors
/// - `InvalidTarget` when `target < 1`.
pub fn allocate<S: ShuffleSource + ?Sized>(
    members: &[Member],
    target: usize,
    mode: GroupingMode,
    source: &mut S,
) -> Result<GroupSet, AllocationError> {
    let plan = AllocationPlan::resolve(members.len(), target, mode)?;
    let mut group_set = GroupSet::with_empty_groups(plan.group_count);
    if plan.group_count == 0 {
        return Ok(group_set);
    }

    let groups = group_set.groups_mut();
    for (index, member) in shuffled(members, source).into_iter().enumerate() {
        groups[index % plan.group_count].push(member);
    }
    Ok(group_set)
}
