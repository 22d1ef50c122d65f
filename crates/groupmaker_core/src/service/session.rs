//! Grouping session use-case service.
//!
//! # Responsibility
//! - Own the in-memory roster, current group set, grouping mode and edit state.
//! - Route roster edits through persistence and mirror them in memory.
//! - Allocate and move members, saving group-set snapshots without blocking.
//!
//! # Invariants
//! - In-memory roster changes only after persistence accepted the edit.
//! - The current group set always partitions the roster it was allocated
//!   from; moves keep it that way.
//! - Group-set save failures never fail the triggering call; they are logged
//!   and published as `PersistenceEvent`s.

use crate::model::group::{GroupSet, GroupSetError, GroupingMode};
use crate::model::member::{
    parse_member_names, Member, MemberId, MemberValidationError, Roster, RosterError,
};
use crate::persist::gateway::{PersistenceError, PersistenceGateway};
use crate::persist::worker::{PersistenceEvent, PersistenceWorker};
use crate::repo::RepoError;
use crate::service::allocator::{
    allocate, parse_target, AllocationError, AllocationPlan, ShuffleSource,
};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors returned to session callers.
#[derive(Debug)]
pub enum SessionError {
    /// Free-text input contained no usable names.
    EmptyInput,
    /// Allocation was requested with no members in the roster.
    EmptyRoster,
    Allocation(AllocationError),
    Move(GroupSetError),
    MemberNotFound(MemberId),
    InvalidMember(MemberValidationError),
    Persistence(PersistenceError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "input contains no member names"),
            Self::EmptyRoster => write!(f, "roster is empty; add members before grouping"),
            Self::Allocation(err) => write!(f, "{err}"),
            Self::Move(err) => write!(f, "{err}"),
            Self::MemberNotFound(id) => write!(f, "member not found: {id}"),
            Self::InvalidMember(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Allocation(err) => Some(err),
            Self::Move(err) => Some(err),
            Self::InvalidMember(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::EmptyInput | Self::EmptyRoster | Self::MemberNotFound(_) => None,
        }
    }
}

impl From<AllocationError> for SessionError {
    fn from(value: AllocationError) -> Self {
        Self::Allocation(value)
    }
}

impl From<GroupSetError> for SessionError {
    fn from(value: GroupSetError) -> Self {
        Self::Move(value)
    }
}

impl From<RosterError> for SessionError {
    fn from(value: RosterError) -> Self {
        match value {
            RosterError::NotFound(id) => Self::MemberNotFound(id),
            RosterError::Validation(err) => Self::InvalidMember(err),
        }
    }
}

impl From<PersistenceError> for SessionError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::Repo(RepoError::NotFound(id)) => Self::MemberNotFound(id),
            PersistenceError::Repo(RepoError::Validation(err)) => Self::InvalidMember(err),
            other => Self::Persistence(other),
        }
    }
}

/// Single owner of grouping state for one user.
pub struct GroupingSession {
    store: PersistenceWorker,
    roster: Roster,
    group_set: GroupSet,
    mode: GroupingMode,
    editing: Option<MemberId>,
    revision: u64,
}

impl GroupingSession {
    /// Starts a session over `gateway` and restores stored state.
    ///
    /// # Side effects
    /// - Moves the gateway onto a persistence worker thread.
    /// - Loads members, then the latest group-set snapshot. Either load may
    ///   fail; failures are logged and the session starts without that part.
    ///
    /// # Errors
    /// - Worker spawn or gateway `init` failure.
    pub fn open<G>(gateway: G) -> Result<Self, SessionError>
    where
        G: PersistenceGateway + Send + 'static,
    {
        let store = PersistenceWorker::spawn(gateway)?;
        store.call(|gateway| gateway.init())?;

        let mut session = Self {
            store,
            roster: Roster::new(),
            group_set: GroupSet::default(),
            mode: GroupingMode::default(),
            editing: None,
            revision: 0,
        };

        if let Err(err) = session.reload_members() {
            error!("event=session_open module=session status=error stage=load_members error={err}");
        }
        session.restore_latest_group_set();

        info!(
            "event=session_open module=session status=ok members={} groups={}",
            session.roster.len(),
            session.group_set.group_count()
        );
        Ok(session)
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn group_set(&self) -> &GroupSet {
        &self.group_set
    }

    pub fn mode(&self) -> GroupingMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: GroupingMode) {
        self.mode = mode;
    }

    /// Flips between count and size mode, returning the new mode.
    pub fn toggle_mode(&mut self) -> GroupingMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    /// Revision number of the most recently issued group-set save.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Member currently loaded for editing, if any.
    pub fn editing(&self) -> Option<&Member> {
        self.editing.and_then(|id| self.roster.get(id))
    }

    /// Loads a member for editing; the next `submit_input` renames it.
    pub fn begin_edit(&mut self, id: MemberId) -> Result<&Member, SessionError> {
        let member = self.roster.get(id).ok_or(SessionError::MemberNotFound(id))?;
        self.editing = Some(id);
        Ok(member)
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Applies the input field: renames the edited member with the first
    /// parsed name, or adds every parsed name when not editing.
    pub fn submit_input(&mut self, input: &str) -> Result<Vec<Member>, SessionError> {
        let mut names = parse_member_names(input);
        if names.is_empty() {
            return Err(SessionError::EmptyInput);
        }

        match self.editing {
            Some(id) => {
                let updated = self.update_member(id, &names.swap_remove(0))?;
                self.editing = None;
                Ok(vec![updated])
            }
            None => self.add_names(names),
        }
    }

    /// Adds one member per name parsed from comma/newline separated input.
    pub fn add_members_from_input(&mut self, input: &str) -> Result<Vec<Member>, SessionError> {
        let names = parse_member_names(input);
        if names.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        self.add_names(names)
    }

    /// Renames a member by id.
    ///
    /// # Errors
    /// - `MemberNotFound` when either the store or the in-memory roster lacks
    ///   the id; call `reload_members` to resync after the latter.
    pub fn update_member(&mut self, id: MemberId, name: &str) -> Result<Member, SessionError> {
        let name = name.to_string();
        let stored = self
            .store
            .call(move |gateway| gateway.update_member(id, &name))?;
        let updated = self.roster.update(id, &stored.name)?.clone();
        info!("event=member_update module=session status=ok");
        Ok(updated)
    }

    /// Deletes a member by id, leaving edit mode if it was being edited.
    ///
    /// The current group set is a snapshot and keeps the member.
    pub fn remove_member(&mut self, id: MemberId) -> Result<Member, SessionError> {
        self.store.call(move |gateway| gateway.delete_member(id))?;
        if self.editing == Some(id) {
            self.editing = None;
        }
        let removed = self.roster.remove(id)?;
        info!(
            "event=member_delete module=session status=ok remaining={}",
            self.roster.len()
        );
        Ok(removed)
    }

    /// Deletes all members and stored group sets.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.store.call(|gateway| {
            gateway.clear_all_members()?;
            gateway.clear_all_group_sets()
        })?;
        self.roster.clear();
        self.group_set = GroupSet::default();
        self.editing = None;
        info!("event=session_reset module=session status=ok");
        Ok(())
    }

    /// Replaces the in-memory roster with the stored one.
    pub fn reload_members(&mut self) -> Result<(), SessionError> {
        let members = self.store.call(|gateway| gateway.get_all_members())?;
        self.roster = Roster::from_members(members);
        Ok(())
    }

    /// Group shape an allocation with `target` would produce right now.
    pub fn plan(&self, target: usize) -> Result<AllocationPlan, SessionError> {
        Ok(AllocationPlan::resolve(self.roster.len(), target, self.mode)?)
    }

    /// Allocates the roster into groups using thread-local randomness.
    pub fn allocate(&mut self, target: usize) -> Result<&GroupSet, SessionError> {
        self.allocate_with(target, &mut rand::thread_rng())
    }

    /// Allocates the roster into groups drawing shuffles from `source`.
    ///
    /// # Errors
    /// - `EmptyRoster` when there is nobody to group.
    /// - `Allocation(InvalidTarget)` when `target < 1`.
    pub fn allocate_with<S: ShuffleSource + ?Sized>(
        &mut self,
        target: usize,
        source: &mut S,
    ) -> Result<&GroupSet, SessionError> {
        if self.roster.is_empty() {
            return Err(SessionError::EmptyRoster);
        }

        self.group_set = allocate(self.roster.members(), target, self.mode, source)?;
        let revision = self.persist_group_set();
        info!(
            "event=group_allocate module=session status=ok mode={} target={} members={} groups={} revision={}",
            self.mode.as_str(),
            target,
            self.roster.len(),
            self.group_set.group_count(),
            revision
        );
        Ok(&self.group_set)
    }

    /// Allocates using the target as typed into the input field.
    pub fn allocate_from_input(&mut self, input: &str) -> Result<&GroupSet, SessionError> {
        if self.roster.is_empty() {
            return Err(SessionError::EmptyRoster);
        }
        let target = parse_target(input)?;
        self.allocate(target)
    }

    /// Moves one member to the end of another group.
    ///
    /// Same-group moves change nothing and issue no save.
    pub fn move_member(
        &mut self,
        from_group: usize,
        member_index: usize,
        to_group: usize,
    ) -> Result<&GroupSet, SessionError> {
        if let Err(err) = self
            .group_set
            .move_member(from_group, member_index, to_group)
        {
            warn!("event=member_move module=session status=rejected error={err}");
            return Err(err.into());
        }

        if from_group != to_group {
            let revision = self.persist_group_set();
            info!(
                "event=member_move module=session status=ok from_group={} to_group={} revision={}",
                from_group, to_group, revision
            );
        }
        Ok(&self.group_set)
    }

    /// Blocks until every save issued so far has completed.
    pub fn flush(&self) -> Result<(), SessionError> {
        Ok(self.store.flush()?)
    }

    /// Returns detached save outcomes published since the last call.
    pub fn drain_persistence_events(&self) -> Vec<PersistenceEvent> {
        self.store.drain_events()
    }

    fn add_names(&mut self, names: Vec<String>) -> Result<Vec<Member>, SessionError> {
        let mut added = Vec::with_capacity(names.len());
        for name in names {
            let member = self.store.call(move |gateway| gateway.add_member(&name))?;
            self.roster.push(member.clone());
            added.push(member);
        }
        info!(
            "event=member_add module=session status=ok added={} total={}",
            added.len(),
            self.roster.len()
        );
        Ok(added)
    }

    fn restore_latest_group_set(&mut self) {
        match self.store.call(|gateway| gateway.get_latest_group_set()) {
            Ok(Some(record)) => self.group_set = record.data,
            Ok(None) => {}
            Err(err) => {
                error!(
                    "event=session_open module=session status=error stage=load_group_set error={err}"
                );
            }
        }
    }

    fn persist_group_set(&mut self) -> u64 {
        self.revision += 1;
        self.store
            .save_group_set_detached(self.revision, self.group_set.clone());
        self.revision
    }
}
