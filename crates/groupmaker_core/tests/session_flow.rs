use groupmaker_core::{
    AllocationError, GroupSet, GroupSetRecord, GroupingMode, GroupingSession, Member, MemberId,
    PersistResult, PersistenceError, PersistenceEvent, PersistenceGateway, RepoError,
    ScriptedSource, SessionError, SqliteGateway,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

fn open_session() -> GroupingSession {
    GroupingSession::open(SqliteGateway::open_in_memory().unwrap()).unwrap()
}

fn group_names(set: &GroupSet) -> Vec<Vec<String>> {
    set.groups()
        .iter()
        .map(|group| group.members().iter().map(|m| m.name.clone()).collect())
        .collect()
}

/// Gateway whose group-set saves can be switched to fail.
struct FlakyGateway {
    inner: SqliteGateway,
    fail_saves: Arc<AtomicBool>,
}

impl PersistenceGateway for FlakyGateway {
    fn init(&mut self) -> PersistResult<()> {
        self.inner.init()
    }

    fn get_all_members(&mut self) -> PersistResult<Vec<Member>> {
        self.inner.get_all_members()
    }

    fn add_member(&mut self, name: &str) -> PersistResult<Member> {
        self.inner.add_member(name)
    }

    fn update_member(&mut self, id: MemberId, name: &str) -> PersistResult<Member> {
        self.inner.update_member(id, name)
    }

    fn delete_member(&mut self, id: MemberId) -> PersistResult<()> {
        self.inner.delete_member(id)
    }

    fn clear_all_members(&mut self) -> PersistResult<()> {
        self.inner.clear_all_members()
    }

    fn get_latest_group_set(&mut self) -> PersistResult<Option<GroupSetRecord>> {
        self.inner.get_latest_group_set()
    }

    fn save_group_set(&mut self, group_set: &GroupSet) -> PersistResult<i64> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PersistenceError::Repo(RepoError::InvalidData(
                "disk full".to_string(),
            )));
        }
        self.inner.save_group_set(group_set)
    }

    fn clear_all_group_sets(&mut self) -> PersistResult<()> {
        self.inner.clear_all_group_sets()
    }
}

#[test]
fn free_text_input_adds_one_member_per_name() {
    let mut session = open_session();

    let added = session.add_members_from_input("Ann, Bob\nCara").unwrap();

    let names: Vec<&str> = added.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Ann", "Bob", "Cara"]);
    assert_eq!(session.roster().len(), 3);
}

#[test]
fn blank_input_is_rejected() {
    let mut session = open_session();
    assert!(matches!(
        session.add_members_from_input(" ,\n "),
        Err(SessionError::EmptyInput)
    ));
    assert!(matches!(
        session.submit_input(""),
        Err(SessionError::EmptyInput)
    ));
}

#[test]
fn allocation_on_empty_roster_is_a_notice() {
    let mut session = open_session();
    assert!(matches!(session.allocate(2), Err(SessionError::EmptyRoster)));
    assert!(matches!(
        session.allocate_from_input("2"),
        Err(SessionError::EmptyRoster)
    ));
    assert_eq!(session.revision(), 0);
}

#[test]
fn invalid_targets_are_rejected_without_touching_groups() {
    let mut session = open_session();
    session.add_members_from_input("A,B,C").unwrap();

    assert!(matches!(
        session.allocate(0),
        Err(SessionError::Allocation(AllocationError::InvalidTarget(0)))
    ));
    assert!(matches!(
        session.allocate_from_input("zero"),
        Err(SessionError::Allocation(AllocationError::InvalidTargetInput(_)))
    ));
    assert!(session.group_set().is_empty());
}

#[test]
fn allocate_then_move_persists_latest_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.sqlite3");

    let expected = {
        let mut session = GroupingSession::open(SqliteGateway::open(&path).unwrap()).unwrap();
        session.add_members_from_input("A,B,C,D,E").unwrap();
        session
            .allocate_with(2, &mut ScriptedSource::identity())
            .unwrap();
        assert_eq!(
            group_names(session.group_set()),
            vec![vec!["A", "C", "E"], vec!["B", "D"]]
        );

        session.move_member(0, 1, 1).unwrap();
        assert_eq!(
            group_names(session.group_set()),
            vec![vec!["A", "E"], vec!["B", "D", "C"]]
        );
        assert_eq!(session.revision(), 2);

        session.flush().unwrap();
        let events = session.drain_persistence_events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|event| !event.is_failure()));
        session.group_set().clone()
    };

    let restored = GroupingSession::open(SqliteGateway::open(&path).unwrap()).unwrap();
    assert_eq!(restored.roster().len(), 5);
    assert_eq!(restored.group_set(), &expected);
}

#[test]
fn same_group_move_issues_no_save() {
    let mut session = open_session();
    session.add_members_from_input("A,B,C").unwrap();
    session.allocate(2).unwrap();
    let before = session.group_set().clone();

    session.move_member(0, 0, 0).unwrap();

    assert_eq!(session.group_set(), &before);
    assert_eq!(session.revision(), 1);
}

#[test]
fn malformed_move_is_rejected_and_state_kept() {
    let mut session = open_session();
    session.add_members_from_input("A,B,C").unwrap();
    session.allocate(3).unwrap();
    let before = session.group_set().clone();

    assert!(matches!(
        session.move_member(0, 5, 1),
        Err(SessionError::Move(_))
    ));
    assert!(matches!(
        session.move_member(7, 0, 1),
        Err(SessionError::Move(_))
    ));
    assert_eq!(session.group_set(), &before);
}

#[test]
fn failed_saves_are_reported_as_events_not_errors() {
    let fail_saves = Arc::new(AtomicBool::new(false));
    let gateway = FlakyGateway {
        inner: SqliteGateway::open_in_memory().unwrap(),
        fail_saves: Arc::clone(&fail_saves),
    };
    let mut session = GroupingSession::open(gateway).unwrap();
    session.add_members_from_input("A,B,C,D").unwrap();
    session.allocate(2).unwrap();

    fail_saves.store(true, Ordering::SeqCst);
    let moved = session.move_member(0, 0, 1).unwrap().clone();
    assert_eq!(moved.sizes(), vec![1, 3]);

    session.flush().unwrap();
    let events = session.drain_persistence_events();
    assert_eq!(events.len(), 2);
    assert!(matches!(
        events[0],
        PersistenceEvent::GroupSetSaved { revision: 1, .. }
    ));
    assert!(matches!(
        &events[1],
        PersistenceEvent::GroupSetSaveFailed { revision: 2, .. }
    ));
    assert_eq!(session.group_set(), &moved);
}

#[test]
fn edit_mode_renames_with_first_parsed_name() {
    let mut session = open_session();
    let added = session.add_members_from_input("Ann,Bob").unwrap();
    let ann = added[0].id;

    assert_eq!(session.begin_edit(ann).unwrap().name, "Ann");
    let updated = session.submit_input("Anne, Ignored").unwrap();

    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].id, ann);
    assert_eq!(session.roster().members()[0].name, "Anne");
    assert_eq!(session.roster().len(), 2);
    assert!(session.editing().is_none());

    session.submit_input("Cara").unwrap();
    assert_eq!(session.roster().len(), 3);
}

#[test]
fn deleting_edited_member_leaves_edit_mode() {
    let mut session = open_session();
    let bob = session.add_members_from_input("Ann,Bob").unwrap()[1].id;

    session.begin_edit(bob).unwrap();
    let removed = session.remove_member(bob).unwrap();

    assert_eq!(removed.name, "Bob");
    assert!(session.editing().is_none());
    assert_eq!(session.roster().len(), 1);
}

#[test]
fn unknown_member_ids_are_not_found() {
    let mut session = open_session();
    let missing = Uuid::new_v4();

    assert!(matches!(
        session.begin_edit(missing),
        Err(SessionError::MemberNotFound(id)) if id == missing
    ));
    assert!(matches!(
        session.update_member(missing, "X"),
        Err(SessionError::MemberNotFound(id)) if id == missing
    ));
    assert!(matches!(
        session.remove_member(missing),
        Err(SessionError::MemberNotFound(id)) if id == missing
    ));
}

#[test]
fn group_set_is_a_snapshot_independent_of_roster_edits() {
    let mut session = open_session();
    let added = session.add_members_from_input("A,B,C").unwrap();
    session.allocate(1).unwrap();

    session.remove_member(added[0].id).unwrap();

    assert_eq!(session.roster().len(), 2);
    assert_eq!(session.group_set().member_count(), 3);
}

#[test]
fn reset_clears_roster_groups_and_storage() {
    let mut session = open_session();
    let added = session.add_members_from_input("A,B").unwrap();
    session.allocate(2).unwrap();
    session.begin_edit(added[0].id).unwrap();

    session.reset().unwrap();

    assert!(session.roster().is_empty());
    assert!(session.group_set().is_empty());
    assert!(session.editing().is_none());
    session.reload_members().unwrap();
    assert!(session.roster().is_empty());
}

#[test]
fn mode_toggles_between_count_and_size() {
    let mut session = open_session();
    session.add_members_from_input("A,B,C,D,E,F,G").unwrap();
    assert_eq!(session.mode(), GroupingMode::ByGroupCount);
    assert_eq!(session.plan(2).unwrap().group_count, 2);

    assert_eq!(session.toggle_mode(), GroupingMode::ByGroupSize);
    assert_eq!(session.plan(2).unwrap().group_count, 4);
    let set = session.allocate(3).unwrap();
    assert_eq!(set.group_count(), 3);

    session.set_mode(GroupingMode::ByGroupCount);
    assert_eq!(session.mode(), GroupingMode::ByGroupCount);
}

#[test]
fn same_group_move_with_bad_member_index_changes_nothing() {
    let mut session = open_session();
    session.add_members_from_input("A,B,C").unwrap();
    session.allocate(2).unwrap();
    let before = session.group_set().clone();

    session.move_member(1, 9, 1).unwrap();

    assert_eq!(session.group_set(), &before);
    assert_eq!(session.revision(), 1);
}

#[test]
fn renaming_member_missing_from_roster_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.sqlite3");
    let mut session = GroupingSession::open(SqliteGateway::open(&path).unwrap()).unwrap();
    session.add_members_from_input("Ann").unwrap();

    let mut other = SqliteGateway::open(&path).unwrap();
    let outsider = other.add_member("Zed").unwrap();

    assert!(matches!(
        session.update_member(outsider.id, "Zoe"),
        Err(SessionError::MemberNotFound(id)) if id == outsider.id
    ));
    assert_eq!(session.roster().len(), 1);
    assert!(session.roster().get(outsider.id).is_none());

    session.reload_members().unwrap();
    assert_eq!(session.roster().get(outsider.id).unwrap().name, "Zoe");
}
