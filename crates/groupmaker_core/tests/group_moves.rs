use groupmaker_core::{allocate, Group, GroupSet, GroupSetError, GroupingMode, Member, MoveIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn members(names: &[&str]) -> Vec<Member> {
    names.iter().map(|name| Member::new(name).unwrap()).collect()
}

fn names(set: &GroupSet) -> Vec<Vec<String>> {
    set.groups()
        .iter()
        .map(|group| group.members().iter().map(|m| m.name.clone()).collect())
        .collect()
}

#[test]
fn moves_member_to_end_of_destination() {
    let m = members(&["A", "B", "C"]);
    let mut set = GroupSet::new(vec![
        Group::from(vec![m[0].clone(), m[1].clone()]),
        Group::from(vec![m[2].clone()]),
    ]);

    set.move_member(0, 1, 1).unwrap();

    assert_eq!(names(&set), vec![vec!["A"], vec!["C", "B"]]);
    assert_eq!(set.groups()[1].members().last(), Some(&m[1]));
}

#[test]
fn same_group_move_leaves_set_unchanged() {
    let m = members(&["A", "B", "C"]);
    let set = GroupSet::new(vec![
        Group::from(vec![m[0].clone(), m[1].clone()]),
        Group::from(vec![m[2].clone()]),
    ]);

    let moved = set.clone().with_member_moved(0, 0, 0).unwrap();
    assert_eq!(moved, set);
}

#[test]
fn same_group_move_with_unknown_member_index_is_a_no_op() {
    let m = members(&["A", "B"]);
    let set = GroupSet::new(vec![
        Group::from(vec![m[0].clone()]),
        Group::from(vec![m[1].clone()]),
    ]);

    let moved = set.clone().with_member_moved(0, 9, 0).unwrap();
    assert_eq!(moved, set);
    let moved = set.clone().with_member_moved(1, 1, 1).unwrap();
    assert_eq!(moved, set);
}

#[test]
fn out_of_range_moves_fail_without_changes() {
    let m = members(&["A", "B"]);
    let mut set = GroupSet::new(vec![
        Group::from(vec![m[0].clone()]),
        Group::from(vec![m[1].clone()]),
    ]);
    let before = set.clone();

    let cases = [
        ((9, 0, 1), MoveIndex::FromGroup),
        ((0, 0, 9), MoveIndex::ToGroup),
        ((0, 3, 1), MoveIndex::Member),
    ];
    for ((from, index, to), expected_kind) in cases {
        let err = set.move_member(from, index, to).unwrap_err();
        let GroupSetError::IndexOutOfRange { kind, .. } = err;
        assert_eq!(kind, expected_kind);
        assert_eq!(set, before);
    }
}

#[test]
fn moves_keep_partition_and_total_but_may_unbalance() {
    let roster = members(&["A", "B", "C", "D", "E", "F"]);
    let mut set = allocate(
        &roster,
        3,
        GroupingMode::ByGroupCount,
        &mut StdRng::seed_from_u64(11),
    )
    .unwrap();

    set.move_member(0, 0, 2).unwrap();
    set.move_member(1, 0, 2).unwrap();

    assert_eq!(set.member_count(), roster.len());
    assert!(set.is_partition_of(&roster));
    assert_eq!(set.sizes(), vec![1, 1, 4]);
}

#[test]
fn group_set_can_be_emptied_into_one_group() {
    let m = members(&["A", "B"]);
    let mut set = GroupSet::new(vec![
        Group::from(vec![m[0].clone()]),
        Group::from(vec![m[1].clone()]),
    ]);

    set.move_member(0, 0, 1).unwrap();

    assert!(set.groups()[0].is_empty());
    assert_eq!(set.group_count(), 2);
    assert!(set.is_partition_of(&m));
}
