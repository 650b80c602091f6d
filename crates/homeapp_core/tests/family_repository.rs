mod common;

use chrono::{NaiveDate, Timelike};
use common::{at, memory_repository};
use homeapp_core::repo::datetime::{from_epoch_millis, to_epoch_millis};
use homeapp_core::{RepoError, Task};
use uuid::Uuid;

#[test]
fn members_and_tasks_are_listed_in_insertion_order() {
    let repo = memory_repository();
    let zoe = repo.add_member("Zoe").unwrap();
    let adam = repo.add_member("Adam").unwrap();
    let second = Task::new("second", at(6, 9, 0));
    let first = Task::new("first", at(7, 9, 0));
    repo.add_task(zoe, &second).unwrap();
    repo.add_task(zoe, &first).unwrap();

    let members = repo.members_snapshot().unwrap();
    let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["Zoe", "Adam"]);
    assert_eq!(members[0].id, zoe);
    assert_eq!(members[1].id, adam);
    let titles: Vec<_> = members[0].tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["second", "first"]);
    assert!(members[1].tasks.is_empty());
}

#[test]
fn removing_member_removes_exactly_its_tasks() {
    let repo = memory_repository();
    let alex = repo.add_member("Alex").unwrap();
    let sam = repo.add_member("Sam").unwrap();
    let alex_tasks = [
        Task::new("dishes", at(5, 18, 0)),
        Task::new("laundry", at(5, 19, 0)),
    ];
    for task in &alex_tasks {
        repo.add_task(alex, task).unwrap();
    }
    let sam_task = Task::new("trash", at(5, 20, 0));
    repo.add_task(sam, &sam_task).unwrap();

    let deletion = repo.remove_member(alex).unwrap();
    assert!(deletion.member_removed);
    assert_eq!(deletion.tasks_removed, 2);

    let members = repo.members_snapshot().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, sam);
    assert_eq!(members[0].tasks, vec![sam_task.clone()]);
    for task in &alex_tasks {
        assert_eq!(repo.find_task(task.id).unwrap(), None);
    }

    let orphans: i64 = repo.store().with_conn(|conn| {
        conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE memberId = ?1;",
            [alex.to_string()],
            |row| row.get(0),
        )
        .unwrap()
    });
    assert_eq!(orphans, 0);
}

#[test]
fn cascade_holds_across_interleaved_sequences() {
    let repo = memory_repository();
    let mut expected_tasks = 0usize;
    let mut members = Vec::new();
    for round in 0..4u32 {
        let member = repo.add_member(&format!("member {round}")).unwrap();
        for n in 0..=round {
            repo.add_task(member, &Task::new(format!("task {n}"), at(10, 8, n)))
                .unwrap();
        }
        expected_tasks += round as usize + 1;
        members.push((member, round as usize + 1));
    }

    // Remove every other member, checking counts after each step.
    for (member, owned) in members.iter().step_by(2) {
        let deletion = repo.remove_member(*member).unwrap();
        assert_eq!(deletion.tasks_removed, *owned);
        expected_tasks -= owned;

        let snapshot = repo.members_snapshot().unwrap();
        let total: usize = snapshot.iter().map(|m| m.tasks.len()).sum();
        assert_eq!(total, expected_tasks);
        assert!(snapshot.iter().all(|m| m.id != *member));
    }
}

#[test]
fn add_task_always_stores_an_open_task() {
    let repo = memory_repository();
    let member = repo.add_member("Alex").unwrap();
    let mut task = Task::new("Buy milk", at(5, 10, 0));
    task.is_done = true;
    task.completed_at = Some(at(5, 9, 0));

    repo.add_task(member, &task).unwrap();

    let stored = repo.find_task(task.id).unwrap().unwrap();
    assert!(!stored.is_done);
    assert_eq!(stored.completed_at, None);
}

#[test]
fn toggling_twice_restores_the_original_status() {
    let repo = memory_repository();
    let member = repo.add_member("Alex").unwrap();
    let task = Task::new("Buy milk", at(5, 10, 0));
    repo.add_task(member, &task).unwrap();
    let original = repo.find_task(task.id).unwrap().unwrap();

    let done = original.toggled(at(5, 9, 30));
    assert!(repo
        .toggle_task(task.id, done.is_done, done.completed_at)
        .unwrap());
    let completed = repo.find_task(task.id).unwrap().unwrap();
    assert!(completed.is_done);
    assert_eq!(completed.completed_at, Some(at(5, 9, 30)));

    let reopened = completed.toggled(at(5, 9, 45));
    assert!(repo
        .toggle_task(task.id, reopened.is_done, reopened.completed_at)
        .unwrap());
    assert_eq!(repo.find_task(task.id).unwrap().unwrap(), original);
}

#[test]
fn completed_at_is_present_exactly_when_done() {
    let repo = memory_repository();
    let member = repo.add_member("Alex").unwrap();
    let tasks = [
        Task::new("a", at(5, 10, 0)),
        Task::new("b", at(5, 11, 0)),
        Task::new("c", at(5, 12, 0)),
    ];
    for task in &tasks {
        repo.add_task(member, task).unwrap();
    }
    let done = tasks[1].toggled(at(5, 10, 30));
    repo.toggle_task(tasks[1].id, done.is_done, done.completed_at)
        .unwrap();

    for task in &repo.members_snapshot().unwrap()[0].tasks {
        assert_eq!(task.is_done, task.completed_at.is_some(), "{:?}", task.id);
    }
}

#[test]
fn operations_on_absent_ids_are_silent_noops() {
    let repo = memory_repository();
    let member = repo.add_member("Alex").unwrap();
    repo.add_task(member, &Task::new("keep", at(5, 10, 0)))
        .unwrap();
    let before = repo.members_snapshot().unwrap();
    let version = repo.store().version();

    let deletion = repo.remove_member(Uuid::new_v4()).unwrap();
    assert!(!deletion.member_removed);
    assert_eq!(deletion.tasks_removed, 0);
    assert!(!repo.remove_task(Uuid::new_v4()).unwrap());
    assert!(!repo
        .toggle_task(Uuid::new_v4(), true, Some(at(5, 9, 0)))
        .unwrap());

    assert_eq!(repo.members_snapshot().unwrap(), before);
    assert_eq!(repo.store().version(), version);
}

#[test]
fn successful_writes_bump_the_change_version() {
    let repo = memory_repository();
    let start = repo.store().version();
    let member = repo.add_member("Alex").unwrap();
    let task = Task::new("t", at(5, 10, 0));
    repo.add_task(member, &task).unwrap();
    repo.remove_task(task.id).unwrap();
    assert_eq!(repo.store().version(), start + 3);
}

#[test]
fn adding_task_for_unknown_member_fails() {
    let repo = memory_repository();
    let err = repo
        .add_task(Uuid::new_v4(), &Task::new("orphan", at(5, 10, 0)))
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)), "{err}");
}

#[test]
fn empty_names_are_accepted_unless_strict() {
    let lenient = memory_repository();
    let id = lenient.add_member("").unwrap();
    assert_eq!(lenient.members_snapshot().unwrap()[0].id, id);

    let strict = memory_repository().with_strict_names(true);
    let err = strict.add_member("   ").unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(strict.members_snapshot().unwrap().is_empty());
    assert!(strict.add_member("Alex").is_ok());
}

#[test]
fn deadlines_round_trip_at_millisecond_precision() {
    let repo = memory_repository();
    let member = repo.add_member("Alex").unwrap();
    let deadline = NaiveDate::from_ymd_opt(2025, 3, 5)
        .and_then(|date| date.and_hms_micro_opt(14, 30, 15, 123_456))
        .unwrap();
    let task = Task::new("precise", deadline);
    repo.add_task(member, &task).unwrap();

    let stored = repo.find_task(task.id).unwrap().unwrap();
    assert_eq!(stored.deadline, deadline.with_nanosecond(123_000_000).unwrap());
    assert_eq!(
        from_epoch_millis(to_epoch_millis(stored.deadline)).unwrap(),
        stored.deadline
    );
}
