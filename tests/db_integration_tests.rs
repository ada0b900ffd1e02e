//! Integration tests for the task store.
//!
//! These exercise categories, tasks, ordering, listing and archiving
//! together against an in-memory database.

use sharpei::db::{Database, StoreError};
use sharpei::types::{NewTask, TaskFilter, TaskPatch};

fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn titles(db: &Database, filter: &TaskFilter) -> Vec<String> {
    db.list_tasks(filter)
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect()
}

mod category_tests {
    use super::*;

    #[test]
    fn create_and_list_categories() {
        let db = setup_db();
        let work = db.create_category("Work").unwrap();
        let home = db.create_category("Home").unwrap();

        let categories = db.list_categories().unwrap();
        assert_eq!(categories, vec![work.clone(), home]);
        assert_eq!(db.get_category(work.id).unwrap(), Some(work));
    }

    #[test]
    fn duplicate_category_name_is_rejected() {
        let db = setup_db();
        db.create_category("Work").unwrap();

        let err = db.create_category("Work").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::DuplicateCategory(name)) if name == "Work"
        ));
        assert_eq!(db.list_categories().unwrap().len(), 1);
    }

    #[test]
    fn blank_category_name_is_rejected() {
        let db = setup_db();
        let err = db.create_category("   ").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::InvalidField { field: "name", .. })
        ));
    }

    #[test]
    fn deleting_category_severs_tasks_without_deleting_them() {
        let db = setup_db();
        let work = db.create_category("Work").unwrap();
        let a = db.create_task(NewTask::new("A").with_category(work.id)).unwrap();
        let b = db.create_task(NewTask::new("B").with_category(work.id)).unwrap();

        let deleted = db.delete_category(work.id).unwrap();
        assert_eq!(deleted.map(|c| c.name), Some("Work".to_string()));

        for id in [a.id, b.id] {
            let task = db.get_task(id).unwrap().expect("task survives");
            assert_eq!(task.category_id, None);
        }
        assert!(db.get_category(work.id).unwrap().is_none());
    }

    #[test]
    fn deleting_missing_category_returns_none() {
        let db = setup_db();
        assert!(db.delete_category(42).unwrap().is_none());
    }
}

mod task_tests {
    use super::*;

    #[test]
    fn create_task_fills_defaults() {
        let db = setup_db();
        let task = db.create_task(NewTask::new("Buy milk")).unwrap();

        assert_eq!(task.priority, 1);
        assert_eq!(task.position, 1);
        assert!(!task.completed);
        assert!(!task.archived);
        assert_eq!(task.parent_id, None);
        assert_eq!(db.get_task(task.id).unwrap(), Some(task));
    }

    #[test]
    fn empty_title_is_rejected() {
        let db = setup_db();
        let err = db.create_task(NewTask::new("  ")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::InvalidField { field: "title", .. })
        ));
    }

    #[test]
    fn out_of_range_priority_is_rejected() {
        let db = setup_db();
        assert!(db.create_task(NewTask::new("X").with_priority(3)).is_err());

        let task = db.create_task(NewTask::new("X")).unwrap();
        let patch = TaskPatch {
            priority: Some(-1),
            ..Default::default()
        };
        assert!(db.update_task(task.id, patch).is_err());
        assert_eq!(db.get_task(task.id).unwrap().unwrap().priority, 1);
    }

    #[test]
    fn subtask_of_missing_parent_is_rejected() {
        let db = setup_db();
        let err = db.create_task(NewTask::new("Orphan").with_parent(99)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::ParentNotFound(99))
        ));
    }

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let db = setup_db();
        let task = db
            .create_task(
                NewTask::new("Report")
                    .with_description("quarterly")
                    .with_hashtags("#work"),
            )
            .unwrap();

        // Absent description: unchanged
        let patch: TaskPatch = serde_json::from_str(r#"{"title": "Report v2"}"#).unwrap();
        let updated = db.update_task(task.id, patch).unwrap().unwrap();
        assert_eq!(updated.title, "Report v2");
        assert_eq!(updated.description.as_deref(), Some("quarterly"));

        // Explicit null: cleared
        let patch: TaskPatch = serde_json::from_str(r#"{"description": null}"#).unwrap();
        let updated = db.update_task(task.id, patch).unwrap().unwrap();
        assert_eq!(updated.description, None);
        assert_eq!(updated.hashtags.as_deref(), Some("#work"));
    }

    #[test]
    fn update_missing_task_returns_none() {
        let db = setup_db();
        let patch = TaskPatch {
            completed: Some(true),
            ..Default::default()
        };
        assert!(db.update_task(7, patch).unwrap().is_none());
    }

    #[test]
    fn reparent_under_own_descendant_is_rejected() {
        let db = setup_db();
        let root = db.create_task(NewTask::new("Root")).unwrap();
        let child = db.create_task(NewTask::new("Child").with_parent(root.id)).unwrap();
        let grandchild = db
            .create_task(NewTask::new("Grandchild").with_parent(child.id))
            .unwrap();

        for target in [root.id, grandchild.id] {
            let patch = TaskPatch {
                parent_id: Some(Some(target)),
                ..Default::default()
            };
            let err = db.update_task(root.id, patch).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<StoreError>(),
                Some(StoreError::ParentCycle { .. })
            ));
        }

        // Moving the grandchild to top level is fine
        let patch = TaskPatch {
            parent_id: Some(None),
            ..Default::default()
        };
        let moved = db.update_task(grandchild.id, patch).unwrap().unwrap();
        assert_eq!(moved.parent_id, None);
    }

    #[test]
    fn delete_removes_whole_subtree() {
        let db = setup_db();
        let root = db.create_task(NewTask::new("Root")).unwrap();
        let mut ids = vec![root.id];
        let mut parent = root.id;
        for depth in 0..4 {
            let child = db
                .create_task(NewTask::new(format!("Level {}", depth)).with_parent(parent))
                .unwrap();
            // A sibling at each level too
            let sibling = db
                .create_task(NewTask::new(format!("Sibling {}", depth)).with_parent(parent))
                .unwrap();
            ids.push(child.id);
            ids.push(sibling.id);
            parent = child.id;
        }
        let survivor = db.create_task(NewTask::new("Unrelated")).unwrap();

        let removed = db.delete_task(root.id).unwrap();
        assert_eq!(removed, Some(ids.len()));

        for id in ids {
            assert!(db.get_task(id).unwrap().is_none());
        }
        let all = TaskFilter {
            search: Some("e".into()),
            show_archived: true,
            ..Default::default()
        };
        let remaining = db.list_tasks(&all).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, survivor.id);
        assert!(remaining.iter().all(|t| t.parent_id.is_none()));
    }

    #[test]
    fn delete_missing_task_returns_none() {
        let db = setup_db();
        assert_eq!(db.delete_task(5).unwrap(), None);
    }

    #[test]
    fn task_tree_nests_subtasks() {
        let db = setup_db();
        let root = db.create_task(NewTask::new("Trip")).unwrap();
        let pack = db.create_task(NewTask::new("Pack").with_parent(root.id)).unwrap();
        db.create_task(NewTask::new("Socks").with_parent(pack.id)).unwrap();
        db.create_task(NewTask::new("Tickets").with_parent(root.id)).unwrap();

        let tree = db.get_task_tree(root.id).unwrap().unwrap();
        assert_eq!(tree.count(), 4);
        assert_eq!(tree.subtasks.len(), 2);

        let subtasks = db.get_subtasks(root.id).unwrap();
        assert_eq!(subtasks.len(), 2);
        assert!(subtasks.iter().all(|t| t.parent_id == Some(root.id)));
    }
}

mod ordering_tests {
    use super::*;

    #[test]
    fn positions_increase_within_lane() {
        let db = setup_db();
        let a = db.create_task(NewTask::new("A")).unwrap();
        let b = db.create_task(NewTask::new("B")).unwrap();
        let high = db.create_task(NewTask::new("H").with_priority(0)).unwrap();
        let c = db.create_task(NewTask::new("C")).unwrap();

        assert_eq!((a.position, b.position, c.position), (1, 2, 3));
        // Separate lane per priority
        assert_eq!(high.position, 1);
        // Separate lane per parent
        let sub = db.create_task(NewTask::new("Sub").with_parent(a.id)).unwrap();
        assert_eq!(sub.position, 1);

        assert_eq!(db.next_position(1, None).unwrap(), 4);
        assert_eq!(db.next_position(1, Some(a.id)).unwrap(), 2);
        assert_eq!(db.next_position(2, None).unwrap(), 1);
    }

    #[test]
    fn reorder_sets_exact_order_and_is_idempotent() {
        let db = setup_db();
        let a = db.create_task(NewTask::new("A")).unwrap();
        let b = db.create_task(NewTask::new("B")).unwrap();
        let c = db.create_task(NewTask::new("C")).unwrap();

        let order = [c.id, a.id, b.id];
        assert_eq!(db.reorder_tasks(&order).unwrap(), 3);
        assert_eq!(titles(&db, &TaskFilter::default()), vec!["C", "A", "B"]);

        assert_eq!(db.reorder_tasks(&order).unwrap(), 3);
        assert_eq!(titles(&db, &TaskFilter::default()), vec!["C", "A", "B"]);
    }

    #[test]
    fn reorder_skips_unknown_ids() {
        let db = setup_db();
        let a = db.create_task(NewTask::new("A")).unwrap();
        let b = db.create_task(NewTask::new("B")).unwrap();

        assert_eq!(db.reorder_tasks(&[b.id, 999, a.id]).unwrap(), 2);
        assert_eq!(db.get_task(b.id).unwrap().unwrap().position, 0);
        assert_eq!(db.get_task(a.id).unwrap().unwrap().position, 2);
    }

    #[test]
    fn work_category_scenario() {
        let db = setup_db();
        let work = db.create_category("Work").unwrap();
        let a = db.create_task(NewTask::new("A").with_category(work.id)).unwrap();
        let b = db.create_task(NewTask::new("B").with_category(work.id)).unwrap();
        let c = db.create_task(NewTask::new("C").with_category(work.id)).unwrap();

        db.reorder_tasks(&[c.id, a.id, b.id]).unwrap();

        let filter = TaskFilter {
            category_id: Some(work.id),
            ..Default::default()
        };
        assert_eq!(titles(&db, &filter), vec!["C", "A", "B"]);
    }
}

mod query_tests {
    use super::*;

    #[test]
    fn list_sorts_by_priority_then_position() {
        let db = setup_db();
        db.create_task(NewTask::new("normal first")).unwrap();
        db.create_task(NewTask::new("normal second")).unwrap();
        db.create_task(NewTask::new("high").with_priority(0)).unwrap();
        db.create_task(NewTask::new("low").with_priority(2)).unwrap();

        assert_eq!(
            titles(&db, &TaskFilter::default()),
            vec!["high", "normal first", "normal second", "low"]
        );
    }

    #[test]
    fn high_priority_task_jumps_the_queue() {
        let db = setup_db();
        let work = db.create_category("Work").unwrap();
        let a = db.create_task(NewTask::new("A").with_category(work.id)).unwrap();
        let b = db.create_task(NewTask::new("B").with_category(work.id)).unwrap();
        let c = db
            .create_task(NewTask::new("C").with_category(work.id).with_priority(0))
            .unwrap();

        assert_eq!((a.position, b.position, c.position), (1, 2, 1));
        assert_eq!(titles(&db, &TaskFilter::default()), vec!["C", "A", "B"]);
    }

    #[test]
    fn equal_positions_list_newest_first() {
        let db = setup_db();
        let a = db.create_task(NewTask::new("older")).unwrap();
        let b = db.create_task(NewTask::new("newer")).unwrap();
        db.reorder_tasks(&[a.id]).unwrap();
        db.reorder_tasks(&[b.id]).unwrap();

        assert_eq!(titles(&db, &TaskFilter::default()), vec!["newer", "older"]);
    }

    #[test]
    fn hierarchy_view_lists_top_level_only() {
        let db = setup_db();
        let parent = db.create_task(NewTask::new("Garden")).unwrap();
        db.create_task(NewTask::new("Water roses").with_parent(parent.id))
            .unwrap();

        let trees = db.list_task_trees(&TaskFilter::default()).unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].task.title, "Garden");
        assert_eq!(trees[0].subtasks[0].task.title, "Water roses");
    }

    #[test]
    fn search_view_returns_matching_subtasks_directly() {
        let db = setup_db();
        let parent = db.create_task(NewTask::new("Garden")).unwrap();
        db.create_task(NewTask::new("Water roses").with_parent(parent.id))
            .unwrap();
        db.create_task(NewTask::new("Email").with_description("ROSES order"))
            .unwrap();
        db.create_task(NewTask::new("Misc").with_hashtags("#roses")).unwrap();

        let filter = TaskFilter {
            search: Some("roses".into()),
            ..Default::default()
        };
        let mut found = titles(&db, &filter);
        found.sort();
        assert_eq!(found, vec!["Email", "Misc", "Water roses"]);
    }

    #[test]
    fn empty_search_is_hierarchy_view() {
        let db = setup_db();
        let parent = db.create_task(NewTask::new("Parent")).unwrap();
        db.create_task(NewTask::new("Child").with_parent(parent.id))
            .unwrap();

        let filter = TaskFilter {
            search: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(titles(&db, &filter), vec!["Parent"]);
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let db = setup_db();
        db.create_task(NewTask::new("Raise to 100%")).unwrap();
        db.create_task(NewTask::new("Raise to 1000")).unwrap();

        let filter = TaskFilter {
            search: Some("100%".into()),
            ..Default::default()
        };
        assert_eq!(titles(&db, &filter), vec!["Raise to 100%"]);
    }

    #[test]
    fn search_folds_non_ascii_case() {
        let db = setup_db();
        db.create_task(NewTask::new("Élan report")).unwrap();
        db.create_task(NewTask::new("Straße fixes").with_hashtags("#ÜBER"))
            .unwrap();

        for (term, expected) in [
            ("élan", "Élan report"),
            ("ÉLAN", "Élan report"),
            ("STRASSE", ""),
            ("über", "Straße fixes"),
        ] {
            let filter = TaskFilter {
                search: Some(term.into()),
                ..Default::default()
            };
            let found = titles(&db, &filter);
            if expected.is_empty() {
                assert!(found.is_empty(), "{} matched {:?}", term, found);
            } else {
                assert_eq!(found, vec![expected], "search {}", term);
            }
        }
    }

    #[test]
    fn search_excludes_archived_tasks() {
        let db = setup_db();
        let parent = db.create_task(NewTask::new("Kitchen")).unwrap();
        let sub = db
            .create_task(NewTask::new("Descale kettle").with_parent(parent.id))
            .unwrap();
        db.create_task(NewTask::new("Buy kettle")).unwrap();
        let patch = TaskPatch {
            completed: Some(true),
            archived: Some(true),
            ..Default::default()
        };
        db.update_task(sub.id, patch).unwrap().unwrap();

        let filter = TaskFilter {
            search: Some("kettle".into()),
            ..Default::default()
        };
        assert_eq!(titles(&db, &filter), vec!["Buy kettle"]);

        let filter = TaskFilter {
            search: Some("kettle".into()),
            show_archived: true,
            ..Default::default()
        };
        assert_eq!(titles(&db, &filter).len(), 2);
    }

    #[test]
    fn search_category_filter_uses_own_category_only() {
        let db = setup_db();
        let work = db.create_category("Work").unwrap();
        let parent = db
            .create_task(NewTask::new("Quarterly review").with_category(work.id))
            .unwrap();
        // Subtask created directly, so it does not inherit the category
        db.create_task(NewTask::new("Collect numbers").with_parent(parent.id))
            .unwrap();

        let filter = TaskFilter {
            search: Some("numbers".into()),
            category_id: Some(work.id),
            ..Default::default()
        };
        assert!(titles(&db, &filter).is_empty());

        let filter = TaskFilter {
            search: Some("numbers".into()),
            ..Default::default()
        };
        assert_eq!(titles(&db, &filter), vec!["Collect numbers"]);
    }

    #[test]
    fn filters_by_category_and_priority() {
        let db = setup_db();
        let work = db.create_category("Work").unwrap();
        db.create_task(NewTask::new("Deploy").with_category(work.id).with_priority(0))
            .unwrap();
        db.create_task(NewTask::new("Review").with_category(work.id))
            .unwrap();
        db.create_task(NewTask::new("Laundry").with_priority(0)).unwrap();

        let filter = TaskFilter {
            category_id: Some(work.id),
            priority: Some(0),
            ..Default::default()
        };
        assert_eq!(titles(&db, &filter), vec!["Deploy"]);
    }
}

mod archive_tests {
    use super::*;

    fn complete(db: &Database, id: i64) {
        let patch = TaskPatch {
            completed: Some(true),
            ..Default::default()
        };
        db.update_task(id, patch).unwrap().unwrap();
    }

    #[test]
    fn archive_moves_only_completed_tasks() {
        let db = setup_db();
        let a = db.create_task(NewTask::new("A")).unwrap();
        let b = db.create_task(NewTask::new("B")).unwrap();
        db.create_task(NewTask::new("C")).unwrap();
        complete(&db, a.id);
        complete(&db, b.id);

        assert_eq!(db.archive_completed(None).unwrap(), 2);
        // Nothing left to archive
        assert_eq!(db.archive_completed(None).unwrap(), 0);

        assert_eq!(titles(&db, &TaskFilter::default()), vec!["C"]);

        let with_archived = TaskFilter {
            show_archived: true,
            ..Default::default()
        };
        assert_eq!(titles(&db, &with_archived).len(), 3);
    }

    #[test]
    fn completed_tasks_stay_visible_until_archived() {
        let db = setup_db();
        let a = db.create_task(NewTask::new("Done")).unwrap();
        complete(&db, a.id);

        let listed = db.list_tasks(&TaskFilter::default()).unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].completed);
    }

    #[test]
    fn raw_uncomplete_keeps_archived_flag() {
        let db = setup_db();
        let task = db.create_task(NewTask::new("Filed")).unwrap();
        complete(&db, task.id);
        assert_eq!(db.archive_completed(None).unwrap(), 1);

        let patch = TaskPatch {
            completed: Some(false),
            ..Default::default()
        };
        let reopened = db.update_task(task.id, patch).unwrap().unwrap();
        assert!(!reopened.completed);
        assert!(reopened.archived);
        assert!(titles(&db, &TaskFilter::default()).is_empty());
    }

    #[test]
    fn archive_respects_category() {
        let db = setup_db();
        let work = db.create_category("Work").unwrap();
        let w = db.create_task(NewTask::new("W").with_category(work.id)).unwrap();
        let h = db.create_task(NewTask::new("H")).unwrap();
        complete(&db, w.id);
        complete(&db, h.id);

        assert_eq!(db.archive_completed(Some(work.id)).unwrap(), 1);
        assert!(db.get_task(w.id).unwrap().unwrap().archived);
        assert!(!db.get_task(h.id).unwrap().unwrap().archived);
    }
}
