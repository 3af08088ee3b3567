use chrono::NaiveDate;
use planboard::db::Database;
use planboard::models::*;
use speculate2::speculate;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
}

fn create_test_project(db: &Database) -> Project {
    db.create_project(CreateProjectInput {
        title: "Test Project".to_string(),
    })
    .expect("Failed to create project")
}

fn phase_input(start: &str, duration: i64) -> CreatePhaseInput {
    CreatePhaseInput {
        title: "Phase".to_string(),
        start_date: date(start),
        duration,
        is_milestone: false,
        classification: Classification::Internal,
        notes: None,
    }
}

fn feature_input(title: &str, start: &str, duration: i64, deps: Option<&str>) -> CreateFeatureInput {
    CreateFeatureInput {
        title: title.to_string(),
        start_date: date(start),
        duration,
        dependencies: deps.map(str::to_string),
        is_milestone: false,
        classification: Classification::Internal,
        notes: None,
    }
}

fn item_input(title: &str, start: &str, duration: i64, deps: Option<&str>) -> CreateItemInput {
    CreateItemInput {
        title: title.to_string(),
        start_date: date(start),
        duration,
        dependencies: deps.map(str::to_string),
        is_milestone: false,
        classification: Classification::Internal,
        notes: None,
    }
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "projects" {
        it "creates and fetches a project" {
            let project = db.create_project(CreateProjectInput {
                title: "Launch".to_string(),
            }).expect("Failed to create project");

            let found = db.get_project(project.id).expect("Query failed");
            assert_eq!(found.unwrap().title, "Launch");
        }

        it "returns None for a non-existent project" {
            let result = db.get_project(999).expect("Query failed");
            assert!(result.is_none());
        }

        it "deletes a project and cascades through the hierarchy" {
            let project = create_test_project(&db);
            let phase = db.create_phase(project.id, phase_input("2025-01-01", 10)).expect("phase");
            let (feature, _) = db.create_feature(phase.id, feature_input("F", "2025-01-01", 3, None)).expect("feature");
            let (item, _) = db.create_item(feature.id, item_input("I", "2025-01-01", 1, None)).expect("item");

            assert!(db.delete_project(project.id).expect("delete"));

            assert!(db.get_phase(phase.id).expect("q").is_none());
            assert!(db.get_feature(feature.id).expect("q").is_none());
            assert!(db.get_item(item.id).expect("q").is_none());
        }
    }

    describe "phases" {
        it "assigns dense sort positions in creation order" {
            let project = create_test_project(&db);
            let first = db.create_phase(project.id, phase_input("2025-01-01", 5)).expect("phase");
            let second = db.create_phase(project.id, phase_input("2025-02-01", 5)).expect("phase");

            assert_eq!(first.sort_order, 0);
            assert_eq!(second.sort_order, 1);
        }

        it "rejects a negative duration before touching the database" {
            let project = create_test_project(&db);
            let err = db.create_phase(project.id, phase_input("2025-01-01", -2)).unwrap_err();
            assert!(err.to_string().contains("non-negative"));
            assert!(db.get_phases_by_project(project.id).expect("q").is_empty());
        }

        it "clamps children into a narrowed window by shortening them" {
            let project = create_test_project(&db);
            let phase = db.create_phase(project.id, phase_input("2025-01-01", 10)).expect("phase");
            let (f1, _) = db.create_feature(phase.id, feature_input("F1", "2025-01-01", 3, None)).expect("f1");
            let (f2, _) = db.create_feature(phase.id, feature_input("F2", "2025-01-01", 2, Some("F1 done: feature-0"))).expect("f2");
            // The dependency text above has a trailing 0 that matches nothing;
            // F2 stays where it was put.
            let _ = (f1, f2);

            let (_, adjustments) = db.update_phase(phase.id, UpdatePhaseInput {
                start_date: Some(date("2025-02-01")),
                duration: Some(5),
                ..Default::default()
            }).expect("update").expect("phase exists");

            assert!(!adjustments.is_empty());
            let phase = db.get_phase(phase.id).expect("q").unwrap();
            for feature in db.get_features_by_phase(phase.id).expect("q") {
                assert!(feature.start_date >= phase.start_date);
                assert!(feature.end_date() <= phase.end_date());
            }
        }
    }

    describe "features and dependency enforcement" {
        it "pushes a new dependent past its dependency's end" {
            let project = create_test_project(&db);
            let phase = db.create_phase(project.id, phase_input("2025-01-01", 10)).expect("phase");
            let (f1, _) = db.create_feature(phase.id, feature_input("F1", "2025-01-01", 3, None)).expect("f1");
            let (f2, adjustments) = db.create_feature(
                phase.id,
                feature_input("F2", "2025-01-01", 2, Some(&format!("feature-{}", f1.id))),
            ).expect("f2");

            // F2 must start exactly at F1's end.
            assert_eq!(f2.start_date, f1.end_date());
            assert_eq!(f2.start_date, date("2025-01-04"));
            assert!(adjustments.iter().any(|a| a.id == f2.part_ref()));
        }

        it "keeps an independent feature where it was put" {
            let project = create_test_project(&db);
            let phase = db.create_phase(project.id, phase_input("2025-01-01", 10)).expect("phase");
            let (feature, adjustments) = db.create_feature(
                phase.id,
                feature_input("Free", "2025-01-02", 2, None),
            ).expect("feature");

            assert_eq!(feature.start_date, date("2025-01-02"));
            assert!(adjustments.is_empty());
        }

        it "rejects an edit that would create a dependency cycle" {
            let project = create_test_project(&db);
            let phase = db.create_phase(project.id, phase_input("2025-01-01", 20)).expect("phase");
            let (f1, _) = db.create_feature(phase.id, feature_input("A", "2025-01-01", 2, None)).expect("a");
            let (f2, _) = db.create_feature(
                phase.id,
                feature_input("B", "2025-01-03", 2, Some(&f1.id.to_string())),
            ).expect("b");

            let err = db.update_feature(f1.id, UpdateFeatureInput {
                dependencies: Some(f2.id.to_string()),
                ..Default::default()
            }).unwrap_err();
            assert!(err.to_string().contains("cycle"));

            // Nothing was persisted.
            let reloaded = db.get_feature(f1.id).expect("q").unwrap();
            assert!(reloaded.dependencies.is_none());
        }

        it "resolves a bare reference against every kind sharing the id" {
            let project = create_test_project(&db);
            let phase = db.create_phase(project.id, phase_input("2025-01-01", 30)).expect("phase");
            // feature 1 and item 1 both exist; a dependency on "1" must
            // respect whichever ends later.
            let (host, _) = db.create_feature(phase.id, feature_input("Host", "2025-01-01", 1, None)).expect("host");
            assert_eq!(host.id, 1);
            let (it, _) = db.create_item(host.id, item_input("Long", "2025-01-01", 6, None)).expect("item");
            assert_eq!(it.id, 1);

            let (dep, _) = db.create_feature(
                phase.id,
                feature_input("Dep", "2025-01-01", 2, Some("1")),
            ).expect("dep");
            // item-1 ends 2025-01-07, feature-1 ends 2025-01-02.
            assert_eq!(dep.start_date, date("2025-01-07"));
        }
    }

    describe "reschedule cascade" {
        it "shifts transitive dependents forward and reports them" {
            let project = create_test_project(&db);
            let phase = db.create_phase(project.id, phase_input("2025-01-01", 30)).expect("phase");
            let (f1, _) = db.create_feature(phase.id, feature_input("F1", "2025-01-01", 3, None)).expect("f1");
            let (f2, _) = db.create_feature(
                phase.id,
                feature_input("F2", "2025-01-04", 2, Some(&format!("feature-{}", f1.id))),
            ).expect("f2");
            let (f3, _) = db.create_feature(
                phase.id,
                feature_input("F3", "2025-01-06", 1, Some(&format!("feature-{}", f2.id))),
            ).expect("f3");

            let response = db.reschedule(project.id, RescheduleInput {
                node_id: f1.part_ref(),
                new_start: date("2025-01-08"),
                new_end: None,
            }).expect("reschedule");

            assert_eq!(response.duration, 3);
            let cascade_ids: Vec<String> = response.cascade.iter().map(|a| a.id.to_string()).collect();
            assert_eq!(cascade_ids, vec![f2.part_ref().to_string(), f3.part_ref().to_string()]);

            let f2 = db.get_feature(f2.id).expect("q").unwrap();
            let f3 = db.get_feature(f3.id).expect("q").unwrap();
            assert_eq!(f2.start_date, date("2025-01-11"));
            assert_eq!(f3.start_date, date("2025-01-13"));
        }

        it "derives the duration from a supplied end date" {
            let project = create_test_project(&db);
            let phase = db.create_phase(project.id, phase_input("2025-01-01", 30)).expect("phase");
            let (feature, _) = db.create_feature(phase.id, feature_input("F", "2025-01-01", 3, None)).expect("f");

            let response = db.reschedule(project.id, RescheduleInput {
                node_id: feature.part_ref(),
                new_start: date("2025-01-05"),
                new_end: Some(date("2025-01-12")),
            }).expect("reschedule");

            assert_eq!(response.duration, 7);
        }

        it "never shifts a dependent earlier" {
            let project = create_test_project(&db);
            let phase = db.create_phase(project.id, phase_input("2025-01-01", 30)).expect("phase");
            let (f1, _) = db.create_feature(phase.id, feature_input("F1", "2025-01-10", 3, None)).expect("f1");
            let (f2, _) = db.create_feature(
                phase.id,
                feature_input("F2", "2025-01-20", 2, Some(&format!("feature-{}", f1.id))),
            ).expect("f2");

            // Move F1 earlier: F2 already satisfies the constraint and must
            // not move back.
            let response = db.reschedule(project.id, RescheduleInput {
                node_id: f1.part_ref(),
                new_start: date("2025-01-02"),
                new_end: None,
            }).expect("reschedule");

            assert!(response.cascade.is_empty());
            assert_eq!(db.get_feature(f2.id).expect("q").unwrap().start_date, date("2025-01-20"));
        }

        it "reports not-found for a target outside the project" {
            let project = create_test_project(&db);
            let err = db.reschedule(project.id, RescheduleInput {
                node_id: "feature-42".parse().unwrap(),
                new_start: date("2025-01-01"),
                new_end: None,
            }).unwrap_err();
            assert!(err.to_string().contains("not found"));
        }

        it "holds dependency ordering across the whole project afterwards" {
            let project = create_test_project(&db);
            let phase = db.create_phase(project.id, phase_input("2025-01-01", 60)).expect("phase");
            let (a, _) = db.create_feature(phase.id, feature_input("A", "2025-01-01", 4, None)).expect("a");
            let (b, _) = db.create_feature(phase.id, feature_input("B", "2025-01-05", 3, Some(&format!("feature-{}", a.id)))).expect("b");
            let (c, _) = db.create_item(b.id, item_input("C", "2025-01-08", 2, Some(&format!("feature-{}", b.id)))).expect("c");

            db.reschedule(project.id, RescheduleInput {
                node_id: a.part_ref(),
                new_start: date("2025-01-15"),
                new_end: None,
            }).expect("reschedule");

            let a = db.get_feature(a.id).expect("q").unwrap();
            let b = db.get_feature(b.id).expect("q").unwrap();
            let c = db.get_item(c.id).expect("q").unwrap();
            assert!(b.start_date >= a.end_date());
            assert!(c.start_date >= b.end_date());
            // Containment held too.
            let phase = db.get_phase(phase.id).expect("q").unwrap();
            assert!(b.start_date >= phase.start_date && b.end_date() <= phase.end_date());
            assert!(c.start_date >= b.start_date && c.end_date() <= b.end_date());
        }
    }

    describe "critical path" {
        it "finds the chained path with its full length" {
            // Numeric ids collide across tables in a fresh database
            // (phase 1 and feature 1 both exist), and a bare reference fans
            // out to every match. Host each link in its own short phase so
            // the feature chain outweighs every colliding phase.
            let project = create_test_project(&db);
            let _decoy = db.create_phase(project.id, phase_input("2025-01-01", 0)).expect("p1");
            let p2 = db.create_phase(project.id, phase_input("2025-01-01", 3)).expect("p2");
            let p3 = db.create_phase(project.id, phase_input("2025-01-04", 4)).expect("p3");
            let p4 = db.create_phase(project.id, phase_input("2025-01-08", 2)).expect("p4");

            let (a, _) = db.create_feature(p2.id, feature_input("A", "2025-01-01", 3, None)).expect("a");
            let (b, _) = db.create_feature(p3.id, feature_input("B", "2025-01-04", 4, Some(&format!("feature-{}", a.id)))).expect("b");
            let (c, _) = db.create_feature(p4.id, feature_input("C", "2025-01-08", 2, Some(&format!("feature-{}", b.id)))).expect("c");

            let path = db.critical_path(project.id).expect("cp");
            let rendered: Vec<String> = path.iter().map(|r| r.to_string()).collect();
            assert_eq!(rendered, vec![
                a.part_ref().to_string(),
                b.part_ref().to_string(),
                c.part_ref().to_string(),
            ]);
        }

        it "is deterministic for a fixed plan" {
            let project = create_test_project(&db);
            let phase = db.create_phase(project.id, phase_input("2025-01-01", 10)).expect("phase");
            let (a, _) = db.create_feature(phase.id, feature_input("A", "2025-01-01", 2, None)).expect("a");
            db.create_feature(phase.id, feature_input("B", "2025-01-03", 2, Some(&format!("feature-{}", a.id)))).expect("b");
            db.create_feature(phase.id, feature_input("C", "2025-01-03", 2, Some(&format!("feature-{}", a.id)))).expect("c");

            let first = db.critical_path(project.id).expect("cp");
            let second = db.critical_path(project.id).expect("cp");
            assert!(!first.is_empty());
            assert_eq!(first, second);
        }

        it "is empty for an empty project" {
            let project = create_test_project(&db);
            assert!(db.critical_path(project.id).expect("cp").is_empty());
        }
    }

    describe "plan read model" {
        it "nests parts in display order and flags the critical path" {
            let project = create_test_project(&db);
            let phase = db.create_phase(project.id, phase_input("2025-01-01", 10)).expect("phase");
            let (a, _) = db.create_feature(phase.id, feature_input("A", "2025-01-01", 3, None)).expect("a");
            let (b, _) = db.create_feature(phase.id, feature_input("B", "2025-01-04", 4, Some(&format!("feature-{}", a.id)))).expect("b");
            let _ = a;

            let plan = db.plan(project.id).expect("plan");
            let names: Vec<&str> = plan.tasks.iter().map(|t| t.name.as_str()).collect();
            assert_eq!(names, vec!["Phase: Phase", "Feature: A", "Feature: B"]);

            // The flagged tasks are exactly the critical path, which ends at
            // the longest chain's terminus.
            let critical: Vec<String> = plan.tasks.iter()
                .filter(|t| t.critical)
                .map(|t| t.id.to_string())
                .collect();
            let rendered: Vec<String> = plan.critical_path.iter().map(|r| r.to_string()).collect();
            assert_eq!(critical, rendered);
            assert_eq!(rendered.last().map(String::as_str), Some(b.part_ref().to_string().as_str()));
        }
    }

    describe "reorder" {
        it "renumbers siblings densely with the moved node in place" {
            let project = create_test_project(&db);
            let p1 = db.create_phase(project.id, phase_input("2025-01-01", 5)).expect("p1");
            let p2 = db.create_phase(project.id, phase_input("2025-02-01", 5)).expect("p2");
            let p3 = db.create_phase(project.id, phase_input("2025-03-01", 5)).expect("p3");

            db.reorder(ReorderInput {
                node_id: p3.part_ref(),
                parent_id: project.id,
                new_position: 0,
            }).expect("reorder");

            let phases = db.get_phases_by_project(project.id).expect("q");
            let ids: Vec<i64> = phases.iter().map(|p| p.id).collect();
            assert_eq!(ids, vec![p3.id, p1.id, p2.id]);
            let positions: Vec<i64> = phases.iter().map(|p| p.sort_order).collect();
            assert_eq!(positions, vec![0, 1, 2]);
        }

        it "is idempotent when the node is already in place" {
            let project = create_test_project(&db);
            let p1 = db.create_phase(project.id, phase_input("2025-01-01", 5)).expect("p1");
            let p2 = db.create_phase(project.id, phase_input("2025-02-01", 5)).expect("p2");

            db.reorder(ReorderInput {
                node_id: p2.part_ref(),
                parent_id: project.id,
                new_position: 1,
            }).expect("reorder");

            let phases = db.get_phases_by_project(project.id).expect("q");
            let ids: Vec<i64> = phases.iter().map(|p| p.id).collect();
            assert_eq!(ids, vec![p1.id, p2.id]);
        }

        it "does not change any schedule dates" {
            let project = create_test_project(&db);
            let phase = db.create_phase(project.id, phase_input("2025-01-01", 10)).expect("phase");
            let (f1, _) = db.create_feature(phase.id, feature_input("F1", "2025-01-01", 2, None)).expect("f1");
            let (f2, _) = db.create_feature(phase.id, feature_input("F2", "2025-01-03", 2, None)).expect("f2");

            db.reorder(ReorderInput {
                node_id: f2.part_ref(),
                parent_id: phase.id,
                new_position: 0,
            }).expect("reorder");

            assert_eq!(db.get_feature(f1.id).expect("q").unwrap().start_date, date("2025-01-01"));
            assert_eq!(db.get_feature(f2.id).expect("q").unwrap().start_date, date("2025-01-03"));
        }

        it "rejects a node that does not belong to the parent" {
            let project = create_test_project(&db);
            let other = create_test_project(&db);
            let phase = db.create_phase(project.id, phase_input("2025-01-01", 5)).expect("phase");

            let err = db.reorder(ReorderInput {
                node_id: phase.part_ref(),
                parent_id: other.id,
                new_position: 0,
            }).unwrap_err();
            assert!(err.to_string().contains("not found"));
        }
    }

    describe "drafts" {
        it "creates an untyped draft that needs a type" {
            let draft = db.create_draft(CreateDraftInput {
                title: "My Untyped Draft".to_string(),
                part_type: None,
                classification: Classification::Internal,
                project_id: None,
                phase_id: None,
                feature_id: None,
                start_date: None,
                duration: None,
                is_milestone: false,
                dependencies: None,
                notes: None,
            }).expect("draft");

            assert!(draft.needs_type());
            let stored = db.get_draft(draft.id).expect("q").unwrap();
            assert_eq!(stored.part_type, DraftType::Unassigned);
        }

        it "promotes an untyped draft as a phase and deletes it" {
            let project = create_test_project(&db);
            let draft = db.create_draft(CreateDraftInput {
                title: "Draft A".to_string(),
                part_type: None,
                classification: Classification::Internal,
                project_id: Some(project.id),
                phase_id: None,
                feature_id: None,
                start_date: None,
                duration: None,
                is_milestone: false,
                dependencies: None,
                notes: None,
            }).expect("draft");

            let response = db.promote_draft(draft.id, PromoteDraftInput {
                inferred_type: PartKind::Phase,
                start: Some(date("2025-01-10")),
                duration: Some(5),
                project_id: None,
                phase_id: None,
                feature_id: None,
                item_id: None,
            }).expect("promote");

            assert_eq!(response.created.id.kind, PartKind::Phase);
            assert_eq!(response.created.duration, 5);
            assert_eq!(response.removed_draft_id, draft.id);
            assert!(db.get_draft(draft.id).expect("q").is_none());
            assert_eq!(db.get_phases_by_project(project.id).expect("q").len(), 1);
        }

        it "rejects promotion as a conflicting type" {
            let project = create_test_project(&db);
            let draft = db.create_draft(CreateDraftInput {
                title: "Typed".to_string(),
                part_type: Some(PartKind::Phase),
                classification: Classification::Internal,
                project_id: Some(project.id),
                phase_id: None,
                feature_id: None,
                start_date: None,
                duration: None,
                is_milestone: false,
                dependencies: None,
                notes: None,
            }).expect("draft");

            let err = db.promote_draft(draft.id, PromoteDraftInput {
                inferred_type: PartKind::Item,
                start: Some(date("2025-01-01")),
                duration: Some(2),
                project_id: None,
                phase_id: None,
                feature_id: None,
                item_id: None,
            }).unwrap_err();
            assert!(err.to_string().contains("cannot promote"));

            // The draft survives a failed promotion.
            assert!(db.get_draft(draft.id).expect("q").is_some());
        }

        it "requires a parent when promoting as an item" {
            let draft = db.create_draft(CreateDraftInput {
                title: "NeedsParent".to_string(),
                part_type: None,
                classification: Classification::Internal,
                project_id: None,
                phase_id: None,
                feature_id: None,
                start_date: None,
                duration: None,
                is_milestone: false,
                dependencies: None,
                notes: None,
            }).expect("draft");

            let err = db.promote_draft(draft.id, PromoteDraftInput {
                inferred_type: PartKind::Item,
                start: Some(date("2025-01-01")),
                duration: Some(2),
                project_id: None,
                phase_id: None,
                feature_id: None,
                item_id: None,
            }).unwrap_err();
            assert!(err.to_string().contains("feature_id required"));
        }

        it "resolves an item promotion's parent from a sibling item" {
            let project = create_test_project(&db);
            let phase = db.create_phase(project.id, phase_input("2025-01-01", 20)).expect("phase");
            let (feature, _) = db.create_feature(phase.id, feature_input("F", "2025-01-01", 10, None)).expect("f");
            let (sibling, _) = db.create_item(feature.id, item_input("Sibling", "2025-01-01", 2, None)).expect("i");

            let draft = db.create_draft(CreateDraftInput {
                title: "Dropped next to a sibling".to_string(),
                part_type: None,
                classification: Classification::Internal,
                project_id: None,
                phase_id: None,
                feature_id: None,
                start_date: None,
                duration: None,
                is_milestone: false,
                dependencies: None,
                notes: None,
            }).expect("draft");

            let response = db.promote_draft(draft.id, PromoteDraftInput {
                inferred_type: PartKind::Item,
                start: Some(date("2025-01-03")),
                duration: Some(2),
                project_id: None,
                phase_id: None,
                feature_id: None,
                item_id: Some(sibling.id),
            }).expect("promote");

            assert_eq!(response.created.id.kind, PartKind::Item);
            let created = db.get_item(response.created.id.id).expect("q").unwrap();
            assert_eq!(created.feature_id, feature.id);
        }

        it "uses the draft's own schedule when promotion supplies none" {
            let project = create_test_project(&db);
            let draft = db.create_draft(CreateDraftInput {
                title: "Prescheduled".to_string(),
                part_type: Some(PartKind::Phase),
                classification: Classification::External,
                project_id: Some(project.id),
                phase_id: None,
                feature_id: None,
                start_date: Some(date("2025-03-01")),
                duration: Some(4),
                is_milestone: true,
                dependencies: None,
                notes: Some("carried over".to_string()),
            }).expect("draft");

            let response = db.promote_draft(draft.id, PromoteDraftInput {
                inferred_type: PartKind::Phase,
                start: None,
                duration: None,
                project_id: None,
                phase_id: None,
                feature_id: None,
                item_id: None,
            }).expect("promote");

            assert_eq!(response.created.start, date("2025-03-01"));
            assert_eq!(response.created.duration, 4);
            let phase = db.get_phase(response.created.id.id).expect("q").unwrap();
            assert!(phase.is_milestone);
            assert_eq!(phase.classification, Classification::External);
            assert_eq!(phase.notes.as_deref(), Some("carried over"));
        }
    }

    describe "on-disk storage" {
        it "persists the plan across reopen" {
            // This one needs a real file, not the shared in-memory fixture.
            drop(db);
            let dir = tempfile::tempdir().expect("tempdir");
            let path = dir.path().join("plan.db");

            let project_id = {
                let db = Database::open(path.clone()).expect("open");
                db.migrate().expect("migrate");
                let project = create_test_project(&db);
                db.create_phase(project.id, phase_input("2025-01-01", 10)).expect("phase");
                project.id
            };

            let db = Database::open(path).expect("reopen");
            db.migrate().expect("migrate again");
            let phases = db.get_phases_by_project(project_id).expect("q");
            assert_eq!(phases.len(), 1);
            assert_eq!(phases[0].start_date, date("2025-01-01"));
        }
    }

    describe "images" {
        it "attaches one image to parts of different kinds" {
            let project = create_test_project(&db);
            let phase = db.create_phase(project.id, phase_input("2025-01-01", 10)).expect("phase");
            let (feature, _) = db.create_feature(phase.id, feature_input("F", "2025-01-01", 2, None)).expect("f");

            let image = db.create_image(CreateImageInput {
                filename: "mockup.png".to_string(),
            }).expect("image");

            db.attach_image(image.id, phase.part_ref()).expect("attach");
            db.attach_image(image.id, feature.part_ref()).expect("attach");
            // Re-attaching is a no-op, not an error.
            db.attach_image(image.id, phase.part_ref()).expect("attach again");

            assert_eq!(db.get_images_for_part(phase.part_ref()).expect("q").len(), 1);
            assert_eq!(db.get_images_for_part(feature.part_ref()).expect("q").len(), 1);

            assert!(db.detach_image(image.id, phase.part_ref()).expect("detach"));
            assert!(db.get_images_for_part(phase.part_ref()).expect("q").is_empty());
        }

        it "refuses to attach to a missing part" {
            let image = db.create_image(CreateImageInput {
                filename: "lost.png".to_string(),
            }).expect("image");

            let err = db.attach_image(image.id, "item-404".parse().unwrap()).unwrap_err();
            assert!(err.to_string().contains("not found"));
        }
    }
}
