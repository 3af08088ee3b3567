//! Engine-level properties, exercised on in-memory plans without storage.

use chrono::{NaiveDate, TimeZone, Utc};
use planboard::models::*;
use planboard::schedule::{compute_critical_path, parse_dependencies, reschedule, settle_part, TaskGraph};
use speculate2::speculate;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
}

fn stamp() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

fn phase(id: i64, start: &str, duration: i64) -> Phase {
    Phase {
        id,
        project_id: 1,
        title: format!("Phase {id}"),
        start_date: date(start),
        duration,
        is_milestone: false,
        classification: Classification::Internal,
        notes: None,
        sort_order: 0,
        created_at: stamp(),
        updated_at: stamp(),
    }
}

fn feature(id: i64, phase_id: i64, start: &str, duration: i64, deps: Option<&str>) -> Feature {
    Feature {
        id,
        phase_id,
        title: format!("Feature {id}"),
        start_date: date(start),
        duration,
        dependencies: deps.map(str::to_string),
        is_milestone: false,
        classification: Classification::Internal,
        notes: None,
        sort_order: 0,
        created_at: stamp(),
        updated_at: stamp(),
    }
}

fn item(id: i64, feature_id: i64, start: &str, duration: i64, deps: Option<&str>) -> Item {
    Item {
        id,
        feature_id,
        title: format!("Item {id}"),
        start_date: date(start),
        duration,
        dependencies: deps.map(str::to_string),
        is_milestone: false,
        classification: Classification::Internal,
        notes: None,
        sort_order: 0,
        created_at: stamp(),
        updated_at: stamp(),
    }
}

/// Containment and dependency ordering over every node of a settled graph.
fn assert_schedule_invariants(graph: &TaskGraph) {
    for node in graph.nodes() {
        assert!(node.duration >= 0, "{} has negative duration", node.sid);
        if let Some(parent) = node.parent {
            let parent_node = graph.get(parent).expect("parent present");
            assert!(
                node.start >= parent_node.start,
                "{} starts before its parent",
                node.sid
            );
            assert!(
                node.end() <= parent_node.end(),
                "{} ends after its parent",
                node.sid
            );
        }
    }
}

speculate! {
    describe "dependency parsing" {
        it "handles prefixed, bare, and junk tokens" {
            assert_eq!(parse_dependencies("item-3, feature-5;7"), vec![3, 5, 7]);
            assert_eq!(parse_dependencies(""), Vec::<i64>::new());
            assert_eq!(parse_dependencies("abc"), Vec::<i64>::new());
        }
    }

    describe "creation-time dependency enforcement" {
        it "moves a dependent's start to its dependency's end" {
            // Phase 2025-01-01 +10; F1 +3; F2 +2 depending on F1.
            let phases = vec![phase(1, "2025-01-01", 10)];
            let features = vec![
                feature(1, 1, "2025-01-01", 3, None),
                feature(2, 1, "2025-01-01", 2, Some("feature-1")),
            ];
            let mut graph = TaskGraph::build(&phases, &features, &[]);

            settle_part(&mut graph, "feature-2".parse().unwrap()).expect("settle");

            let f1 = graph.get("feature-1".parse().unwrap()).unwrap();
            let f2 = graph.get("feature-2".parse().unwrap()).unwrap();
            assert_eq!(f2.start, f1.end());
            assert_eq!(f2.start, date("2025-01-04"));
            assert_schedule_invariants(&graph);
        }
    }

    describe "phase reschedule containment" {
        it "clamps children by shortening, never by moving them outside" {
            let phases = vec![phase(1, "2025-01-01", 10)];
            let features = vec![
                feature(1, 1, "2025-01-01", 3, None),
                feature(2, 1, "2025-01-04", 6, Some("feature-1")),
            ];
            let items = vec![item(1, 2, "2025-01-05", 3, None)];
            let mut graph = TaskGraph::build(&phases, &features, &items);

            reschedule(
                &mut graph,
                "phase-1".parse().unwrap(),
                date("2025-02-01"),
                Some(date("2025-02-06")),
            )
            .expect("reschedule");

            let p = graph.get("phase-1".parse().unwrap()).unwrap();
            assert_eq!(p.start, date("2025-02-01"));
            assert_eq!(p.duration, 5);
            assert_schedule_invariants(&graph);
        }
    }

    describe "critical path" {
        it "walks three chained durations to a total of nine" {
            let phases = vec![phase(9, "2025-01-01", 0)];
            let features = vec![
                feature(11, 9, "2025-01-01", 3, None),
                feature(12, 9, "2025-01-04", 4, Some("feature-11")),
                feature(13, 9, "2025-01-08", 2, Some("feature-12")),
            ];
            let graph = TaskGraph::build(&phases, &features, &[]);

            let path = compute_critical_path(&graph).expect("acyclic");
            let rendered: Vec<String> = path.iter().map(|r| r.to_string()).collect();
            assert_eq!(rendered, vec!["feature-11", "feature-12", "feature-13"]);
            let total: i64 = path.iter().map(|r| graph.get(*r).unwrap().duration).sum();
            assert_eq!(total, 9);
        }

        it "fans a bare reference out to both kinds sharing the id" {
            // feature-7 and item-7 share a numeric id; a dependency on "7"
            // reaches both, and the dependent must wait for the later one.
            let phases = vec![phase(9, "2025-01-01", 0)];
            let features = vec![
                feature(7, 9, "2025-01-01", 2, None),
                feature(8, 9, "2025-01-03", 1, Some("7")),
                feature(6, 9, "2025-01-01", 4, None),
            ];
            let items = vec![item(7, 6, "2025-01-01", 4, None)];
            let mut graph = TaskGraph::build(&phases, &features, &items);

            settle_part(&mut graph, "feature-8".parse().unwrap()).expect("settle");
            let f8 = graph.get("feature-8".parse().unwrap()).unwrap();
            // item-7 ends 2025-01-05, feature-7 ends 2025-01-03.
            assert_eq!(f8.start, date("2025-01-05"));
        }
    }

    describe "reschedule cascade" {
        it "keeps dependency ordering for every pair after the cascade" {
            let phases = vec![phase(9, "2025-01-01", 40)];
            let features = vec![
                feature(11, 9, "2025-01-01", 4, None),
                feature(12, 9, "2025-01-05", 3, Some("feature-11")),
                feature(13, 9, "2025-01-08", 2, Some("feature-12, feature-11")),
            ];
            let mut graph = TaskGraph::build(&phases, &features, &[]);

            reschedule(&mut graph, "feature-11".parse().unwrap(), date("2025-01-12"), None)
                .expect("reschedule");

            let f11 = graph.get("feature-11".parse().unwrap()).unwrap();
            let f12 = graph.get("feature-12".parse().unwrap()).unwrap();
            let f13 = graph.get("feature-13".parse().unwrap()).unwrap();
            assert!(f12.start >= f11.end());
            assert!(f13.start >= f12.end());
            assert!(f13.start >= f11.end());
            assert_schedule_invariants(&graph);
        }

        it "leaves unrelated parts alone" {
            let phases = vec![phase(9, "2025-01-01", 40)];
            let features = vec![
                feature(11, 9, "2025-01-01", 4, None),
                feature(12, 9, "2025-01-10", 3, None),
            ];
            let mut graph = TaskGraph::build(&phases, &features, &[]);

            let outcome = reschedule(
                &mut graph,
                "feature-11".parse().unwrap(),
                date("2025-01-03"),
                None,
            )
            .expect("reschedule");

            assert_eq!(outcome.adjustments.len(), 1);
            assert_eq!(
                graph.get("feature-12".parse().unwrap()).unwrap().start,
                date("2025-01-10")
            );
        }
    }
}
