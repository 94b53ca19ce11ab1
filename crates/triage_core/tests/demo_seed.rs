use pretty_assertions::assert_eq;
use tempfile::tempdir;

use triage_core::db;
use triage_core::demo::{sample_incidents, seed_demo_dataset};
use triage_core::domain::{IncidentPatch, IncidentStatus};
use triage_core::repo::{count_incidents, get_incident, list_incidents, update_incident};

#[test]
fn seeded_rows_match_sample_fixture() {
    let tmp = tempdir().unwrap();
    let mut conn = db::open_and_migrate(&tmp.path().join("demo.sqlite")).expect("open");

    let seeded = seed_demo_dataset(&mut conn).expect("seed");
    assert_eq!(seeded, sample_incidents());
    assert_eq!(count_incidents(&conn).unwrap(), 6);
}

#[test]
fn list_is_newest_first() {
    let mut conn = db::open_in_memory().unwrap();
    db::migrate(&mut conn).unwrap();
    seed_demo_dataset(&mut conn).unwrap();

    let ids: Vec<i64> = list_incidents(&conn).unwrap().iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![6, 5, 4, 3, 2, 1]);
}

#[test]
fn resolving_one_incident_leaves_everything_else_untouched() {
    let mut conn = db::open_in_memory().unwrap();
    db::migrate(&mut conn).unwrap();
    seed_demo_dataset(&mut conn).unwrap();
    let before = list_incidents(&conn).unwrap();

    update_incident(&mut conn, 4, &IncidentPatch::status(IncidentStatus::Resolved)).unwrap();

    let after = list_incidents(&conn).unwrap();
    for (old, new) in before.iter().zip(after.iter()) {
        if new.id == 4 {
            assert_eq!(new.status, IncidentStatus::Resolved);
            assert!(new.resolved_at.is_some());
            let mut expected = old.clone();
            expected.status = IncidentStatus::Resolved;
            expected.resolved_at = new.resolved_at.clone();
            assert_eq!(*new, expected);
        } else {
            assert_eq!(new, old);
        }
    }
    assert_eq!(get_incident(&conn, 4).unwrap().date, "2026-01-06T15:30:00Z");
}

#[test]
fn data_survives_reopen() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("nested").join("incidents.sqlite");
    {
        let mut conn = db::open_and_migrate(&path).unwrap();
        seed_demo_dataset(&mut conn).unwrap();
        update_incident(&mut conn, 2, &IncidentPatch::comments("técnico en camino")).unwrap();
    }
    let conn = db::open_and_migrate(&path).unwrap();
    assert_eq!(get_incident(&conn, 2).unwrap().comments, "técnico en camino");
}
