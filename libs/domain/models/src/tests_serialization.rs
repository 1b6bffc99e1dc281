use geoscan_core_geo::Point;
use geoscan_domain_models::{Account, Landmark, Sighting, Spawn};

#[test]
fn spawn_round_trips_through_json() {
    let spawn = Spawn::new("spawn-1", Point::flat(1.0, 2.0), 120);
    let encoded = serde_json::to_string(&spawn).unwrap();
    let decoded: Spawn = serde_json::from_str(&encoded).unwrap();
    assert_eq!(spawn, decoded);
}

#[test]
fn landmark_supersedes_only_on_newer_last_modified() {
    let stored = Landmark {
        external_id: "fort-1".into(),
        lat: 0.0,
        lon: 0.0,
        team: Some(1),
        prestige: Some(1000),
        guard_species_id: Some(1),
        last_modified: 100,
    };
    let older = Landmark { last_modified: 50, ..stored.clone() };
    let newer = Landmark { last_modified: 150, ..stored.clone() };
    assert!(!older.supersedes(&stored));
    assert!(newer.supersedes(&stored));
}

#[test]
fn account_starts_fresh_and_unflagged() {
    let account = Account::new("scout1", "hunter2", "google");
    assert!(!account.captcha_flag);
    assert!(account.last_used.is_none());
}

#[test]
fn sighting_keys_ignore_encounter_id() {
    let base = Sighting {
        encounter_id: "e1".into(),
        species_id: 1,
        spawn_id: None,
        expire_timestamp: 1000,
        lat: 10.0,
        lon: 20.0,
    };
    let other = Sighting { encounter_id: "e2".into(), ..base.clone() };
    assert_eq!(base.key(), other.key());
}
