use geoscan_domain_models::Sighting;
use geoscan_infra_db::{DbClient, SightingRepository};

async fn memory_repo() -> SightingRepository {
    let client = DbClient::connect("file::memory:?cache=shared", None)
        .await
        .expect("in-memory database should connect");
    SightingRepository::new(client)
}

#[tokio::test]
async fn second_insert_with_same_key_is_suppressed() {
    let repo = memory_repo().await;

    let first = Sighting {
        encounter_id: "enc-1".into(),
        species_id: 25,
        spawn_id: None,
        expire_timestamp: 1_700_000_121,
        lat: 0.1,
        lon: 0.1,
    };
    let second = Sighting {
        encounter_id: "enc-2".into(),
        expire_timestamp: 1_700_000_115,
        ..first.clone()
    };

    assert!(repo.insert_if_new(&first).await.unwrap());
    assert!(!repo.insert_if_new(&second).await.unwrap());
}

#[tokio::test]
async fn distinct_locations_are_both_stored() {
    let repo = memory_repo().await;

    let a = Sighting {
        encounter_id: "enc-a".into(),
        species_id: 1,
        spawn_id: None,
        expire_timestamp: 1000,
        lat: 1.0,
        lon: 1.0,
    };
    let b = Sighting { encounter_id: "enc-b".into(), lat: 2.0, ..a.clone() };

    assert!(repo.insert_if_new(&a).await.unwrap());
    assert!(repo.insert_if_new(&b).await.unwrap());
}
