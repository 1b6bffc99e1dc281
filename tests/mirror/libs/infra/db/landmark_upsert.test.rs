use geoscan_domain_models::Landmark;
use geoscan_infra_db::{DbClient, FortRepository};

fn landmark(last_modified: i64) -> Landmark {
    Landmark {
        external_id: "fort-1".into(),
        lat: 10.0,
        lon: 20.0,
        team: Some(2),
        prestige: Some(5000),
        guard_species_id: Some(143),
        last_modified,
    }
}

#[tokio::test]
async fn newer_observation_replaces_the_stored_row() {
    let client = DbClient::connect("file::memory:?cache=shared", None).await.unwrap();
    let repo = FortRepository::new(client);

    assert!(repo.upsert_if_newer(&landmark(100)).await.unwrap());
    assert!(repo.upsert_if_newer(&landmark(200)).await.unwrap());
}

#[tokio::test]
async fn stale_observation_does_not_replace_the_stored_row() {
    let client = DbClient::connect("file::memory:?cache=shared", None).await.unwrap();
    let repo = FortRepository::new(client);

    assert!(repo.upsert_if_newer(&landmark(200)).await.unwrap());
    assert!(!repo.upsert_if_newer(&landmark(50)).await.unwrap());
}
