use geoscan_scanner::notifier::Notifier;

#[tokio::test]
async fn distinct_encounters_all_notify() {
    let notifier = Notifier::new((5.0, 30.0));
    let (a, _) = notifier.notify("enc-a", 25, 1.0, 1.0, 300).await;
    let (b, _) = notifier.notify("enc-b", 25, 1.0, 1.0, 300).await;
    assert!(a);
    assert!(b);
}

#[tokio::test]
async fn eligible_rank_starts_wide_and_stays_within_bounds() {
    let notifier = Notifier::new((5.0, 30.0));
    let initial = notifier.eligible_rank();
    assert!((20..=75).contains(&initial));

    for i in 0..50 {
        notifier.notify(&format!("enc-{i}"), 1, 0.0, 0.0, 60).await;
    }
    assert!((20..=75).contains(&notifier.eligible_rank()));
}

#[tokio::test]
async fn explanation_reports_species_and_expiry_for_a_fresh_encounter() {
    let notifier = Notifier::new((5.0, 30.0));
    let (notified, explanation) = notifier.notify("enc-1", 150, 12.5, -8.25, 900).await;
    assert!(notified);
    assert!(explanation.contains("150"));
    assert!(explanation.contains("900"));
}
