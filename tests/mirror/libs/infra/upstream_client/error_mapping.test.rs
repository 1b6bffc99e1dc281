use geoscan_infra_upstream::UpstreamError;

#[test]
fn forbidden_gets_the_longest_backoff_floor() {
    let (low, high) = UpstreamError::Forbidden.sleep_floor_seconds();
    assert_eq!((low, high), (15.0, 20.0));
}

#[test]
fn throttled_gets_a_shorter_backoff_floor_than_forbidden() {
    let (low, high) = UpstreamError::Throttled.sleep_floor_seconds();
    assert_eq!((low, high), (10.0, 12.0));
}

#[test]
fn unclassified_errors_fall_back_to_the_default_floor() {
    let cases = [
        UpstreamError::AuthFailed,
        UpstreamError::NotLoggedIn,
        UpstreamError::ServerBusy,
        UpstreamError::Malformed("bad json".into()),
        UpstreamError::Banned,
        UpstreamError::Transport("connection reset".into()),
    ];
    for case in cases {
        assert_eq!(case.sleep_floor_seconds(), (8.0, 12.0));
    }
}
