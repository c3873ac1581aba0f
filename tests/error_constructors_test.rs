use chargesync::error::ChargeSyncError;

#[test]
fn error_constructors_group_1() {
    assert!(matches!(
        ChargeSyncError::config("x"),
        ChargeSyncError::Config { .. }
    ));
    assert!(matches!(
        ChargeSyncError::fetch("x"),
        ChargeSyncError::Fetch { .. }
    ));
    assert!(matches!(
        ChargeSyncError::data_shape("x"),
        ChargeSyncError::DataShape { .. }
    ));
    assert!(matches!(ChargeSyncError::web("x"), ChargeSyncError::Web { .. }));
}

#[test]
fn error_constructors_group_2() {
    let ser = ChargeSyncError::Serialization {
        message: "s".into(),
    };
    assert!(matches!(ser, ChargeSyncError::Serialization { .. }));
    assert!(matches!(ChargeSyncError::io("x"), ChargeSyncError::Io { .. }));
    assert!(matches!(
        ChargeSyncError::network("x"),
        ChargeSyncError::Network { .. }
    ));
    assert!(matches!(ChargeSyncError::api("x"), ChargeSyncError::Api { .. }));
}

#[test]
fn error_constructors_group_3() {
    assert!(matches!(
        ChargeSyncError::auth("x"),
        ChargeSyncError::Auth { .. }
    ));
    assert!(matches!(
        ChargeSyncError::validation("f", "m"),
        ChargeSyncError::Validation { .. }
    ));
    assert!(matches!(
        ChargeSyncError::timeout("x"),
        ChargeSyncError::Timeout { .. }
    ));
    assert!(matches!(
        ChargeSyncError::generic("x"),
        ChargeSyncError::Generic { .. }
    ));
}

#[test]
fn only_auth_errors_ask_for_reauthentication() {
    assert!(ChargeSyncError::auth("expired").is_auth());
    assert!(!ChargeSyncError::fetch("503").is_auth());
    assert!(!ChargeSyncError::data_shape("no config").is_auth());
}

#[test]
fn display_messages() {
    let e = ChargeSyncError::validation("field", "bad");
    let s = format!("{}", e);
    assert!(s.contains("Validation error"));
    assert_eq!(
        ChargeSyncError::fetch("HTTP 503").to_string(),
        "Fetch error: HTTP 503"
    );
}
