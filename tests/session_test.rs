use chargesync::session::{SessionRecord, lifetime_energy, session_cost};

#[test]
fn continuing_session_adds_priced_delta() {
    assert_eq!(session_cost(3.0, 2.0, 0.5, 0.5), 1.0);
}

#[test]
fn reset_or_idle_session_is_priced_from_scratch() {
    assert_eq!(session_cost(0.5, 3.0, 1.0, 0.5), 0.25);
    assert_eq!(session_cost(0.0, 3.0, 1.0, 0.5), 0.0);
}

#[test]
fn cost_accumulates_over_a_session_with_price_changes() {
    let readings = [(1.0, 0.2), (2.0, 0.2), (2.0, 0.4), (4.0, 0.4)];
    let (mut energy, mut cost) = (0.0, 0.0);
    for (e, price) in readings {
        cost = session_cost(e, energy, cost, price);
        energy = e;
    }
    assert!((cost - (0.2 + 0.2 + 0.8)).abs() < 1e-9);
}

#[test]
fn lifetime_energy_counts_only_this_charger() {
    let sessions = vec![
        SessionRecord::new("A", Some(3.0)),
        SessionRecord::new("B", Some(10.0)),
        SessionRecord::new("A", Some(2.0)),
        SessionRecord::new("A", None),
    ];
    assert_eq!(lifetime_energy(&sessions, "A", 2.0), 7.0);
    assert_eq!(lifetime_energy(&[], "A", 1.5), 1.5);
}

#[test]
fn session_records_accept_api_field_names() {
    let rec: SessionRecord =
        serde_json::from_value(serde_json::json!({ "charger_id": "A", "energy": 4.0 })).unwrap();
    assert_eq!(rec, SessionRecord::new("A", Some(4.0)));
}
