mod common;

use chargesync::capabilities::{
    CapabilitySink, MemoryCapabilityStore, Observable, ObservableValue,
};
use chargesync::driver::{CycleOutcome, PollCycle};
use chargesync::events::ChargerEvent;
use chargesync::session::SessionRecord;
use chargesync::status::ChargerStatus;
use common::{MockApi, RecordingEvents, RejectingSink, snapshot};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

struct Harness {
    api: Arc<MockApi>,
    store: Arc<MemoryCapabilityStore>,
    events: Arc<RecordingEvents>,
    torn_down: Arc<AtomicBool>,
    cycle: PollCycle,
}

fn harness(code: i64, energy: f64, price: f64) -> Harness {
    let api = Arc::new(MockApi::new(snapshot(code, energy, price)));
    let store = Arc::new(MemoryCapabilityStore::new());
    let events = Arc::new(RecordingEvents::default());
    let torn_down = Arc::new(AtomicBool::new(false));
    let cycle = PollCycle::new(
        "A",
        api.clone(),
        store.clone(),
        events.clone(),
        torn_down.clone(),
    );
    Harness {
        api,
        store,
        events,
        torn_down,
        cycle,
    }
}

fn float(store: &MemoryCapabilityStore, name: Observable) -> Option<f64> {
    store.get(name).and_then(|v| v.as_f64())
}

#[tokio::test]
async fn first_poll_writes_every_observable() {
    let h = harness(194, 2.0, 0.25);
    let report = h.cycle.run().await;

    assert_eq!(report.outcome, CycleOutcome::Completed);
    assert_eq!(report.writes, Observable::ALL.len());
    assert_eq!(
        report.events,
        vec![
            ChargerEvent::StatusChanged {
                old: None,
                new: ChargerStatus::Charging
            },
            ChargerEvent::ChargingStarted,
        ]
    );
    assert!(h.store.is_available());
    assert_eq!(
        h.store.get(Observable::Status),
        Some(ObservableValue::from("Charging"))
    );
    assert_eq!(float(&h.store, Observable::MeasurePower), Some(7400.0));
    assert_eq!(
        h.store.get(Observable::Running),
        Some(ObservableValue::from(true))
    );
    assert_eq!(float(&h.store, Observable::SessionCost), Some(0.5));
}

#[tokio::test]
async fn identical_snapshot_is_a_no_op() {
    let h = harness(194, 2.0, 0.25);
    h.cycle.run().await;
    let writes_before = h.store.write_count();
    let events_before = h.events.len();

    let report = h.cycle.run().await;

    assert_eq!(report.writes, 0);
    assert!(report.events.is_empty());
    assert_eq!(h.store.write_count(), writes_before);
    assert_eq!(h.events.len(), events_before);
}

#[tokio::test]
async fn fetch_failure_keeps_values_and_marks_unavailable() {
    let h = harness(194, 2.0, 0.25);
    h.cycle.run().await;
    let before = h.store.values();

    h.api.fail_status("connection refused");
    let report = h.cycle.run().await;

    assert!(matches!(report.outcome, CycleOutcome::Failed(ref m) if m.contains("connection refused")));
    assert_eq!(report.writes, 0);
    assert_eq!(h.store.values(), before);
    assert!(!h.store.is_available());
    assert!(
        h.store
            .unavailable_reason()
            .is_some_and(|r| r.contains("connection refused"))
    );
}

#[tokio::test]
async fn recovery_after_failure_restores_availability() {
    let h = harness(194, 2.0, 0.25);
    h.api.fail_status("timeout");
    h.cycle.run().await;
    assert!(!h.store.is_available());

    h.api.set_snapshot(snapshot(194, 2.0, 0.25));
    let report = h.cycle.run().await;
    assert!(report.is_completed());
    assert!(h.store.is_available());
    assert_eq!(h.store.unavailable_reason(), None);
}

#[tokio::test]
async fn session_cost_follows_energy_and_price() {
    let h = harness(194, 2.0, 0.25);
    h.cycle.run().await;
    assert_eq!(float(&h.store, Observable::SessionCost), Some(0.5));

    // Price change only applies to the newly added kWh
    h.api.set_snapshot(snapshot(194, 3.0, 0.5));
    h.cycle.run().await;
    assert_eq!(float(&h.store, Observable::SessionCost), Some(1.0));
    assert_eq!(float(&h.store, Observable::EnergyCost), Some(0.5));

    // Energy dropped: a new session started
    h.api.set_snapshot(snapshot(194, 0.5, 0.5));
    h.cycle.run().await;
    assert_eq!(float(&h.store, Observable::SessionCost), Some(0.25));
    assert_eq!(float(&h.store, Observable::SessionEnergy), Some(0.5));
}

#[tokio::test]
async fn lifetime_energy_sums_own_sessions() {
    let h = harness(194, 2.0, 0.25);
    h.api.set_sessions(vec![
        SessionRecord::new("A", Some(3.0)),
        SessionRecord::new("B", Some(10.0)),
        SessionRecord::new("A", Some(2.0)),
        SessionRecord::new("A", None),
    ]);
    h.cycle.run().await;
    assert_eq!(float(&h.store, Observable::LifetimeEnergy), Some(7.0));
}

#[tokio::test]
async fn session_listing_failure_is_not_fatal() {
    let h = harness(194, 2.0, 0.25);
    h.api.fail_sessions("HTTP 500");
    let report = h.cycle.run().await;
    assert!(report.is_completed());
    assert_eq!(float(&h.store, Observable::LifetimeEnergy), Some(2.0));
}

#[tokio::test]
async fn charging_to_ready_emits_end_and_unplug() {
    let h = harness(194, 2.0, 0.25);
    h.cycle.run().await;

    h.api.set_snapshot(snapshot(161, 0.0, 0.25));
    let report = h.cycle.run().await;

    assert_eq!(
        report.events,
        vec![
            ChargerEvent::StatusChanged {
                old: Some(ChargerStatus::Charging),
                new: ChargerStatus::Ready
            },
            ChargerEvent::ChargingEnded,
            ChargerEvent::CarUnplugged,
        ]
    );
    assert_eq!(
        h.events.names(),
        vec![
            "status_changed",
            "charging_started",
            "status_changed",
            "charging_ended",
            "car_unplugged"
        ]
    );
}

#[tokio::test]
async fn error_status_only_reports_the_change() {
    let h = harness(161, 0.0, 0.25);
    h.cycle.run().await;

    h.api.set_snapshot(snapshot(14, 0.0, 0.25));
    let report = h.cycle.run().await;

    assert_eq!(report.events.len(), 1);
    assert!(!h.store.is_available());
    assert_eq!(h.store.unavailable_reason().as_deref(), Some("Error"));
}

#[tokio::test]
async fn one_failing_observable_does_not_block_the_rest() {
    let api = Arc::new(MockApi::new(snapshot(194, 2.0, 0.25)));
    let sink = Arc::new(RejectingSink {
        inner: MemoryCapabilityStore::new(),
        rejected: Observable::MeasurePower,
    });
    let cycle = PollCycle::new(
        "A",
        api,
        sink.clone(),
        Arc::new(RecordingEvents::default()),
        Arc::new(AtomicBool::new(false)),
    );

    let report = cycle.run().await;

    assert!(report.is_completed());
    assert_eq!(report.writes, Observable::ALL.len() - 1);
    assert_eq!(sink.get(Observable::MeasurePower), None);
    assert_eq!(
        sink.get(Observable::LifetimeEnergy),
        Some(ObservableValue::from(2.0))
    );
}

#[tokio::test]
async fn torn_down_device_discards_writes_and_events() {
    let h = harness(194, 2.0, 0.25);
    h.torn_down
        .store(true, std::sync::atomic::Ordering::Release);

    let report = h.cycle.run().await;

    assert_eq!(report.writes, 0);
    assert!(report.events.is_empty());
    assert_eq!(h.store.write_count(), 0);
    assert_eq!(h.events.len(), 0);
}

#[tokio::test]
async fn unstored_session_energy_does_not_grow_the_cost() {
    let api = Arc::new(MockApi::new(snapshot(194, 2.0, 0.25)));
    let sink = Arc::new(RejectingSink {
        inner: MemoryCapabilityStore::new(),
        rejected: Observable::SessionEnergy,
    });
    let cycle = PollCycle::new(
        "A",
        api,
        sink.clone(),
        Arc::new(RecordingEvents::default()),
        Arc::new(AtomicBool::new(false)),
    );

    let first = cycle.run().await;
    assert!(first.is_completed());
    assert_eq!(first.writes, Observable::ALL.len() - 2);

    for _ in 0..2 {
        let again = cycle.run().await;
        assert_eq!(again.writes, 0);
    }
    assert_eq!(sink.get(Observable::SessionCost), None);
    assert_eq!(
        sink.get(Observable::LifetimeEnergy),
        Some(ObservableValue::from(2.0))
    );
}
