//! Reconciliation Properties
//!
//! Convergence of the store under reordered, repeated and late records.

use std::sync::Arc;

use aw_core::SeverityLevel;
use aw_monitor::{Applied, DumpReport, EntityStore, Reconciler, Slot, SourceRecord};
use serde_json::{json, Value};

// ═══════════════════════════════════════════════════════════════════════════════
// TEST FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

fn reconciler() -> Reconciler {
    Reconciler::new(Arc::new(EntityStore::new()))
}

fn apply_all(r: &Reconciler, records: &[SourceRecord]) {
    for record in records {
        r.apply(record).unwrap();
    }
}

fn state(severity: &str, message: &str, value: &str) -> Value {
    json!({
        "severity": severity,
        "current_severity": severity,
        "message": message,
        "current_message": message,
        "value": value,
        "time": {"seconds": 1_700_000_000, "nano": 0}
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROPERTIES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_config_enable_is_idempotent() {
    let r = reconciler();
    let config = SourceRecord::config("/A/PV1", &json!({"description": "Pump", "enabled": true}));

    r.apply(&config).unwrap();
    let first = r.store().entity("/A/PV1").unwrap();
    r.apply(&config).unwrap();
    let second = r.store().entity("/A/PV1").unwrap();

    assert_eq!(first.description(), second.description());
    assert_eq!(first.severity(), second.severity());
    assert_eq!(r.store().len(), 1);
    assert!(r.store().active().is_empty());
}

#[test]
fn test_config_and_state_commute() {
    let config = SourceRecord::config("/A/PV1", &json!({"description": "Pump"}));
    let state = SourceRecord::state("/A/PV1", &state("MAJOR", "High", "5"));

    let config_first = reconciler();
    apply_all(&config_first, &[config.clone(), state.clone()]);
    let state_first = reconciler();
    apply_all(&state_first, &[state, config]);

    for r in [&config_first, &state_first] {
        let pv = r.store().entity("/A/PV1").unwrap();
        assert_eq!(pv.description(), "Pump");
        assert_eq!(pv.severity(), SeverityLevel::Major);
        assert_eq!(pv.message(), "High");
        assert_eq!(pv.value(), "5");
        assert!(r.store().is_active("/A/PV1"));
        assert!(!r.store().is_acknowledged("/A/PV1"));
    }
    assert_eq!(
        config_first.store().entity("/A/PV1"),
        state_first.store().entity("/A/PV1")
    );
}

#[test]
fn test_deletion_wins_over_late_state() {
    let r = reconciler();
    apply_all(
        &r,
        &[
            SourceRecord::config("/A/PV1", &json!({"description": "Pump"})),
            SourceRecord::state("/A/PV1", &state("MAJOR", "High", "5")),
            SourceRecord::config_deleted("/A/PV1"),
        ],
    );

    let late = r
        .apply(&SourceRecord::state("/A/PV1", &state("MINOR", "Low", "1")))
        .unwrap();
    assert_eq!(late, Applied::SuppressedByTombstone);
    assert_eq!(r.store().slot("/A/PV1"), Some(Slot::Tombstone));
    assert!(!r.store().is_active("/A/PV1"));
    assert!(!r.store().is_acknowledged("/A/PV1"));
}

#[test]
fn test_membership_follows_severity() {
    let r = reconciler();
    let cases = [
        ("/A/Active", "INVALID", true, false),
        ("/A/Undefined", "UNDEFINED", true, false),
        ("/A/Acked", "MAJOR_ACK", false, true),
        ("/A/Undefined_Acked", "UNDEFINED_ACK", false, true),
        ("/A/Normal", "OK", false, false),
    ];
    for (path, severity, _, _) in cases {
        r.apply(&SourceRecord::state(path, &state(severity, "m", ""))).unwrap();
    }

    for (path, _, active, acknowledged) in cases {
        assert_eq!(r.store().is_active(path), active, "{path}");
        assert_eq!(r.store().is_acknowledged(path), acknowledged, "{path}");
    }
}

#[test]
fn test_reenable_starts_from_defaults() {
    let r = reconciler();
    apply_all(
        &r,
        &[
            SourceRecord::config("/A/PV1", &json!({"description": "Pump"})),
            SourceRecord::state("/A/PV1", &state("MAJOR", "High", "5")),
            SourceRecord::config("/A/PV1", &json!({"description": "Pump", "enabled": false})),
            SourceRecord::config("/A/PV1", &json!({"description": "New"})),
        ],
    );

    let pv = r.store().entity("/A/PV1").unwrap();
    assert_eq!(pv.description(), "New");
    assert_eq!(pv.severity(), SeverityLevel::Ok);
    assert_eq!(pv.message(), "OK");
    assert_eq!(pv.value(), "");
    assert!(!r.store().is_active("/A/PV1"));
    assert!(!r.store().is_acknowledged("/A/PV1"));
}

#[test]
fn test_end_to_end_active_alarm() {
    let r = reconciler();
    apply_all(
        &r,
        &[
            SourceRecord::config("/Area/PV1", &json!({"description": "Pump"})),
            SourceRecord::state("/Area/PV1", &state("MAJOR", "High", "5")),
        ],
    );

    let active = r.store().active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].path(), "/Area/PV1");
    assert_eq!(active[0].to_string(), "PV1 (Pump): MAJOR/High");
    assert!(r.store().acknowledged().is_empty());
}

#[test]
fn test_acknowledge_then_clear() {
    let r = reconciler();
    for (severity, active, acknowledged) in [
        ("MAJOR", 1, 0),
        ("MAJOR_ACK", 0, 1),
        ("OK", 0, 0),
    ] {
        r.apply(&SourceRecord::state("/Area/PV1", &state(severity, "m", "")))
            .unwrap();
        assert_eq!(r.store().active().len(), active, "{severity}");
        assert_eq!(r.store().acknowledged().len(), acknowledged, "{severity}");
    }
}

#[test]
fn test_non_alarm_records_leave_store_alone() {
    let r = reconciler();
    apply_all(
        &r,
        &[
            SourceRecord::new("command:/Area/PV1", Some("{\"command\": \"ack\"}".into())),
            SourceRecord::new("talk:/Area/PV1", Some("{}".into())),
            SourceRecord::config("/Area", &json!({"guidance": []})),
            SourceRecord::state("/Area", &json!({"severity": "MAJOR", "mode": "normal"})),
        ],
    );
    assert!(r.store().is_empty());
}

#[test]
fn test_dump_marks_tombstones() {
    let r = reconciler();
    apply_all(
        &r,
        &[
            SourceRecord::config("/B/PV2", &json!({"description": "Valve"})),
            SourceRecord::config_deleted("/A/PV1"),
        ],
    );

    let text = DumpReport::capture(r.store(), 2).to_string();
    let config: Vec<&str> = text
        .lines()
        .skip_while(|line| *line != "CONFIG:")
        .skip(1)
        .take_while(|line| !line.is_empty())
        .collect();
    assert_eq!(config.len(), 2);
    assert!(config[0].starts_with("   1 /A/PV1"));
    assert!(config[0].ends_with("<deleted>"));
    assert!(config[1].ends_with("PV2 (Valve): OK/OK"));
}
