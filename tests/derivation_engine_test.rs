// ==========================================
// RecordDerivationEngine 集成测试
// ==========================================
// 测试目标: 验收场景 + 派生性质（幂等、非负、单调）
// ==========================================


use fleet_workshop::domain::{DqLevel, RecordField, ServiceRecord};
use fleet_workshop::engine::{BusinessCalendar, RecordDerivationEngine};
use fleet_workshop::logging;
use test_helpers::d;

fn record(plate: &str) -> ServiceRecord {
    ServiceRecord {
        plate: plate.to_string(),
        intake_date: Some(d(2024, 4, 1)),
        ..Default::default()
    }
}

#[test]
fn test_days_to_start_mechanical() {
    logging::init_test();
    let engine = RecordDerivationEngine::new();

    let mut input = record("AA111AA");
    input.mechanical_start = Some(d(2024, 4, 3));

    let outcome = engine.derive(&input);

    assert_eq!(outcome.record.days_to_start_mechanical, Some(2));
    assert!(outcome.violations.is_empty());
}

#[test]
fn test_mechanical_working_days_across_weekend() {
    let engine = RecordDerivationEngine::new();

    let mut input = record("AA111AA");
    input.mechanical_start = Some(d(2024, 4, 5));
    input.mechanical_end = Some(d(2024, 4, 8));

    let outcome = engine.derive(&input);

    assert_eq!(outcome.record.mechanical_working_days, Some(1));
}

#[test]
fn test_zero_pieces_discards_bodywork() {
    let engine = RecordDerivationEngine::new();

    let mut input = record("AA111AA");
    input.bodywork_piece_count = Some(0);
    input.bodywork_start = Some(d(2024, 4, 2));
    input.bodywork_end = Some(d(2024, 4, 5));
    input.bodywork_working_days = Some(3);

    let outcome = engine.derive(&input);

    assert_eq!(outcome.record.bodywork_start, None);
    assert_eq!(outcome.record.bodywork_end, None);
    assert_eq!(outcome.record.bodywork_working_days, None);
    assert_eq!(outcome.record.days_to_start_bodywork, None);
    assert_eq!(outcome.record.last_activity_date, None);
    let discarded: Vec<_> = outcome
        .violations
        .iter()
        .filter(|v| v.level == DqLevel::Info)
        .map(|v| v.field)
        .collect();
    assert_eq!(
        discarded,
        vec![RecordField::BodyworkStart, RecordField::BodyworkEnd]
    );
}

#[test]
fn test_unset_pieces_discards_bodywork() {
    let engine = RecordDerivationEngine::new();

    let mut input = record("AA111AA");
    input.bodywork_start = Some(d(2024, 4, 2));

    let outcome = engine.derive(&input);

    assert_eq!(outcome.record.bodywork_start, None);
    assert_eq!(outcome.record.days_to_start_bodywork, None);
}

#[test]
fn test_last_activity_from_mechanical_end() {
    let engine = RecordDerivationEngine::new();

    let mut input = record("AA111AA");
    input.mechanical_start = Some(d(2024, 4, 2));
    input.mechanical_end = Some(d(2024, 4, 10));
    input.bodywork_piece_count = Some(1);

    let outcome = engine.derive(&input);

    assert_eq!(outcome.record.last_activity_date, Some(d(2024, 4, 10)));
    assert_eq!(outcome.record.vehicle_idle_days, Some(7));
    assert_eq!(outcome.record.downtime_days, Some(7));
    assert_eq!(outcome.record.technical_stoppage_days, Some(6));
}

#[test]
fn test_inverted_mechanical_interval() {
    let engine = RecordDerivationEngine::new();

    let mut input = record("AA111AA");
    input.mechanical_start = Some(d(2024, 4, 10));
    input.mechanical_end = Some(d(2024, 4, 8));

    let outcome = engine.derive(&input);

    assert_eq!(outcome.record.mechanical_working_days, None);
    let warned: Vec<_> = outcome.warnings().map(|v| v.field).collect();
    assert!(warned.contains(&RecordField::MechanicalWorkingDays));
    assert!(warned.contains(&RecordField::TechnicalStoppageDays));
}

#[test]
fn test_full_record_with_bodywork() {
    let engine = RecordDerivationEngine::new();

    let mut input = record("AA111AA");
    input.mechanical_start = Some(d(2024, 4, 2));
    input.mechanical_end = Some(d(2024, 4, 4));
    input.bodywork_piece_count = Some(2);
    input.bodywork_start = Some(d(2024, 4, 8));
    input.bodywork_end = Some(d(2024, 4, 12));

    let outcome = engine.derive(&input);
    let r = &outcome.record;

    assert_eq!(r.days_to_start_mechanical, Some(1));
    assert_eq!(r.mechanical_working_days, Some(2));
    assert_eq!(r.days_to_start_bodywork, Some(5));
    assert_eq!(r.bodywork_working_days, Some(4));
    assert_eq!(r.last_activity_date, Some(d(2024, 4, 12)));
    assert_eq!(r.vehicle_idle_days, Some(9));
    assert_eq!(r.technical_stoppage_days, Some(8));
}

#[test]
fn test_stale_derived_values_are_cleared() {
    let engine = RecordDerivationEngine::new();

    let mut input = record("AA111AA");
    input.intake_date = None;
    input.days_to_start_mechanical = Some(4);
    input.vehicle_idle_days = Some(9);

    let outcome = engine.derive(&input);

    assert_eq!(outcome.record.days_to_start_mechanical, None);
    assert_eq!(outcome.record.vehicle_idle_days, None);
}

#[test]
fn test_derive_is_idempotent() {
    let engine = RecordDerivationEngine::new();

    let mut input = record("AA111AA");
    input.mechanical_start = Some(d(2024, 4, 3));
    input.mechanical_end = Some(d(2024, 4, 9));
    input.bodywork_piece_count = Some(0);
    input.bodywork_start = Some(d(2024, 4, 4));

    let once = engine.derive(&input);
    let twice = engine.derive(&once.record);

    assert_eq!(once.record, twice.record);
}

#[test]
fn test_planned_exit_passes_through() {
    let engine = RecordDerivationEngine::new();

    let mut input = record("AA111AA");
    input.planned_exit_date = Some(d(2024, 3, 1));

    let outcome = engine.derive(&input);

    assert_eq!(outcome.record.planned_exit_date, Some(d(2024, 3, 1)));
}

#[test]
fn test_business_days_properties() {
    let start = d(2024, 4, 1);
    assert_eq!(BusinessCalendar::business_days_between(start, start).unwrap(), 0);

    let mut previous = 0;
    for offset in 0..60u64 {
        let end = start + chrono::Days::new(offset);
        let days = BusinessCalendar::business_days_between(start, end).unwrap();
        assert!(days >= previous);
        previous = days;
    }

    assert!(BusinessCalendar::business_days_between(d(2024, 4, 8), start).is_err());
}
