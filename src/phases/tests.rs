use super::models::{Phase, PhaseFormat};
use crate::common::models::PhaseId;
use rstest::rstest;

fn phase(name: &str) -> Phase {
    Phase::new(PhaseId(1), name, PhaseFormat::DayMinutes)
}

#[rstest]
#[case("d7_14h30 EOT", 7, 14, 30, "EOT")]
#[case("d0", 0, 0, 0, "")]
#[case("d3 dosing", 3, 0, 0, "dosing")]
#[case("d_4h", 0, 4, 0, "")]
#[case("d1_2h", 1, 2, 0, "")]
#[case("d1_2h5", 1, 2, 5, "")]
#[case("d10_0h30 recovery", 10, 0, 30, "recovery")]
fn test_day_minutes_parsing(
    #[case] name: &str,
    #[case] days: i32,
    #[case] hours: i32,
    #[case] minutes: i32,
    #[case] label: &str,
) {
    let p = phase(name);
    assert_eq!(p.days(), days, "days of {name}");
    assert_eq!(p.hours(), hours, "hours of {name}");
    assert_eq!(p.minutes(), minutes, "minutes of {name}");
    assert_eq!(p.label(), label, "label of {name}");
}

#[rstest]
#[case("7 week1", 7, 0, 0)]
#[case("3. Baseline", 3, 0, 0)]
#[case("", 0, 0, 0)]
#[case("dX_Yh", 0, 0, 0)]
#[case("garbage", 0, 0, 0)]
fn test_tolerant_parsing(
    #[case] name: &str,
    #[case] days: i32,
    #[case] hours: i32,
    #[case] minutes: i32,
) {
    let p = phase(name);
    assert_eq!(p.schedule(), (days, hours, minutes), "schedule of {name:?}");
}

#[test]
fn test_time_minutes() {
    assert_eq!(phase("d7_14h30 EOT").time_minutes(), 11190);
    assert_eq!(phase("d0").time_minutes(), 0);
    assert_eq!(phase("d1").time_minutes(), 24 * 60);
}

#[rstest]
#[case(7, 14, 30, "EOT", "d7_14h30 EOT")]
#[case(0, 0, 0, "", "d0")]
#[case(2, 0, 5, "sampling", "d2_0h05 sampling")]
#[case(1, 4, 0, "", "d1_4h00")]
fn test_format_name_round_trips(
    #[case] days: i32,
    #[case] hours: i32,
    #[case] minutes: i32,
    #[case] label: &str,
    #[case] expected: &str,
) {
    let name = PhaseFormat::DayMinutes.format_name(days, hours, minutes, label);
    assert_eq!(name, expected);
    let p = phase(&name);
    assert_eq!(p.schedule(), (days, hours, minutes));
    assert_eq!(p.label(), label);
}

#[test]
fn test_number_format_name() {
    let name = PhaseFormat::Number.format_name(3, 0, 0, "Baseline");
    assert_eq!(name, "3. Baseline");
    let p = Phase::new(PhaseId(1), &name, PhaseFormat::Number);
    assert_eq!(p.days(), 3);
    assert_eq!(p.label(), "Baseline");
}

#[test]
fn test_ordering_on_schedule_then_name() {
    let mut phases = vec![
        phase("d7_14h30 EOT"),
        phase("d0 start"),
        phase("d7 weighing"),
        phase("d1_2h"),
    ];
    phases.sort();
    let names: Vec<&str> = phases.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["d0 start", "d1_2h", "d7 weighing", "d7_14h30 EOT"]);
}

#[test]
fn test_equality_is_value_based() {
    let a = phase("d7_14h30 EOT");
    let mut b = phase("d7_14h30 EOT");
    b.id = PhaseId(99);
    assert_eq!(a, b);
    assert_ne!(a, phase("d7_14h30 end"));
}

#[test]
fn test_short_name_and_label_split() {
    let p = phase("d7_14h30 end of treatment");
    assert_eq!(p.short_name(), "d7_14h30");
    assert_eq!(p.label(), "end of treatment");
}
