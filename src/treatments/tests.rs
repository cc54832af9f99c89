use super::models::{DoseUnit, NamedTreatment, TreatmentDose};
use crate::common::models::TreatmentId;
use rstest::rstest;

#[rstest]
#[case(DoseUnit::MgPerKg, true)]
#[case(DoseUnit::UgPerKg, true)]
#[case(DoseUnit::MlPerKg, true)]
#[case(DoseUnit::Mg, false)]
#[case(DoseUnit::Ug, false)]
#[case(DoseUnit::Ml, false)]
fn test_weight_dependance(#[case] unit: DoseUnit, #[case] dependant: bool) {
    assert_eq!(unit.is_weight_dependant(), dependant);
}

#[test]
fn test_weight_dependent_dose_scales_by_weight() {
    let dose = TreatmentDose::new("cisplatin", 5.0, DoseUnit::MgPerKg);
    // 250 g subject: 5 mg/kg * 0.25 kg
    assert!((dose.calculated_dose(250.0) - 1.25).abs() < 1e-9);
}

#[test]
fn test_absolute_dose_ignores_weight() {
    let dose = TreatmentDose::new("saline", 1.0, DoseUnit::Ml);
    assert!((dose.calculated_dose(250.0) - 1.0).abs() < 1e-9);
}

#[test]
fn test_two_compound_slots() {
    let mut nt = NamedTreatment::new(TreatmentId(1), "combo");
    nt.dose1 = Some(TreatmentDose::new("cisplatin", 5.0, DoseUnit::MgPerKg));
    nt.dose2 = Some(TreatmentDose::new("saline", 1.0, DoseUnit::Ml));
    assert!((nt.calculated_dose1(1000.0).unwrap() - 5.0).abs() < 1e-9);
    assert!((nt.calculated_dose2(1000.0).unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(nt.compound_summary(), "cisplatin 5mg/kg + saline 1ml");
}

#[test]
fn test_empty_treatment_has_no_doses() {
    let nt = NamedTreatment::new(TreatmentId(1), "vehicle");
    assert_eq!(nt.calculated_dose1(200.0), None);
    assert_eq!(nt.calculated_dose2(200.0), None);
    assert_eq!(nt.compound_summary(), "");
}
