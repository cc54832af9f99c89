//! Shared fixtures for the test suite
//!
//! `sample_study` builds the canonical two-phase, two-subgroup study used
//! across the studies tests: group "G1 control" sized 5,5, phases
//! "d0 start" and "d7_14h30 EOT", and one named treatment.

use crate::common::models::GroupId;
use crate::randomization::models::AttachedBiosample;
use crate::studies::models::Study;
use crate::treatments::models::{DoseUnit, TreatmentDose};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize tracing once for the whole test run.
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

pub fn sample_study() -> Study {
    init_test_env();
    let mut study = Study::new("S-00001");
    study.add_phase("d0 start");
    study.add_phase("d7_14h30 EOT");

    let group = study.add_group("G1 control");
    study.group_mut(group).unwrap().set_subgroup_sizes(&[5, 5]);

    let treatment = study.add_named_treatment("Vehicle");
    study.named_treatment_mut(treatment).unwrap().dose1 =
        Some(TreatmentDose::new("saline", 1.0, DoseUnit::MlPerKg));

    study
}

/// Attach a participant to a group/subgroup of the study.
pub fn attach(study: &mut Study, no: i32, sample_id: &str, group: GroupId, subgroup: i32) {
    study.attach_participant(AttachedBiosample {
        no,
        sample_id: sample_id.to_string(),
        group: Some(group),
        subgroup,
        ..AttachedBiosample::default()
    });
}
