//! Spirit study-design core
//!
//! The domain model behind the Spirit biosample management system: studies,
//! their groups and subgroups, phases (timepoints), named treatments,
//! sampling plans, scheduled actions and randomization sessions. This crate
//! carries the design semantics only; persistence, reporting and the user
//! interface live in the host application and talk to the model through the
//! accessors and mutators exposed here.

pub mod common;
pub mod config;
pub mod groups;
pub mod measurements;
pub mod phases;
pub mod randomization;
pub mod samplings;
pub mod studies;
pub mod treatments;

#[cfg(test)]
pub mod test_helpers;

pub use common::errors::{SpiritError, SpiritResult};
pub use common::models::{ActionId, GroupId, PhaseId, SamplingId, SamplingPlanId, TreatmentId};
pub use config::Config;
pub use groups::models::Group;
pub use measurements::models::Measurement;
pub use phases::models::{Phase, PhaseFormat};
pub use randomization::models::{AttachedBiosample, Randomization};
pub use samplings::models::{NamedSampling, Sampling};
pub use studies::models::{Study, StudyAction};
pub use studies::services::{Difference, DifferenceList, difference_list};
pub use treatments::models::{DoseUnit, NamedTreatment, TreatmentDose};
