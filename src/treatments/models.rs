//! Named treatments: reusable compound/dose/application definitions
//!
//! A treatment carries up to two dosed compounds. Units are either absolute
//! or weight-dependent; for weight-dependent units the effective dose is
//! scaled by the subject's weight at administration time.

use crate::common::models::TreatmentId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dose unit of a treatment compound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoseUnit {
    MgPerKg,
    UgPerKg,
    MlPerKg,
    Mg,
    Ug,
    Ml,
}

impl DoseUnit {
    /// Whether the effective dose depends on the subject's weight.
    pub fn is_weight_dependant(self) -> bool {
        matches!(self, DoseUnit::MgPerKg | DoseUnit::UgPerKg | DoseUnit::MlPerKg)
    }

    pub fn label(self) -> &'static str {
        match self {
            DoseUnit::MgPerKg => "mg/kg",
            DoseUnit::UgPerKg => "ug/kg",
            DoseUnit::MlPerKg => "ml/kg",
            DoseUnit::Mg => "mg",
            DoseUnit::Ug => "ug",
            DoseUnit::Ml => "ml",
        }
    }
}

/// One dosed compound within a named treatment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreatmentDose {
    pub compound: String,
    pub dose: f64,
    pub unit: DoseUnit,
    pub application: Option<String>,
}

impl TreatmentDose {
    pub fn new(compound: &str, dose: f64, unit: DoseUnit) -> Self {
        TreatmentDose {
            compound: compound.to_string(),
            dose,
            unit,
            application: None,
        }
    }

    /// Effective dose for a subject weighing `weight_grams`. For
    /// weight-dependent units this is `dose * weight / 1000` (grams to
    /// kilograms); otherwise the configured dose is returned unchanged.
    pub fn calculated_dose(&self, weight_grams: f64) -> f64 {
        if self.unit.is_weight_dependant() {
            self.dose * weight_grams / 1000.0
        } else {
            self.dose
        }
    }
}

/// A reusable treatment definition with up to two compounds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedTreatment {
    pub id: TreatmentId,
    pub name: String,
    pub color_rgb: Option<i32>,
    pub dose1: Option<TreatmentDose>,
    pub dose2: Option<TreatmentDose>,
}

impl NamedTreatment {
    pub fn new(id: TreatmentId, name: &str) -> Self {
        NamedTreatment {
            id,
            name: name.to_string(),
            color_rgb: None,
            dose1: None,
            dose2: None,
        }
    }

    /// Effective first-compound dose for a subject of the given weight.
    pub fn calculated_dose1(&self, weight_grams: f64) -> Option<f64> {
        self.dose1.as_ref().map(|d| d.calculated_dose(weight_grams))
    }

    /// Effective second-compound dose for a subject of the given weight.
    pub fn calculated_dose2(&self, weight_grams: f64) -> Option<f64> {
        self.dose2.as_ref().map(|d| d.calculated_dose(weight_grams))
    }

    /// Human-readable compound summary, e.g. `"cisplatin 5mg/kg + saline 1ml"`.
    pub fn compound_summary(&self) -> String {
        let mut parts = Vec::new();
        for dose in [&self.dose1, &self.dose2].into_iter().flatten() {
            parts.push(format!("{} {}{}", dose.compound, dose.dose, dose.unit.label()));
        }
        parts.join(" + ")
    }
}

impl fmt::Display for NamedTreatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
