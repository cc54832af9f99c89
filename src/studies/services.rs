//! Study audit: field-level comparison of two study snapshots
//!
//! Used by the revision history screen to summarize what changed between
//! two revisions of a study. Scalar fields are compared directly;
//! collections collapse into a single summary line computed with exact
//! (all-attribute) comparators. Diffing is best effort: a failure while
//! comparing one collection is logged and skipped, the remaining fields
//! are still reported.

use crate::groups::models::Group;
use crate::phases::models::Phase;
use crate::samplings::models::NamedSampling;
use crate::studies::models::{Study, StudyAction};
use crate::treatments::models::NamedTreatment;
use serde::Serialize;
use serde_json::Value;

/// One named difference between two study snapshots.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Difference {
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

impl Difference {
    fn new(field: &str, old_value: impl Into<String>, new_value: impl Into<String>) -> Self {
        Difference {
            field: field.to_string(),
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }
}

pub type DifferenceList = Vec<Difference>;

/// Compare two study snapshots, producing an ordered list of named
/// differences (scalars first, then one summary per collection).
pub fn difference_list(old: &Study, new: &Study) -> DifferenceList {
    let mut differences = DifferenceList::new();

    push_scalar(&mut differences, "study_id", &old.study_id, &new.study_id);
    push_scalar(&mut differences, "title", &old.title, &new.title);
    push_scalar(
        &mut differences,
        "notes",
        old.notes.as_deref().unwrap_or(""),
        new.notes.as_deref().unwrap_or(""),
    );
    push_scalar(
        &mut differences,
        "metadata",
        &old.serialized_metadata,
        &new.serialized_metadata,
    );
    push_scalar(&mut differences, "admin_users", &old.admin_users, &new.admin_users);
    push_scalar(&mut differences, "expert_users", &old.expert_users, &new.expert_users);
    push_scalar(&mut differences, "blind_users", &old.blind_users, &new.blind_users);
    push_scalar(
        &mut differences,
        "starting_date",
        &format_option(old.starting_date.as_ref()),
        &format_option(new.starting_date.as_ref()),
    );
    push_scalar(
        &mut differences,
        "phase_format",
        &format!("{:?}", old.phase_format),
        &format!("{:?}", new.phase_format),
    );

    let collections: [(&str, anyhow::Result<Option<Difference>>); 5] = [
        (
            "groups",
            summarize_collection("groups", old.groups(), new.groups(), |g| g.id.0, group_exact_eq),
        ),
        (
            "phases",
            summarize_collection("phases", &old.phases(), &new.phases(), |p| p.id.0, phase_exact_eq),
        ),
        (
            "treatments",
            summarize_collection(
                "treatments",
                old.named_treatments(),
                new.named_treatments(),
                |t| t.id.0,
                treatment_exact_eq,
            ),
        ),
        (
            "samplings",
            summarize_collection(
                "samplings",
                old.named_samplings(),
                new.named_samplings(),
                |s| s.id.0,
                sampling_plan_exact_eq,
            ),
        ),
        (
            "actions",
            summarize_collection("actions", old.actions(), new.actions(), |a| a.id.0, action_exact_eq),
        ),
    ];

    for (field, result) in collections {
        match result {
            Ok(Some(difference)) => differences.push(difference),
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(field, %error, "skipping collection while diffing study");
            }
        }
    }

    differences
}

/// Render a difference list for the audit boundary.
pub fn differences_to_json(differences: &DifferenceList) -> Value {
    serde_json::to_value(differences).unwrap_or_else(|error| {
        tracing::warn!(%error, "failed to serialize difference list");
        Value::Null
    })
}

fn push_scalar(differences: &mut DifferenceList, field: &str, old: &str, new: &str) {
    if old != new {
        differences.push(Difference::new(field, old, new));
    }
}

fn format_option<T: std::fmt::Display>(value: Option<&T>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

/// Collapse a collection comparison into one summary difference
/// ("2 added; 1 removed; 1 updated"), or `None` when nothing changed.
fn summarize_collection<T, K: PartialEq + Copy>(
    field: &str,
    old: &[T],
    new: &[T],
    key: impl Fn(&T) -> K,
    exact_eq: impl Fn(&T, &T) -> bool,
) -> anyhow::Result<Option<Difference>> {
    let mut added = 0;
    let mut removed = 0;
    let mut updated = 0;

    for item in new {
        match old.iter().find(|o| key(o) == key(item)) {
            None => added += 1,
            Some(previous) => {
                if !exact_eq(previous, item) {
                    updated += 1;
                }
            }
        }
    }
    for item in old {
        if !new.iter().any(|n| key(n) == key(item)) {
            removed += 1;
        }
    }

    if added == 0 && removed == 0 && updated == 0 {
        return Ok(None);
    }
    let mut parts = Vec::new();
    if added > 0 {
        parts.push(format!("{added} added"));
    }
    if removed > 0 {
        parts.push(format!("{removed} removed"));
    }
    if updated > 0 {
        parts.push(format!("{updated} updated"));
    }
    Ok(Some(Difference::new(field, String::new(), parts.join("; "))))
}

// Exact comparators: all persisted attributes, not just identity.

fn group_exact_eq(a: &Group, b: &Group) -> bool {
    a == b
}

fn phase_exact_eq(a: &&Phase, b: &&Phase) -> bool {
    a.name == b.name
        && a.format == b.format
        && a.serialized_randomization == b.serialized_randomization
}

fn treatment_exact_eq(a: &NamedTreatment, b: &NamedTreatment) -> bool {
    a == b
}

fn sampling_plan_exact_eq(a: &NamedSampling, b: &NamedSampling) -> bool {
    a.name == b.name
        && a.necropsy == b.necropsy
        && a.samplings().len() == b.samplings().len()
        && a.samplings().iter().zip(b.samplings()).all(|(x, y)| {
            x.id == y.id
                && x.parent == y.parent
                && x.biotype == y.biotype
                && x.sample_name == y.sample_name
                && x.metadata == y.metadata
                && x.comments == y.comments
                && x.container_type == y.container_type
                && x.amount == y.amount
                && x.weighing_required == y.weighing_required
                && x.length_required == y.length_required
                && x.comments_required == y.comments_required
                && x.measurements == y.measurements
        })
}

fn action_exact_eq(a: &StudyAction, b: &StudyAction) -> bool {
    a.group == b.group
        && a.subgroup == b.subgroup
        && a.phase == b.phase
        && a.named_treatment == b.named_treatment
        && a.named_sampling1 == b.named_sampling1
        && a.named_sampling2 == b.named_sampling2
        && a.measure_food == b.measure_food
        && a.measure_water == b.measure_water
        && a.measure_weight == b.measure_weight
        && a.label == b.label
        && a.measurements == b.measurements
}
