//! Randomization state: subjects being assigned to groups at a phase
//!
//! The randomization screen works on an ordered list of
//! [`AttachedBiosample`] records that is serialized into a versioned text
//! blob stored on the phase. The writer always emits version 1 (a `&1`
//! header line followed by one `#`-delimited record per line); the reader
//! additionally accepts the legacy version 0 (`#`-separated records with
//! `;`-separated fields and no data columns). Both formats must keep
//! reading byte-for-byte compatible archives, so decoding is tolerant and
//! never fails: malformed numbers default to zero or `None`.

use crate::common::codecs::{parse_f64_opt, parse_int_or_zero};
use crate::common::errors::SpiritResult;
use crate::common::models::GroupId;
use crate::validation_error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const VERSION_1_HEADER: &str = "&1";

/// One subject slot in a randomization session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachedBiosample {
    /// Ordinal number of the slot, unique within the session.
    pub no: i32,
    pub sample_id: String,
    pub sample_name: Option<String>,
    pub container_id: Option<String>,
    pub weight: Option<f64>,
    /// Free-form numeric columns captured during randomization.
    pub data: Vec<Option<f64>>,
    /// Target group, once assigned.
    pub group: Option<GroupId>,
    pub subgroup: i32,
}

impl AttachedBiosample {
    pub fn new(no: i32) -> Self {
        AttachedBiosample {
            no,
            ..AttachedBiosample::default()
        }
    }
}

/// The transient, in-memory randomization state for one phase.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Randomization {
    samples: Vec<AttachedBiosample>,
}

impl Randomization {
    pub fn new() -> Self {
        Randomization::default()
    }

    pub fn samples(&self) -> &[AttachedBiosample] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [AttachedBiosample] {
        &mut self.samples
    }

    pub fn n_animals(&self) -> usize {
        self.samples.len()
    }

    /// Resize the session to `n` slots.
    ///
    /// Shrinking fails when a removed slot already carries a sample id (the
    /// data-loss guard); growing allocates the lowest unused ordinal
    /// numbers.
    pub fn set_n_animals(&mut self, n: usize) -> SpiritResult<()> {
        if n < self.samples.len() {
            for sample in &self.samples[n..] {
                if !sample.sample_id.is_empty() {
                    return Err(validation_error!(
                        "n_animals",
                        format!(
                            "cannot remove slot {}: sample '{}' is already entered",
                            sample.no, sample.sample_id
                        )
                    ));
                }
            }
            self.samples.truncate(n);
            return Ok(());
        }
        let used: BTreeSet<i32> = self.samples.iter().map(|s| s.no).collect();
        let mut candidate = 1;
        while self.samples.len() < n {
            while used.contains(&candidate) {
                candidate += 1;
            }
            self.samples.push(AttachedBiosample::new(candidate));
            candidate += 1;
        }
        Ok(())
    }

    /// Serialize into the version-1 wire format.
    pub fn serialize(&self) -> String {
        let mut out = String::from(VERSION_1_HEADER);
        for sample in &self.samples {
            out.push('\n');
            out.push_str(&encode_record(sample));
        }
        out
    }

    /// Deserialize a version-0 or version-1 blob. Never fails; malformed
    /// records are decoded field by field with defaults.
    pub fn deserialize(text: &str) -> Self {
        let text = text.trim_end_matches('\n');
        if text.is_empty() {
            return Randomization::new();
        }
        let samples = match text.strip_prefix(VERSION_1_HEADER) {
            Some(body) => body
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| decode_record(line, '#', true))
                .collect(),
            None => text
                .split('#')
                .filter(|record| !record.trim().is_empty())
                .map(|record| decode_record(record, ';', false))
                .collect(),
        };
        Randomization { samples }
    }
}

fn encode_record(sample: &AttachedBiosample) -> String {
    let mut fields = vec![
        sample.no.to_string(),
        sample.sample_name.clone().unwrap_or_default(),
        sample.weight.map(|w| w.to_string()).unwrap_or_default(),
        sample.sample_id.clone(),
        sample.group.map(|g| g.to_string()).unwrap_or_default(),
        sample.container_id.clone().unwrap_or_default(),
        sample.subgroup.to_string(),
    ];
    for value in &sample.data {
        fields.push(value.map(|v| v.to_string()).unwrap_or_default());
    }
    fields.join("#")
}

/// Decode one record. Field order is fixed across both versions: no,
/// sample name, weight, sample id, group id, container id, subgroup, then
/// the variable-length data columns (version 1 only).
fn decode_record(record: &str, separator: char, with_data: bool) -> AttachedBiosample {
    let fields: Vec<&str> = record.split(separator).collect();
    let field = |index: usize| fields.get(index).copied().unwrap_or("");

    let no = parse_int_or_zero(field(0));
    let sample_name = non_empty(field(1).to_string());
    let weight = parse_f64_opt(field(2));
    let sample_id = field(3).to_string();
    let group = non_empty(field(4).to_string()).map(|g| GroupId(parse_int_or_zero(&g)));
    let container_id = non_empty(field(5).to_string());
    let subgroup = parse_int_or_zero(field(6));
    let data = if with_data && fields.len() > 7 {
        fields[7..].iter().map(|f| parse_f64_opt(f)).collect()
    } else {
        Vec::new()
    };
    AttachedBiosample {
        no,
        sample_id,
        sample_name,
        container_id,
        weight,
        data,
        group,
        subgroup,
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}
