//! Sampling plans: reusable trees of planned sample-extraction steps
//!
//! A [`NamedSampling`] groups a forest of [`Sampling`] nodes under a name.
//! Each node describes one sample to extract (biotype, container, amount,
//! metadata, required measurements); children describe derived samples
//! (e.g. plasma aliquots from a blood draw). A plan flagged `necropsy`
//! terminates the subjects it is applied to.

use crate::common::codecs::{decode_metadata, encode_metadata};
use crate::common::models::{SamplingId, SamplingPlanId};
use crate::measurements::models::{Measurement, decode_measurements, encode_measurements};
use crate::common::errors::SpiritResult;
use crate::not_found;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One planned sample-extraction step.
///
/// Equality is identity-by-id within the owning plan; all other attributes
/// are compared only by the audit's exact comparators.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sampling {
    pub id: SamplingId,
    pub parent: Option<SamplingId>,
    pub biotype: String,
    pub sample_name: Option<String>,
    /// `key=value;` encoded metadata, see [`crate::common::codecs`].
    #[serde(default)]
    pub metadata: String,
    pub comments: Option<String>,
    pub container_type: Option<String>,
    pub amount: Option<f64>,
    pub weighing_required: bool,
    pub length_required: bool,
    pub comments_required: bool,
    /// Serialized measurement list, see [`crate::measurements::models`].
    #[serde(default)]
    pub measurements: String,
}

impl Sampling {
    fn new(id: SamplingId, parent: Option<SamplingId>, biotype: &str) -> Self {
        Sampling {
            id,
            parent,
            biotype: biotype.to_string(),
            sample_name: None,
            metadata: String::new(),
            comments: None,
            container_type: None,
            amount: None,
            weighing_required: false,
            length_required: false,
            comments_required: false,
            measurements: String::new(),
        }
    }

    pub fn metadata_map(&self) -> BTreeMap<String, String> {
        decode_metadata(&self.metadata)
    }

    pub fn set_metadata_map(&mut self, map: &BTreeMap<String, String>) {
        self.metadata = encode_metadata(map);
    }

    pub fn measurement_list(&self) -> Vec<Measurement> {
        decode_measurements(&self.measurements)
    }

    pub fn set_measurement_list(&mut self, list: &[Measurement]) {
        self.measurements = encode_measurements(list);
    }
}

impl PartialEq for Sampling {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Sampling {}

impl std::hash::Hash for Sampling {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Sampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sample_name {
            Some(name) => write!(f, "{} ({name})", self.biotype),
            None => write!(f, "{}", self.biotype),
        }
    }
}

/// A named container of a sampling forest plus a necropsy flag.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NamedSampling {
    pub id: SamplingPlanId,
    pub name: String,
    pub necropsy: bool,
    samplings: Vec<Sampling>,
    next_sampling_id: i32,
}

impl NamedSampling {
    pub fn new(id: SamplingPlanId, name: &str) -> Self {
        NamedSampling {
            id,
            name: name.to_string(),
            necropsy: false,
            samplings: Vec::new(),
            next_sampling_id: 1,
        }
    }

    /// Add a sampling step under `parent` (`None` for a root step).
    pub fn add_sampling(
        &mut self,
        parent: Option<SamplingId>,
        biotype: &str,
    ) -> SpiritResult<SamplingId> {
        if let Some(parent_id) = parent {
            if self.sampling(parent_id).is_none() {
                return Err(not_found!("sampling", parent_id));
            }
        }
        let id = SamplingId(self.next_sampling_id);
        self.next_sampling_id += 1;
        self.samplings.push(Sampling::new(id, parent, biotype));
        Ok(id)
    }

    pub fn samplings(&self) -> &[Sampling] {
        &self.samplings
    }

    pub fn sampling(&self, id: SamplingId) -> Option<&Sampling> {
        self.samplings.iter().find(|s| s.id == id)
    }

    pub fn sampling_mut(&mut self, id: SamplingId) -> Option<&mut Sampling> {
        self.samplings.iter_mut().find(|s| s.id == id)
    }

    /// Root steps of the forest, in insertion order.
    pub fn roots(&self) -> Vec<&Sampling> {
        self.samplings.iter().filter(|s| s.parent.is_none()).collect()
    }

    /// Direct children of a step, in insertion order.
    pub fn children(&self, id: SamplingId) -> Vec<&Sampling> {
        self.samplings
            .iter()
            .filter(|s| s.parent == Some(id))
            .collect()
    }

    /// Remove a step and its whole subtree.
    pub fn remove_sampling(&mut self, id: SamplingId) -> SpiritResult<()> {
        if self.sampling(id).is_none() {
            return Err(not_found!("sampling", id));
        }
        let mut doomed = vec![id];
        let mut index = 0;
        while index < doomed.len() {
            let current = doomed[index];
            index += 1;
            for child in &self.samplings {
                if child.parent == Some(current) {
                    doomed.push(child.id);
                }
            }
        }
        self.samplings.retain(|s| !doomed.contains(&s.id));
        Ok(())
    }
}

impl fmt::Display for NamedSampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
