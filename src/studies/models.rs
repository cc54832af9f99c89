//! Studies: the aggregate root of the design model
//!
//! A [`Study`] owns its groups, phases, named treatments, sampling plans,
//! scheduled actions and attached participants, and hands out the typed ids
//! used for every cross-reference. The scheduling unit is the
//! [`StudyAction`]: one record per (group, subgroup, phase) combination
//! that has something planned.
//!
//! The `(group, subgroup) -> (phase -> action)` lookup map is memoized
//! behind the read accessors and invalidated by every structural mutator
//! (and by the public [`Study::reset_cache`] escape hatch). The study makes
//! no `Sync` promise: like the rest of the model it is meant to live on a
//! single thread.

use crate::common::codecs::{decode_metadata, decode_user_list, encode_metadata};
use crate::common::errors::SpiritResult;
use crate::common::models::{ActionId, GroupId, PhaseId, SamplingPlanId, TreatmentId};
use crate::config::Config;
use crate::groups::models::Group;
use crate::measurements::models::{Measurement, decode_measurements, encode_measurements};
use crate::phases::models::{Phase, PhaseFormat};
use crate::randomization::models::AttachedBiosample;
use crate::samplings::models::NamedSampling;
use crate::treatments::models::NamedTreatment;
use crate::{not_found, rule_violation, validation_error};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

/// Prefix marking a blind user who must not see any group information.
const BLIND_ALL_PREFIX: &str = "1#";
/// Prefix marking a blind user who may see groups but not treatment details.
const BLIND_DETAILS_PREFIX: &str = "0#";

/// The scheduled combination of treatment, sampling plans and measurements
/// for one (group, subgroup, phase) triple.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StudyAction {
    pub id: ActionId,
    pub group: GroupId,
    pub subgroup: i32,
    pub phase: PhaseId,
    pub named_treatment: Option<TreatmentId>,
    pub named_sampling1: Option<SamplingPlanId>,
    pub named_sampling2: Option<SamplingPlanId>,
    pub measure_food: bool,
    pub measure_water: bool,
    pub measure_weight: bool,
    pub label: Option<String>,
    /// Serialized extra measurements, see [`crate::measurements::models`].
    #[serde(default)]
    pub measurements: String,
}

impl StudyAction {
    fn new(id: ActionId, group: GroupId, subgroup: i32, phase: PhaseId) -> Self {
        StudyAction {
            id,
            group,
            subgroup,
            phase,
            named_treatment: None,
            named_sampling1: None,
            named_sampling2: None,
            measure_food: false,
            measure_water: false,
            measure_weight: false,
            label: None,
            measurements: String::new(),
        }
    }

    /// True when nothing is scheduled: no treatment, no sampling plans, no
    /// measurements and no label.
    pub fn is_empty(&self) -> bool {
        self.named_treatment.is_none()
            && self.named_sampling1.is_none()
            && self.named_sampling2.is_none()
            && !self.measure_food
            && !self.measure_water
            && !self.measure_weight
            && self.label.as_deref().is_none_or(str::is_empty)
            && self.measurements.is_empty()
    }

    pub fn has_sampling(&self, plan: SamplingPlanId) -> bool {
        self.named_sampling1 == Some(plan) || self.named_sampling2 == Some(plan)
    }

    pub fn measurement_list(&self) -> Vec<Measurement> {
        decode_measurements(&self.measurements)
    }

    pub fn set_measurement_list(&mut self, list: &[Measurement]) {
        self.measurements = encode_measurements(list);
    }
}

type ActionCache = HashMap<(GroupId, i32), HashMap<PhaseId, ActionId>>;

/// A longitudinal experiment definition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Study {
    pub study_id: String,
    pub title: String,
    pub notes: Option<String>,
    /// `key=value;` encoded study metadata, see [`crate::common::codecs`].
    #[serde(default)]
    pub serialized_metadata: String,
    /// Space/comma-delimited user name lists (legacy wire format).
    #[serde(default)]
    pub admin_users: String,
    #[serde(default)]
    pub expert_users: String,
    /// Blind users, each prefixed `1#` (blind to everything) or `0#`
    /// (blind to treatment details only).
    #[serde(default)]
    pub blind_users: String,
    /// Absolute date of the phase closest to day 1.
    pub starting_date: Option<NaiveDate>,
    pub phase_format: PhaseFormat,
    pub created_at: Option<NaiveDateTime>,
    pub last_updated: Option<NaiveDateTime>,

    groups: Vec<Group>,
    phases: Vec<Phase>,
    named_treatments: Vec<NamedTreatment>,
    named_samplings: Vec<NamedSampling>,
    actions: Vec<StudyAction>,
    participants: Vec<AttachedBiosample>,
    next_id: i32,

    #[serde(skip)]
    action_cache: RefCell<Option<ActionCache>>,
}

impl Study {
    pub fn new(study_id: &str) -> Self {
        Study {
            study_id: study_id.to_string(),
            title: String::new(),
            notes: None,
            serialized_metadata: String::new(),
            admin_users: String::new(),
            expert_users: String::new(),
            blind_users: String::new(),
            starting_date: None,
            phase_format: PhaseFormat::default(),
            created_at: None,
            last_updated: None,
            groups: Vec::new(),
            phases: Vec::new(),
            named_treatments: Vec::new(),
            named_samplings: Vec::new(),
            actions: Vec::new(),
            participants: Vec::new(),
            next_id: 1,
            action_cache: RefCell::new(None),
        }
    }

    /// Create a study with application defaults applied.
    pub fn from_config(config: &Config, study_id: &str) -> Self {
        let mut study = Study::new(study_id);
        study.phase_format = config.default_phase_format;
        study
    }

    fn next_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Drop the memoized action lookup; it is rebuilt on the next read.
    /// Every structural mutator calls this, the method is public as the
    /// manual escape hatch after direct collection edits.
    pub fn reset_cache(&self) {
        *self.action_cache.borrow_mut() = None;
    }

    // ---- phases -----------------------------------------------------------

    /// Add a phase named `name`, stamped with the study's phase format.
    pub fn add_phase(&mut self, name: &str) -> PhaseId {
        let id = PhaseId(self.next_id());
        self.phases.push(Phase::new(id, name, self.phase_format));
        self.reset_cache();
        id
    }

    pub fn phase(&self, id: PhaseId) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id == id)
    }

    pub fn phase_mut(&mut self, id: PhaseId) -> Option<&mut Phase> {
        self.phases.iter_mut().find(|p| p.id == id)
    }

    /// All phases in schedule order.
    pub fn phases(&self) -> Vec<&Phase> {
        let mut phases: Vec<&Phase> = self.phases.iter().collect();
        phases.sort();
        phases
    }

    /// Remove a phase: clears any group lineage split at it, deletes the
    /// actions scheduled for it and invalidates the lookup cache.
    pub fn remove_phase(&mut self, id: PhaseId) -> SpiritResult<()> {
        if self.phase(id).is_none() {
            return Err(not_found!("phase", id));
        }
        for group in &mut self.groups {
            if group.from_phase == Some(id) {
                group.from_phase = None;
            }
        }
        self.phases.retain(|p| p.id != id);
        self.actions.retain(|a| a.phase != id);
        self.reset_cache();
        Ok(())
    }

    /// Absolute date of a phase: the starting date shifted by `days - 1`,
    /// with the clock set to the phase's hours/minutes. `None` for the
    /// number format or when the study has no starting date.
    pub fn phase_absolute_date(&self, id: PhaseId) -> Option<NaiveDateTime> {
        let phase = self.phase(id)?;
        if phase.format != PhaseFormat::DayMinutes {
            return None;
        }
        let start = self.starting_date?;
        let (days, hours, minutes) = phase.schedule();
        let total_minutes = hours * 60 + minutes;
        let date = start + chrono::Duration::days(i64::from(days - 1 + total_minutes / (24 * 60)));
        let remainder = total_minutes % (24 * 60);
        #[allow(clippy::cast_sign_loss)]
        date.and_hms_opt((remainder / 60) as u32, (remainder % 60) as u32, 0)
    }

    // ---- groups -----------------------------------------------------------

    pub fn add_group(&mut self, name: &str) -> GroupId {
        let id = GroupId(self.next_id());
        self.groups.push(Group::new(id, name));
        self.reset_cache();
        id
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Remove a group: detaches child lineage, deletes its actions, clears
    /// participant assignments to it.
    pub fn remove_group(&mut self, id: GroupId) -> SpiritResult<()> {
        if self.group(id).is_none() {
            return Err(not_found!("group", id));
        }
        for group in &mut self.groups {
            if group.from_group == Some(id) {
                group.from_group = None;
                group.from_phase = None;
            }
        }
        self.groups.retain(|g| g.id != id);
        self.actions.retain(|a| a.group != id);
        for participant in &mut self.participants {
            if participant.group == Some(id) {
                participant.group = None;
                participant.subgroup = 0;
            }
        }
        self.reset_cache();
        Ok(())
    }

    /// Record that `group` was split off `from` at a phase, or clear the
    /// lineage with `None`. Rejects lineage cycles.
    pub fn set_group_lineage(
        &mut self,
        group: GroupId,
        from: Option<(GroupId, PhaseId)>,
    ) -> SpiritResult<()> {
        if self.group(group).is_none() {
            return Err(not_found!("group", group));
        }
        if let Some((from_group, from_phase)) = from {
            if self.group(from_group).is_none() {
                return Err(not_found!("group", from_group));
            }
            if self.phase(from_phase).is_none() {
                return Err(not_found!("phase", from_phase));
            }
            // Walk up from the new parent; reaching `group` again would
            // close a cycle.
            let mut current = Some(from_group);
            while let Some(ancestor) = current {
                if ancestor == group {
                    return Err(rule_violation!(
                        "group-lineage",
                        "group lineage must not contain cycles"
                    ));
                }
                current = self.group(ancestor).and_then(|g| g.from_group);
            }
            let g = self.group_mut(group).ok_or_else(|| not_found!("group", group))?;
            g.from_group = Some(from_group);
            g.from_phase = Some(from_phase);
        } else {
            let g = self.group_mut(group).ok_or_else(|| not_found!("group", group))?;
            g.from_group = None;
            g.from_phase = None;
        }
        Ok(())
    }

    /// Number of animals still in `group` at `phase`: the configured total
    /// minus the animals that moved into child groups split off at or
    /// before that phase.
    pub fn group_animals_at_phase(&self, group: GroupId, phase: PhaseId) -> SpiritResult<i32> {
        let g = self.group(group).ok_or_else(|| not_found!("group", group))?;
        let p = self.phase(phase).ok_or_else(|| not_found!("phase", phase))?;
        let mut count = g.n_animals();
        for child in &self.groups {
            if child.from_group != Some(group) {
                continue;
            }
            let Some(split_phase) = child.from_phase.and_then(|id| self.phase(id)) else {
                continue;
            };
            if split_phase.time_minutes() <= p.time_minutes() {
                count -= child.n_animals();
            }
        }
        Ok(count)
    }

    /// Append a zero-sized subgroup and duplicate the actions of the last
    /// existing subgroup into it (same phase/treatment/sampling content,
    /// fresh action records).
    pub fn add_subgroup(&mut self, group: GroupId) -> SpiritResult<()> {
        let g = self.group(group).ok_or_else(|| not_found!("group", group))?;
        let mut sizes = g.subgroup_sizes();
        let old_count = sizes.len();
        sizes.push(0);

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let new_index = old_count as i32;
        let templates: Vec<StudyAction> = if old_count > 0 {
            self.actions
                .iter()
                .filter(|a| a.group == group && a.subgroup == new_index - 1)
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        for template in templates {
            let id = ActionId(self.next_id());
            self.actions.push(StudyAction {
                id,
                subgroup: new_index,
                ..template
            });
        }
        self.group_mut(group)
            .ok_or_else(|| not_found!("group", group))?
            .set_subgroup_sizes(&sizes);
        self.reset_cache();
        Ok(())
    }

    /// Remove subgroup `index` of `group`. Fails while participants are
    /// still attached to it; otherwise compacts the size array, deletes the
    /// subgroup's actions and renumbers everything above `index`.
    pub fn remove_subgroup(&mut self, group: GroupId, index: usize) -> SpiritResult<()> {
        let g = self.group(group).ok_or_else(|| not_found!("group", group))?;
        let mut sizes = g.subgroup_sizes();
        if index >= sizes.len() {
            return Err(validation_error!("subgroup", "index out of range"));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let subgroup = index as i32;
        let attached = self
            .participants
            .iter()
            .any(|p| p.group == Some(group) && p.subgroup == subgroup);
        if attached {
            return Err(validation_error!(
                "subgroup",
                "biosamples are attached to this subgroup"
            ));
        }

        sizes.remove(index);
        self.actions
            .retain(|a| !(a.group == group && a.subgroup == subgroup));
        for action in &mut self.actions {
            if action.group == group && action.subgroup > subgroup {
                action.subgroup -= 1;
            }
        }
        for participant in &mut self.participants {
            if participant.group == Some(group) && participant.subgroup > subgroup {
                participant.subgroup -= 1;
            }
        }
        self.group_mut(group)
            .ok_or_else(|| not_found!("group", group))?
            .set_subgroup_sizes(&sizes);
        self.reset_cache();
        Ok(())
    }

    /// Swap subgroup `index` with `index - 1`: sizes, action indices and
    /// participant assignments move together.
    pub fn move_subgroup_up(&mut self, group: GroupId, index: usize) -> SpiritResult<()> {
        let g = self.group(group).ok_or_else(|| not_found!("group", group))?;
        let mut sizes = g.subgroup_sizes();
        if index == 0 || index >= sizes.len() {
            return Err(validation_error!("subgroup", "index out of range"));
        }
        sizes.swap(index - 1, index);
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let subgroup = index as i32;
        for action in &mut self.actions {
            if action.group == group {
                if action.subgroup == subgroup {
                    action.subgroup = subgroup - 1;
                } else if action.subgroup == subgroup - 1 {
                    action.subgroup = subgroup;
                }
            }
        }
        for participant in &mut self.participants {
            if participant.group == Some(group) {
                if participant.subgroup == subgroup {
                    participant.subgroup = subgroup - 1;
                } else if participant.subgroup == subgroup - 1 {
                    participant.subgroup = subgroup;
                }
            }
        }
        self.group_mut(group)
            .ok_or_else(|| not_found!("group", group))?
            .set_subgroup_sizes(&sizes);
        self.reset_cache();
        Ok(())
    }

    /// Phase at which a subgroup ends: the earliest phase (in schedule
    /// order) whose action carries a necropsy-flagged sampling plan.
    pub fn end_phase(&self, group: GroupId, subgroup: i32) -> Option<&Phase> {
        self.study_actions_for(group, subgroup)
            .into_iter()
            .filter(|action| {
                [action.named_sampling1, action.named_sampling2]
                    .into_iter()
                    .flatten()
                    .any(|plan| self.named_sampling(plan).is_some_and(|ns| ns.necropsy))
            })
            .filter_map(|action| self.phase(action.phase))
            .min()
    }

    // ---- named treatments and sampling plans ------------------------------

    pub fn add_named_treatment(&mut self, name: &str) -> TreatmentId {
        let id = TreatmentId(self.next_id());
        self.named_treatments.push(NamedTreatment::new(id, name));
        id
    }

    pub fn named_treatment(&self, id: TreatmentId) -> Option<&NamedTreatment> {
        self.named_treatments.iter().find(|t| t.id == id)
    }

    pub fn named_treatment_mut(&mut self, id: TreatmentId) -> Option<&mut NamedTreatment> {
        self.named_treatments.iter_mut().find(|t| t.id == id)
    }

    pub fn named_treatments(&self) -> &[NamedTreatment] {
        &self.named_treatments
    }

    /// Remove a treatment definition and clear it from every action.
    pub fn remove_named_treatment(&mut self, id: TreatmentId) -> SpiritResult<()> {
        if self.named_treatment(id).is_none() {
            return Err(not_found!("treatment", id));
        }
        self.named_treatments.retain(|t| t.id != id);
        for action in &mut self.actions {
            if action.named_treatment == Some(id) {
                action.named_treatment = None;
            }
        }
        self.reset_cache();
        Ok(())
    }

    pub fn add_named_sampling(&mut self, name: &str) -> SamplingPlanId {
        let id = SamplingPlanId(self.next_id());
        self.named_samplings.push(NamedSampling::new(id, name));
        id
    }

    pub fn named_sampling(&self, id: SamplingPlanId) -> Option<&NamedSampling> {
        self.named_samplings.iter().find(|s| s.id == id)
    }

    pub fn named_sampling_mut(&mut self, id: SamplingPlanId) -> Option<&mut NamedSampling> {
        self.named_samplings.iter_mut().find(|s| s.id == id)
    }

    pub fn named_samplings(&self) -> &[NamedSampling] {
        &self.named_samplings
    }

    /// Remove a sampling plan and unassign it from every action, keeping
    /// the slot-1-first invariant.
    pub fn remove_named_sampling(&mut self, id: SamplingPlanId) -> SpiritResult<()> {
        if self.named_sampling(id).is_none() {
            return Err(not_found!("sampling plan", id));
        }
        self.named_samplings.retain(|s| s.id != id);
        for action in &mut self.actions {
            if action.named_sampling1 == Some(id) {
                action.named_sampling1 = action.named_sampling2.take();
            } else if action.named_sampling2 == Some(id) {
                action.named_sampling2 = None;
            }
        }
        self.reset_cache();
        Ok(())
    }

    // ---- participants -----------------------------------------------------

    pub fn participants(&self) -> &[AttachedBiosample] {
        &self.participants
    }

    pub fn attach_participant(&mut self, participant: AttachedBiosample) {
        self.participants.push(participant);
    }

    pub fn detach_participant(&mut self, no: i32) {
        self.participants.retain(|p| p.no != no);
    }

    // ---- action lookup ----------------------------------------------------

    pub fn actions(&self) -> &[StudyAction] {
        &self.actions
    }

    pub fn action(&self, id: ActionId) -> Option<&StudyAction> {
        self.actions.iter().find(|a| a.id == id)
    }

    fn action_mut(&mut self, id: ActionId) -> Option<&mut StudyAction> {
        self.actions.iter_mut().find(|a| a.id == id)
    }

    /// Rebuild the lookup map if it was invalidated. Actions whose group or
    /// phase no longer resolves (integrity anomalies in historical data)
    /// are skipped with a warning, never fatal.
    fn ensure_cache(&self) {
        let mut cache = self.action_cache.borrow_mut();
        if cache.is_some() {
            return;
        }
        let mut map: ActionCache = HashMap::new();
        for action in &self.actions {
            if self.group(action.group).is_none() || self.phase(action.phase).is_none() {
                tracing::warn!(
                    action = action.id.0,
                    "skipping action with dangling group or phase reference"
                );
                continue;
            }
            map.entry((action.group, action.subgroup))
                .or_default()
                .insert(action.phase, action.id);
        }
        *cache = Some(map);
    }

    fn lookup_action(&self, group: GroupId, subgroup: i32, phase: PhaseId) -> Option<ActionId> {
        self.ensure_cache();
        self.action_cache
            .borrow()
            .as_ref()
            .and_then(|cache| cache.get(&(group, subgroup)))
            .and_then(|by_phase| by_phase.get(&phase))
            .copied()
    }

    /// The action scheduled for (group, subgroup, phase), if any.
    pub fn study_action(
        &self,
        group: GroupId,
        subgroup: i32,
        phase: PhaseId,
    ) -> Option<&StudyAction> {
        let id = self.lookup_action(group, subgroup, phase)?;
        self.action(id)
    }

    /// All actions of a subgroup, in phase order.
    pub fn study_actions_for(&self, group: GroupId, subgroup: i32) -> Vec<&StudyAction> {
        self.ensure_cache();
        let ids: Vec<ActionId> = self
            .action_cache
            .borrow()
            .as_ref()
            .and_then(|cache| cache.get(&(group, subgroup)))
            .map(|by_phase| by_phase.values().copied().collect())
            .unwrap_or_default();
        let mut actions: Vec<&StudyAction> = ids.iter().filter_map(|id| self.action(*id)).collect();
        actions.sort_by(|a, b| {
            let pa = self.phase(a.phase);
            let pb = self.phase(b.phase);
            pa.cmp(&pb).then(a.id.cmp(&b.id))
        });
        actions
    }

    /// All actions scheduled at a phase, ordered by (group, subgroup).
    pub fn study_actions_at(&self, phase: PhaseId) -> Vec<&StudyAction> {
        self.ensure_cache();
        let mut ids: Vec<ActionId> = Vec::new();
        if let Some(cache) = self.action_cache.borrow().as_ref() {
            for by_phase in cache.values() {
                if let Some(id) = by_phase.get(&phase) {
                    ids.push(*id);
                }
            }
        }
        let mut actions: Vec<&StudyAction> = ids.iter().filter_map(|id| self.action(*id)).collect();
        actions.sort_by_key(|a| (a.group, a.subgroup));
        actions
    }

    /// Look up the action for the key, creating an empty one when absent.
    /// Creation invalidates the cache; callers must re-read through the
    /// accessors rather than hold on to prior lookups.
    pub fn get_or_create_study_action(
        &mut self,
        group: GroupId,
        subgroup: i32,
        phase: PhaseId,
    ) -> SpiritResult<ActionId> {
        let g = self.group(group).ok_or_else(|| not_found!("group", group))?;
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let n_subgroups = g.n_subgroups() as i32;
        if subgroup < 0 || subgroup >= n_subgroups {
            return Err(validation_error!("subgroup", "index out of range"));
        }
        if self.phase(phase).is_none() {
            return Err(not_found!("phase", phase));
        }
        if let Some(id) = self.lookup_action(group, subgroup, phase) {
            return Ok(id);
        }
        let id = ActionId(self.next_id());
        self.actions.push(StudyAction::new(id, group, subgroup, phase));
        self.reset_cache();
        Ok(id)
    }

    /// Resolve the action that applies to a participant at a phase. For
    /// phases before the participant's group was split off, the participant
    /// is treated as still belonging to the ancestor group at subgroup 0.
    pub fn study_action_for_sample(
        &self,
        phase: PhaseId,
        sample: &AttachedBiosample,
    ) -> Option<&StudyAction> {
        let p = self.phase(phase)?;
        let mut group = sample.group?;
        let mut subgroup = sample.subgroup;
        // Bounded walk: lineage cycles are rejected at mutation time, the
        // bound protects against corrupted historical data.
        for _ in 0..=self.groups.len() {
            let g = self.group(group)?;
            let parent = match (g.from_group, g.from_phase) {
                (Some(parent), Some(from_phase))
                    if self
                        .phase(from_phase)
                        .is_some_and(|fp| fp.time_minutes() > p.time_minutes()) =>
                {
                    parent
                }
                _ => break,
            };
            group = parent;
            subgroup = 0;
        }
        self.study_action(group, subgroup, phase)
    }

    /// Earliest phase (in schedule order) with a treatment scheduled for
    /// the subgroup.
    pub fn first_treatment_phase(&self, group: GroupId, subgroup: i32) -> Option<&Phase> {
        self.study_actions_for(group, subgroup)
            .into_iter()
            .filter(|a| a.named_treatment.is_some())
            .filter_map(|a| self.phase(a.phase))
            .min()
    }

    // ---- assignment mutators ----------------------------------------------

    /// Assign (`set = true`) or clear (`set = false`) a treatment on the
    /// (group, subgroup, phase) action. Clearing never creates an action.
    pub fn set_named_treatment(
        &mut self,
        group: GroupId,
        subgroup: i32,
        phase: PhaseId,
        treatment: TreatmentId,
        set: bool,
    ) -> SpiritResult<()> {
        if self.named_treatment(treatment).is_none() {
            return Err(not_found!("treatment", treatment));
        }
        if set {
            let id = self.get_or_create_study_action(group, subgroup, phase)?;
            let action = self.action_mut(id).ok_or_else(|| not_found!("action", id))?;
            action.named_treatment = Some(treatment);
        } else if let Some(id) = self.lookup_action(group, subgroup, phase) {
            let action = self.action_mut(id).ok_or_else(|| not_found!("action", id))?;
            if action.named_treatment == Some(treatment) {
                action.named_treatment = None;
            }
        }
        Ok(())
    }

    /// Assign or unassign a sampling plan on the (group, subgroup, phase)
    /// action. An action holds at most two plans; assigning a third fails.
    /// Unassigning compacts slot 2 into slot 1, and a request that is
    /// already satisfied is a no-op that creates no empty action.
    pub fn set_named_sampling(
        &mut self,
        group: GroupId,
        subgroup: i32,
        phase: PhaseId,
        plan: SamplingPlanId,
        set: bool,
    ) -> SpiritResult<()> {
        if self.named_sampling(plan).is_none() {
            return Err(not_found!("sampling plan", plan));
        }
        let existing = self.lookup_action(group, subgroup, phase);

        if set {
            if let Some(id) = existing {
                let action = self.action(id).ok_or_else(|| not_found!("action", id))?;
                if action.has_sampling(plan) {
                    return Ok(());
                }
                if action.named_sampling1.is_some() && action.named_sampling2.is_some() {
                    return Err(rule_violation!(
                        "two-samplings",
                        "an action holds at most two sampling plans"
                    ));
                }
            }
            let id = match existing {
                Some(id) => id,
                None => self.get_or_create_study_action(group, subgroup, phase)?,
            };
            let action = self.action_mut(id).ok_or_else(|| not_found!("action", id))?;
            if action.named_sampling1.is_none() {
                action.named_sampling1 = Some(plan);
            } else {
                action.named_sampling2 = Some(plan);
            }
        } else if let Some(id) = existing {
            let action = self.action_mut(id).ok_or_else(|| not_found!("action", id))?;
            if action.named_sampling1 == Some(plan) {
                action.named_sampling1 = action.named_sampling2.take();
            } else if action.named_sampling2 == Some(plan) {
                action.named_sampling2 = None;
            }
        }
        Ok(())
    }

    // ---- users and metadata -----------------------------------------------

    pub fn metadata_map(&self) -> std::collections::BTreeMap<String, String> {
        decode_metadata(&self.serialized_metadata)
    }

    pub fn set_metadata_map(&mut self, map: &std::collections::BTreeMap<String, String>) {
        self.serialized_metadata = encode_metadata(map);
    }

    pub fn admin_users_set(&self) -> BTreeSet<String> {
        decode_user_list(&self.admin_users)
    }

    pub fn expert_users_set(&self) -> BTreeSet<String> {
        decode_user_list(&self.expert_users)
    }

    /// Users blind to all group information (`1#` prefix).
    pub fn blind_all_users(&self) -> BTreeSet<String> {
        decode_user_list(&self.blind_users)
            .into_iter()
            .filter_map(|token| token.strip_prefix(BLIND_ALL_PREFIX).map(ToString::to_string))
            .collect()
    }

    /// Users blind to treatment details only (`0#` prefix). Unprefixed
    /// legacy entries are treated as details-blind.
    pub fn blind_details_users(&self) -> BTreeSet<String> {
        decode_user_list(&self.blind_users)
            .into_iter()
            .filter(|token| !token.starts_with(BLIND_ALL_PREFIX))
            .map(|token| {
                token
                    .strip_prefix(BLIND_DETAILS_PREFIX)
                    .map_or(token.clone(), ToString::to_string)
            })
            .collect()
    }

    pub fn is_blind_all(&self, user: &str) -> bool {
        self.blind_all_users().contains(user)
    }

    pub fn is_blind_details(&self, user: &str) -> bool {
        self.blind_details_users().contains(user)
    }
}
