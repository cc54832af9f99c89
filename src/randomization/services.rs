//! Group assignment for a randomization session

use super::models::Randomization;
use crate::groups::models::Group;
use rand::Rng;
use rand::seq::SliceRandom;

/// Shuffle the subjects and deal them into the given groups in order,
/// filling each subgroup up to its configured size. Subjects left over once
/// every subgroup is full stay unassigned.
pub fn assign_groups<R: Rng + ?Sized>(
    randomization: &mut Randomization,
    groups: &[&Group],
    rng: &mut R,
) {
    randomization.samples_mut().shuffle(rng);

    let mut slots = Vec::new();
    for group in groups {
        for (subgroup, size) in group.subgroup_sizes().iter().enumerate() {
            for _ in 0..*size {
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                slots.push((group.id, subgroup as i32));
            }
        }
    }

    let mut slots = slots.into_iter();
    for sample in randomization.samples_mut() {
        if let Some((group, subgroup)) = slots.next() {
            sample.group = Some(group);
            sample.subgroup = subgroup;
        } else {
            sample.group = None;
            sample.subgroup = 0;
        }
    }
}
