use super::models::{AttachedBiosample, Randomization};
use super::services::assign_groups;
use crate::common::models::GroupId;
use crate::groups::models::Group;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn session_with_two_samples() -> Randomization {
    let mut randomization = Randomization::new();
    randomization.set_n_animals(2).unwrap();
    {
        let samples = randomization.samples_mut();
        samples[0].sample_id = "S-001".to_string();
        samples[0].sample_name = Some("Rat 1".to_string());
        samples[0].weight = Some(251.5);
        samples[0].container_id = Some("CAGE-7".to_string());
        samples[0].group = Some(GroupId(3));
        samples[0].subgroup = 1;
        samples[0].data = vec![Some(1.5), None, Some(-2.0)];
        samples[1].sample_id = "S-002".to_string();
    }
    randomization
}

#[test]
fn test_version_1_round_trip_is_field_equal() {
    let original = session_with_two_samples();
    let text = original.serialize();
    assert!(text.starts_with("&1\n"));
    let restored = Randomization::deserialize(&text);
    assert_eq!(restored, original);
}

#[test]
fn test_version_1_wire_shape() {
    let original = session_with_two_samples();
    let text = original.serialize();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "&1");
    assert_eq!(lines[1], "1#Rat 1#251.5#S-001#3#CAGE-7#1#1.5##-2");
    assert_eq!(lines[2], "2###S-002###0");
}

#[test]
fn test_legacy_version_0_parse() {
    let text = "1;Rat 1;251.5;S-001;3;CAGE-7;1#2;;;S-002;;;0";
    let restored = Randomization::deserialize(text);
    assert_eq!(restored.n_animals(), 2);
    let first = &restored.samples()[0];
    assert_eq!(first.no, 1);
    assert_eq!(first.sample_name.as_deref(), Some("Rat 1"));
    assert_eq!(first.weight, Some(251.5));
    assert_eq!(first.sample_id, "S-001");
    assert_eq!(first.group, Some(GroupId(3)));
    assert_eq!(first.container_id.as_deref(), Some("CAGE-7"));
    assert_eq!(first.subgroup, 1);
    assert!(first.data.is_empty());
    assert_eq!(restored.samples()[1].sample_id, "S-002");
}

#[test]
fn test_deserialize_tolerates_garbage() {
    let restored = Randomization::deserialize("&1\nx#y#z#S-003#g#c#q#nan-ish");
    assert_eq!(restored.n_animals(), 1);
    let sample = &restored.samples()[0];
    assert_eq!(sample.no, 0);
    assert_eq!(sample.weight, None);
    assert_eq!(sample.sample_id, "S-003");
    assert_eq!(sample.group, Some(GroupId(0)));
    assert_eq!(sample.subgroup, 0);
    assert_eq!(sample.data, vec![None]);
}

#[test]
fn test_deserialize_empty() {
    assert_eq!(Randomization::deserialize("").n_animals(), 0);
    assert_eq!(Randomization::deserialize("&1").n_animals(), 0);
}

#[test]
fn test_grow_allocates_lowest_unused_numbers() {
    let mut randomization = Randomization::new();
    randomization.set_n_animals(3).unwrap();
    assert_eq!(
        randomization.samples().iter().map(|s| s.no).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    // Free slot 2, then grow again: 2 must be reused before 4
    randomization.samples_mut()[1].no = 9;
    randomization.set_n_animals(4).unwrap();
    assert_eq!(
        randomization.samples().iter().map(|s| s.no).collect::<Vec<_>>(),
        vec![1, 9, 3, 2]
    );
}

#[test]
fn test_shrink_over_entered_sample_fails() {
    let mut randomization = session_with_two_samples();
    let err = randomization.set_n_animals(1).unwrap_err();
    assert!(err.to_string().contains("S-002"));
    // Nothing was removed
    assert_eq!(randomization.n_animals(), 2);

    randomization.samples_mut()[1].sample_id.clear();
    randomization.set_n_animals(1).unwrap();
    assert_eq!(randomization.n_animals(), 1);
}

#[test]
fn test_assign_groups_fills_subgroups_in_order() {
    let mut randomization = Randomization::new();
    randomization.set_n_animals(5).unwrap();

    let mut g1 = Group::new(GroupId(1), "G1");
    g1.set_subgroup_sizes(&[2, 1]);
    let mut g2 = Group::new(GroupId(2), "G2");
    g2.set_subgroup_sizes(&[1]);

    let mut rng = StdRng::seed_from_u64(42);
    assign_groups(&mut randomization, &[&g1, &g2], &mut rng);

    let mut assigned: Vec<(Option<GroupId>, i32)> = randomization
        .samples()
        .iter()
        .map(|s| (s.group, s.subgroup))
        .collect();
    assigned.sort_by_key(|(g, sub)| (g.map(|g| g.0), *sub));
    assert_eq!(
        assigned,
        vec![
            (None, 0),
            (Some(GroupId(1)), 0),
            (Some(GroupId(1)), 0),
            (Some(GroupId(1)), 1),
            (Some(GroupId(2)), 0),
        ]
    );
}

#[test]
fn test_assign_groups_is_deterministic_for_a_seed() {
    let mut a = session_with_two_samples();
    let mut b = a.clone();
    let mut g1 = Group::new(GroupId(1), "G1");
    g1.set_subgroup_sizes(&[1]);

    let mut rng_a = StdRng::seed_from_u64(7);
    let mut rng_b = StdRng::seed_from_u64(7);
    assign_groups(&mut a, &[&g1], &mut rng_a);
    assign_groups(&mut b, &[&g1], &mut rng_b);
    assert_eq!(a, b);
}

#[test]
fn test_attached_biosample_defaults() {
    let sample = AttachedBiosample::new(4);
    assert_eq!(sample.no, 4);
    assert!(sample.sample_id.is_empty());
    assert_eq!(sample.group, None);
}
