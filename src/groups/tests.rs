use super::models::Group;
use crate::common::models::GroupId;

fn group(name: &str, sizes: &str) -> Group {
    let mut g = Group::new(GroupId(1), name);
    g.subgroup_size_flat = sizes.to_string();
    g
}

#[test]
fn test_subgroup_sizes_and_animal_count() {
    let g = group("G1 control", "5,5");
    assert_eq!(g.n_subgroups(), 2);
    assert_eq!(g.subgroup_size(0), 5);
    assert_eq!(g.subgroup_size(1), 5);
    assert_eq!(g.n_animals(), 10);
}

#[test]
fn test_subgroup_size_out_of_range_is_zero() {
    let g = group("G1", "5,5");
    assert_eq!(g.subgroup_size(7), 0);
}

#[test]
fn test_no_subgroups() {
    let g = group("G1", "");
    assert_eq!(g.n_subgroups(), 0);
    assert_eq!(g.n_animals(), 0);
}

#[test]
fn test_set_subgroup_sizes_keeps_wire_format() {
    let mut g = group("G1", "");
    g.set_subgroup_sizes(&[3, 4]);
    assert_eq!(g.subgroup_size_flat, "3,4");
    assert_eq!(g.n_animals(), 7);
}

#[test]
fn test_short_name_is_token_before_first_space() {
    assert_eq!(group("G1 vehicle control", "").short_name(), "G1");
    assert_eq!(group("G1", "").short_name(), "G1");
}

#[test]
fn test_dark_color_is_lightened() {
    let mut g = group("G1", "");
    g.color_rgb = Some(0x00_00_00);
    let display = g.display_color_rgb();
    assert_ne!(display, 0x00_00_00);
    let r = (display >> 16) & 0xFF;
    let gr = (display >> 8) & 0xFF;
    let b = display & 0xFF;
    assert!(0.299 * f64::from(r) + 0.587 * f64::from(gr) + 0.114 * f64::from(b) >= 120.0);
}

#[test]
fn test_light_color_is_unchanged() {
    let mut g = group("G1", "");
    g.color_rgb = Some(0xFF_FF_CC);
    assert_eq!(g.display_color_rgb(), 0xFF_FF_CC);
}
