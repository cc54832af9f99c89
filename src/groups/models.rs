//! Groups: the cohorts of a study
//!
//! A group is split into subgroups (indexed 0..n) whose sizes are kept in
//! the legacy comma-separated `subgroup_size_flat` wire field. A group may
//! record that it was split off another group at a given phase through the
//! `from_group`/`from_phase` lineage pointers; the cycle guard for that
//! lineage lives on [`crate::studies::models::Study`], which owns all
//! groups.

use crate::common::codecs::{decode_int_csv, encode_int_csv};
use crate::common::models::{GroupId, PhaseId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fallback display color for groups without an assigned color.
const DEFAULT_COLOR_RGB: i32 = 0x99_99_99;

/// Luminance floor below which a group color is lightened for display.
const LUMINANCE_FLOOR: f64 = 120.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub description: Option<String>,
    pub color_rgb: Option<i32>,
    /// Comma-separated subgroup sizes, e.g. `"5,5"`.
    #[serde(default)]
    pub subgroup_size_flat: String,
    /// Group this one was split off, if any.
    pub from_group: Option<GroupId>,
    /// Phase at which the split happened.
    pub from_phase: Option<PhaseId>,
}

impl Group {
    pub fn new(id: GroupId, name: &str) -> Self {
        Group {
            id,
            name: name.to_string(),
            description: None,
            color_rgb: None,
            subgroup_size_flat: String::new(),
            from_group: None,
            from_phase: None,
        }
    }

    /// The token before the first space, used as the compact display name.
    pub fn short_name(&self) -> &str {
        self.name.split(' ').next().unwrap_or("")
    }

    pub fn subgroup_sizes(&self) -> Vec<i32> {
        decode_int_csv(&self.subgroup_size_flat)
    }

    pub fn set_subgroup_sizes(&mut self, sizes: &[i32]) {
        self.subgroup_size_flat = encode_int_csv(sizes);
    }

    pub fn n_subgroups(&self) -> usize {
        self.subgroup_sizes().len()
    }

    /// Size of subgroup `index`, 0 when the index is out of range.
    pub fn subgroup_size(&self, index: usize) -> i32 {
        self.subgroup_sizes().get(index).copied().unwrap_or(0)
    }

    /// Total number of animals over all subgroups.
    pub fn n_animals(&self) -> i32 {
        self.subgroup_sizes().iter().sum()
    }

    /// Display color, lightened when the configured color is too dark to
    /// carry black text.
    pub fn display_color_rgb(&self) -> i32 {
        lighten(self.color_rgb.unwrap_or(DEFAULT_COLOR_RGB))
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Blend a color toward white until it reaches the luminance floor.
fn lighten(rgb: i32) -> i32 {
    let mut r = f64::from((rgb >> 16) & 0xFF);
    let mut g = f64::from((rgb >> 8) & 0xFF);
    let mut b = f64::from(rgb & 0xFF);
    let mut rounds = 0;
    while luminance(r, g, b) < LUMINANCE_FLOOR && rounds < 10 {
        r += (255.0 - r) * 0.3;
        g += (255.0 - g) * 0.3;
        b += (255.0 - b) * 0.3;
        rounds += 1;
    }
    #[allow(clippy::cast_possible_truncation)]
    let (r, g, b) = (r.round() as i32, g.round() as i32, b.round() as i32);
    (r.min(255) << 16) | (g.min(255) << 8) | b.min(255)
}

fn luminance(r: f64, g: f64, b: f64) -> f64 {
    0.299 * r + 0.587 * g + 0.114 * b
}
