//! Name and colour tables handed to the renderer.

use std::ops::RangeInclusive;

use ratatui::style::Color;
use shm_bridge::layout::{ACTION_SLOTS, ACTIVE_ACTIONS};

use crate::state::scoring::{self, ScoreScales};

/// Names of the writer's mutation operators, by action slot.
pub const ACTION_NAMES: [&str; ACTIVE_ACTIONS] = [
    "Dist 1 Swap",
    "Dist 2 Swap",
    "Global Swap",
    "Rand Cell",
    "Domino Local",
    "Domino Global",
    "Tri Rotate",
    "Straight Slide",
    "Worm Slide",
    "Block Rotate",
    "Heatmap Swap",
    "Heatmap Domino",
    "Heatmap Mutate",
    "Var Blk Swap",
    "Var Blk Flip",
];

/// Board cell colours, indexed by `digit % 10`.
pub const BOARD_PALETTE: [Color; 10] = [
    Color::DarkGray,
    Color::LightRed,
    Color::LightGreen,
    Color::LightYellow,
    Color::LightBlue,
    Color::LightMagenta,
    Color::LightCyan,
    Color::White,
    Color::Rgb(255, 175, 0),
    Color::Rgb(215, 175, 255),
];

/// A contiguous group of action slots drawn in one colour.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub name: &'static str,
    pub slots: RangeInclusive<usize>,
    pub color: Color,
}

/// Immutable lookup data for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    action_names: Vec<String>,
    pub palette: [Color; 10],
    pub bands: Vec<Band>,
    pub scales: ScoreScales,
}

impl RenderConfig {
    /// Default tables with score scales for `basis_max_range`.
    pub fn new(basis_max_range: u32) -> Self {
        Self {
            action_names: ACTION_NAMES.iter().map(|n| n.to_string()).collect(),
            palette: BOARD_PALETTE,
            bands: vec![
                Band { name: "micro", slots: 0..=3, color: Color::LightCyan },
                Band { name: "meso", slots: 4..=12, color: Color::LightGreen },
                Band { name: "macro", slots: 13..=14, color: Color::LightRed },
            ],
            scales: ScoreScales::new(basis_max_range),
        }
    }

    /// Replaces the leading action names with `names`.
    pub fn with_action_names(mut self, names: &[String]) -> Self {
        for (slot, name) in names.iter().take(ACTION_SLOTS).enumerate() {
            match self.action_names.get_mut(slot) {
                Some(existing) => *existing = name.clone(),
                None => self.action_names.push(name.clone()),
            }
        }
        self
    }

    /// Name of action `slot`, `"N/A"` for slots without one.
    pub fn action_name(&self, slot: usize) -> &str {
        self.action_names.get(slot).map_or("N/A", String::as_str)
    }

    /// Colour of a board cell holding `value`.
    pub fn cell_color(&self, value: i32) -> Color {
        self.palette[value.rem_euclid(self.palette.len() as i32) as usize]
    }

    /// Band containing action `slot`.
    pub fn band(&self, slot: usize) -> Option<&Band> {
        self.bands.iter().find(|b| b.slots.contains(&slot))
    }

    /// Display name of scoring `mode`.
    pub fn mode_name(&self, mode: i32) -> String {
        scoring::mode_name(mode).map_or_else(|| format!("MODE {mode}"), str::to_string)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::new(13_000)
    }
}
