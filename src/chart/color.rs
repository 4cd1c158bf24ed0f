//! Deterministic category-to-color assignment
//!
//! A fixed ordered palette is consumed in first-seen order per context, so
//! the same raw value renders with the same color across trellis panels
//! sharing that context. The service is instantiated per request/response
//! context; it must never live as process-wide state.

use std::hash::{DefaultHasher, Hash, Hasher};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

use crate::chart::group::EMPTY_LABEL;

/// Fixed color for the `ALL` sentinel category
pub const COLOR_ALL: &str = "#20B2AA";
/// Fixed color for the empty/missing marker
pub const COLOR_EMPTY: &str = "#808080";
/// Fixed color for boolean-style `Yes`
pub const COLOR_YES: &str = "#F7A35C";
/// Fixed color for boolean-style `No`
pub const COLOR_NO: &str = "#4F81BD";
/// Fixed color for a blank category label
pub const COLOR_BLANK: &str = "#B8D4F0";

/// The fixed ordered category palette
pub const CATEGORY_PALETTE: [&str; 20] = [
    "#4363D8", "#E6194B", "#3CB44B", "#FFE119", "#911EB4", "#46F0F0", "#F58231", "#F032E6",
    "#008080", "#9A6324", "#800000", "#808000", "#000075", "#A9A9A9", "#FABEBE", "#AAFFC3",
    "#FFD8B1", "#E6BEFF", "#BCF60C", "#FFFAC8",
];

/// Palette variant selected per chart domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaletteVariant {
    /// Full palette, cycled with wrap-around
    #[default]
    Standard,
    /// Palette restricted to hues passing [`is_valid_color`]; once
    /// exhausted, colors are generated procedurally under the same rule
    NoGreen,
}

#[derive(Debug, Default)]
struct ContextState {
    assigned: FxHashMap<String, String>,
    seen: usize,
}

/// Per-request color assignment service
///
/// The mapping cache is keyed by context; two contexts assign colors
/// independently, and the same (value, context) pair always resolves to
/// the same color within one service instance.
#[derive(Debug)]
pub struct ColoringService {
    variant: PaletteVariant,
    palette: Vec<String>,
    contexts: FxHashMap<String, ContextState>,
}

impl Default for ColoringService {
    fn default() -> Self {
        Self::new()
    }
}

impl ColoringService {
    /// Create a service over the standard palette
    #[must_use]
    pub fn new() -> Self {
        Self::with_variant(PaletteVariant::Standard)
    }

    /// Create a service over the given palette variant
    #[must_use]
    pub fn with_variant(variant: PaletteVariant) -> Self {
        let palette: Vec<String> = match variant {
            PaletteVariant::Standard => {
                CATEGORY_PALETTE.iter().map(ToString::to_string).collect()
            }
            PaletteVariant::NoGreen => CATEGORY_PALETTE
                .iter()
                .filter(|hex| parse_hex(hex).is_some_and(|(r, g, b)| is_valid_color(r, g, b)))
                .map(ToString::to_string)
                .collect(),
        };
        Self {
            variant,
            palette,
            contexts: FxHashMap::default(),
        }
    }

    /// The color for a category value within a grouping context
    pub fn color_for(&mut self, value: &str, context: &str) -> String {
        if let Some(fixed) = sentinel_color(value) {
            return fixed.to_string();
        }
        let state = self.contexts.entry(context.to_string()).or_default();
        if let Some(color) = state.assigned.get(value) {
            return color.clone();
        }
        let n = state.seen;
        state.seen += 1;
        let color = if n < self.palette.len() || self.variant == PaletteVariant::Standard {
            self.palette[n % self.palette.len()].clone()
        } else {
            generate_color(context, n)
        };
        state.assigned.insert(value.to_string(), color.clone());
        color
    }
}

/// Reserved sentinel values that override palette assignment
fn sentinel_color(value: &str) -> Option<&'static str> {
    if value == "ALL" {
        Some(COLOR_ALL)
    } else if value.is_empty() {
        Some(COLOR_BLANK)
    } else if value == EMPTY_LABEL {
        Some(COLOR_EMPTY)
    } else if value.eq_ignore_ascii_case("yes") {
        Some(COLOR_YES)
    } else if value.eq_ignore_ascii_case("no") {
        Some(COLOR_NO)
    } else {
        None
    }
}

/// Procedurally generate an acceptable color
///
/// Seeded from (context, position) so assignment stays deterministic per
/// context even beyond the fixed palette.
fn generate_color(context: &str, n: usize) -> String {
    let mut hasher = DefaultHasher::new();
    context.hash(&mut hasher);
    n.hash(&mut hasher);
    let mut rng = StdRng::seed_from_u64(hasher.finish());
    loop {
        let r: u8 = rng.random_range(0..=255);
        let g: u8 = rng.random_range(0..=255);
        let b: u8 = rng.random_range(0..=255);
        if is_valid_color(r, g, b) {
            return format!("#{r:02X}{g:02X}{b:02X}");
        }
    }
}

/// Whether a color is acceptable for restricted-palette charts
///
/// Rejects hues in the green band (~90–150°), the red band (<10° or
/// >350°), and near-white or very pale colors. Mid and dark grays pass:
/// with zero saturation there is no hue to reject.
#[must_use]
pub fn is_valid_color(r: u8, g: u8, b: u8) -> bool {
    let (h, s, l) = rgb_to_hsl(r, g, b);
    if l > 0.92 {
        return false;
    }
    if s < 0.2 && l > 0.8 {
        return false;
    }
    // Achromatic colors report hue 0; the band rules do not apply
    if s == 0.0 {
        return true;
    }
    if (90.0..=150.0).contains(&h) {
        return false;
    }
    if h < 10.0 || h > 350.0 {
        return false;
    }
    true
}

/// Parse a `#RRGGBB` hex color
fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Convert RGB to (hue in degrees, saturation, lightness)
fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let l = (max + min) / 2.0;
    if delta == 0.0 {
        return (0.0, 0.0, l);
    }
    let s = delta / (1.0 - (2.0 * l - 1.0).abs());
    let h = if (max - r).abs() < f64::EPSILON {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if (max - g).abs() < f64::EPSILON {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    (h, s, l)
}
