use kurbo::Point;
use serde::{Deserialize, Serialize};

use super::material::{CuttingMethod, Material};

/// A physical part cut from sheet stock and attached to one section.
///
/// References to sections and other components are by id within the owning
/// design; the design graph checks that they resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ComponentType,
    pub section_id: String,
    /// Falls back to the design's default material when absent.
    #[serde(default)]
    pub material: Option<Material>,
    pub thickness_mm: f64,
    /// Doubled parts are laminated from two sheets.
    #[serde(default)]
    pub doubled: bool,
    /// Falls back to the design's default cutting method when absent.
    #[serde(default)]
    pub cutting_method: Option<CuttingMethod>,
    /// Closed outline, one cubic segment between each consecutive pair.
    pub outline: Vec<BezierControlPoint>,
    #[serde(default)]
    pub placement: Placement,
    #[serde(default)]
    pub symmetry: Symmetry,
    #[serde(default)]
    pub linked_components: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Shroud,
    Bulkhead,
    Spar,
    Fin,
    Support,
}

impl ComponentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shroud => "shroud",
            Self::Bulkhead => "bulkhead",
            Self::Spar => "spar",
            Self::Fin => "fin",
            Self::Support => "support",
        }
    }
}

/// One vertex of a piecewise-cubic outline.
///
/// Handles are absolute coordinates. A missing handle collapses onto the
/// point itself, which makes the adjoining segment a straight line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BezierControlPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_in: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_out: Option<Point>,
}

impl BezierControlPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            handle_in: None,
            handle_out: None,
        }
    }

    pub fn with_handles(mut self, handle_in: Option<Point>, handle_out: Option<Point>) -> Self {
        self.handle_in = handle_in;
        self.handle_out = handle_out;
        self
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Where a part sits on the assembled rocket.
///
/// `x` runs along the body axis from the nose tip, `y` is radial. Both are mm
/// at scale 1; rotation is in degrees about the part's own origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub rotation_deg: f64,
}

/// How many copies of a part are cut and how they are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symmetry {
    pub enabled: bool,
    pub count: u32,
    #[serde(default)]
    pub axis: SymmetryAxis,
}

impl Default for Symmetry {
    fn default() -> Self {
        Self {
            enabled: false,
            count: 1,
            axis: SymmetryAxis::Z,
        }
    }
}

impl Symmetry {
    pub fn radial(count: u32) -> Self {
        Self {
            enabled: true,
            count,
            axis: SymmetryAxis::Z,
        }
    }

    /// Number of physical copies this setting produces.
    pub fn copies(&self) -> u32 {
        if self.enabled {
            self.count.max(1)
        } else {
            1
        }
    }
}

/// Replication axis.
///
/// `Z` is the body axis, perpendicular to the cutting sheet: copies are
/// rotated evenly around the origin. `X` and `Y` alternate plain and mirrored
/// copies across that axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymmetryAxis {
    X,
    Y,
    #[default]
    Z,
}
