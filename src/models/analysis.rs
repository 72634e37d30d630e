use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mass of one component including all of its symmetric copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMass {
    pub component_id: String,
    pub mass_g: f64,
    pub copies: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MassProperties {
    pub total_mass_g: f64,
    /// Mass-weighted centroid in placement coordinates (mm).
    pub center_of_mass: Point,
    pub components: Vec<ComponentMass>,
}

/// Stability verdict for a margin expressed in calibers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityClass {
    Stable,
    Marginal,
    Unstable,
}

impl StabilityClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Marginal => "marginal",
            Self::Unstable => "unstable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StabilityAnalysis {
    pub center_of_pressure_mm: f64,
    pub center_of_gravity_mm: f64,
    pub reference_diameter_mm: f64,
    pub margin_calibers: f64,
    pub classification: StabilityClass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub drag_coefficient: f64,
    pub estimated_height_m: f64,
}

/// Everything the aggregator derives from a design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignAnalysis {
    pub mass: MassProperties,
    pub stability: StabilityAnalysis,
    pub performance: PerformanceMetrics,
}
