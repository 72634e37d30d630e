use serde::{Deserialize, Serialize};

/// Planform of a fin set, tied to the fin component that is cut for it.
///
/// The number of fins comes from the linked component's symmetry setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinDesign {
    pub id: String,
    pub component_id: String,
    pub section_id: String,
    pub planform: FinPlanform,
    /// Recomputed on every accepted mutation; ignored on input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aero: Option<FinAeroSummary>,
}

/// Trapezoidal fin planform, all lengths in mm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinPlanform {
    pub root_chord_mm: f64,
    pub tip_chord_mm: f64,
    pub span_mm: f64,
    /// Axial distance from root leading edge to tip leading edge.
    #[serde(default)]
    pub sweep_mm: f64,
    /// Axial station of the root leading edge, measured from the nose tip.
    pub station_mm: f64,
}

impl FinPlanform {
    pub fn area_mm2(&self) -> f64 {
        0.5 * (self.root_chord_mm + self.tip_chord_mm) * self.span_mm
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinAeroSummary {
    pub fin_count: u32,
    pub planform_area_mm2: f64,
    pub normal_force_coefficient: f64,
    pub center_of_pressure_mm: f64,
}
