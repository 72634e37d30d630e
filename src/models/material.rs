use serde::{Deserialize, Serialize};

/// Sheet stock a part can be cut from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    #[default]
    Cardstock,
    CorrugatedCardboard,
    FoamBoard,
    Balsa,
    BasswoodPlywood,
    Polystyrene,
}

impl Material {
    /// Bulk density in kg/m³.
    pub fn density_kg_m3(&self) -> f64 {
        match self {
            Self::Cardstock => 800.0,
            Self::CorrugatedCardboard => 160.0,
            Self::FoamBoard => 50.0,
            Self::Balsa => 160.0,
            Self::BasswoodPlywood => 680.0,
            Self::Polystyrene => 1050.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cardstock => "cardstock",
            Self::CorrugatedCardboard => "corrugated_cardboard",
            Self::FoamBoard => "foam_board",
            Self::Balsa => "balsa",
            Self::BasswoodPlywood => "basswood_plywood",
            Self::Polystyrene => "polystyrene",
        }
    }
}

/// How a part is meant to be cut.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CuttingMethod {
    #[default]
    Manual,
    Laser,
    BladeCutter,
}
