use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::analysis::{MassProperties, PerformanceMetrics, StabilityAnalysis};
use super::component::Component;
use super::connection::SectionConnection;
use super::fin::FinDesign;
use super::history::VersionHistoryEntry;
use super::material::{CuttingMethod, Material};
use super::section::{default_sections, Section};

/// A rocket model: the root aggregate.
///
/// Sections, components, connections and fin designs reference each other
/// by id within the design. The graph is only stored after validation, and
/// every accepted content change bumps `version` by one and appends exactly
/// one [`VersionHistoryEntry`].
///
/// `mass_properties`, `stability` and `performance` are derived caches,
/// recomputed whenever the design is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Design {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub settings: DesignSettings,
    pub sections: Vec<Section>,
    pub components: Vec<Component>,
    pub connections: Vec<SectionConnection>,
    pub fin_designs: Vec<FinDesign>,
    pub template_settings: TemplateSettings,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub mass_properties: Option<MassProperties>,
    pub stability: Option<StabilityAnalysis>,
    pub performance: Option<PerformanceMetrics>,
    pub version: u32,
    pub history: Vec<VersionHistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Design {
    /// First version of a new design owned by `owner_id`.
    ///
    /// The result is not validated and carries no derived metrics yet.
    pub fn from_input(owner_id: Uuid, input: CreateDesignInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: input.name,
            description: input.description,
            is_public: input.is_public,
            settings: input.settings.unwrap_or_default(),
            sections: input.sections.unwrap_or_else(default_sections),
            components: input.components,
            connections: input.connections,
            fin_designs: input.fin_designs,
            template_settings: input.template_settings.unwrap_or_default(),
            metadata: input.metadata,
            mass_properties: None,
            stability: None,
            performance: None,
            version: 1,
            history: vec![VersionHistoryEntry::new(1, "Design created")],
            created_at: now,
            updated_at: now,
        }
    }
}

/// Design-wide defaults and body dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSettings {
    pub default_cutting_method: CuttingMethod,
    pub default_material: Material,
    /// Multiplier applied to every template dimension on export.
    pub scale_factor: f64,
    pub body_length_mm: f64,
    pub body_diameter_mm: f64,
    #[serde(default)]
    pub motor_class: MotorClass,
}

impl Default for DesignSettings {
    fn default() -> Self {
        Self {
            default_cutting_method: CuttingMethod::Manual,
            default_material: Material::Cardstock,
            scale_factor: 1.0,
            body_length_mm: 400.0,
            body_diameter_mm: 40.0,
            motor_class: MotorClass::C,
        }
    }
}

/// Model rocket motor impulse class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotorClass {
    A,
    B,
    #[default]
    C,
    D,
    E,
    F,
}

impl MotorClass {
    /// Upper bound of the class's total impulse in N·s.
    pub fn total_impulse_ns(&self) -> f64 {
        match self {
            Self::A => 2.5,
            Self::B => 5.0,
            Self::C => 10.0,
            Self::D => 20.0,
            Self::E => 40.0,
            Self::F => 80.0,
        }
    }

    /// Typical loaded motor mass in grams.
    pub fn loaded_mass_g(&self) -> f64 {
        match self {
            Self::A => 10.0,
            Self::B => 15.0,
            Self::C => 25.0,
            Self::D => 45.0,
            Self::E => 60.0,
            Self::F => 90.0,
        }
    }
}

/// Accepted range for outline sample counts.
pub const OUTLINE_SAMPLES_RANGE: std::ops::RangeInclusive<u32> = 2..=4096;

/// Page layout for exported templates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSettings {
    pub margin_mm: f64,
    pub stroke_width_mm: f64,
    pub include_labels: bool,
    /// Overrides the server's outline sample count when set. Must lie in
    /// [`OUTLINE_SAMPLES_RANGE`].
    #[serde(default)]
    pub outline_samples: Option<u32>,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            margin_mm: 10.0,
            stroke_width_mm: 0.25,
            include_labels: true,
            outline_samples: None,
        }
    }
}

/// Input for creating a new design. Sections default to nosecone, payload
/// bay and main body when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDesignInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    pub settings: Option<DesignSettings>,
    pub sections: Option<Vec<Section>>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub connections: Vec<SectionConnection>,
    #[serde(default)]
    pub fin_designs: Vec<FinDesign>,
    pub template_settings: Option<TemplateSettings>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Replace-patch for a design. Every present field replaces the stored value
/// wholesale; absent fields are kept.
///
/// `description` distinguishes an absent field (keep) from an explicit
/// `null` (clear).
///
/// Engine-controlled fields (`ownerId`, `createdAt`, `version`, `history`,
/// the derived metrics) have no slot here, so a payload carrying them has
/// them silently dropped during deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignPatch {
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    pub settings: Option<DesignSettings>,
    pub sections: Option<Vec<Section>>,
    pub components: Option<Vec<Component>>,
    pub connections: Option<Vec<SectionConnection>>,
    pub fin_designs: Option<Vec<FinDesign>>,
    pub template_settings: Option<TemplateSettings>,
    pub metadata: Option<BTreeMap<String, String>>,
    /// Becomes the history entry's description.
    pub change_description: Option<String>,
}

/// Wrap any present value, `null` included, in `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Input for cloning a design.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneDesignInput {
    pub name: Option<String>,
}

/// Design without its geometry, used for list responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSummary {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub version: u32,
    pub section_count: usize,
    pub component_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Design> for DesignSummary {
    fn from(d: Design) -> Self {
        Self {
            id: d.id,
            owner_id: d.owner_id,
            name: d.name,
            description: d.description,
            is_public: d.is_public,
            version: d.version,
            section_count: d.sections.len(),
            component_count: d.components.len(),
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}
