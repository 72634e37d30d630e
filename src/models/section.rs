use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A longitudinal segment of the rocket body.
///
/// `start` and `end` are fractions of total body length. Across a design the
/// sections must tile `[0, 1]` in order: each section's `end` is the next
/// section's `start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub name: String,
    /// Variant-specific substructure. The tag doubles as the section type.
    pub kind: SectionKind,
    pub start: f64,
    pub end: f64,
    /// Free-form user metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Section {
    /// Fraction of the body length covered by this section.
    pub fn span(&self) -> f64 {
        self.end - self.start
    }
}

/// Section type with the substructure that type carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionKind {
    Nosecone {
        #[serde(default)]
        shape: NoseShape,
        /// Length of the shoulder that slides into the next section, in mm.
        #[serde(default)]
        shoulder_length_mm: f64,
    },
    PayloadBay {
        #[serde(default)]
        hatch: HatchType,
        #[serde(default)]
        has_window: bool,
    },
    MainBody {
        #[serde(default)]
        motor_mount_diameter_mm: f64,
        #[serde(default)]
        fin_slots: u32,
    },
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nosecone { .. } => "nosecone",
            Self::PayloadBay { .. } => "payload_bay",
            Self::MainBody { .. } => "main_body",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoseShape {
    Conical,
    #[default]
    Ogive,
    Parabolic,
    Elliptical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HatchType {
    #[default]
    None,
    Hinged,
    Removable,
}

/// The three sections every new design starts with.
pub fn default_sections() -> Vec<Section> {
    vec![
        Section {
            id: "nosecone".to_string(),
            name: "Nosecone".to_string(),
            kind: SectionKind::Nosecone {
                shape: NoseShape::Ogive,
                shoulder_length_mm: 20.0,
            },
            start: 0.0,
            end: 0.2,
            metadata: BTreeMap::new(),
        },
        Section {
            id: "payload".to_string(),
            name: "Payload Bay".to_string(),
            kind: SectionKind::PayloadBay {
                hatch: HatchType::None,
                has_window: false,
            },
            start: 0.2,
            end: 0.4,
            metadata: BTreeMap::new(),
        },
        Section {
            id: "main-body".to_string(),
            name: "Main Body".to_string(),
            kind: SectionKind::MainBody {
                motor_mount_diameter_mm: 18.0,
                fin_slots: 3,
            },
            start: 0.4,
            end: 1.0,
            metadata: BTreeMap::new(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_as_str_matches_type_tag() {
        for section in default_sections() {
            let json = serde_json::to_value(&section.kind).unwrap();
            assert_eq!(json["type"], section.kind.as_str());
        }
    }
}
