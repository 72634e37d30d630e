use serde::{Deserialize, Serialize};

/// A joint between two sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionConnection {
    pub id: String,
    pub section1_id: String,
    pub section2_id: String,
    pub connection_type: ConnectionType,
    pub mechanism: MechanismType,
    /// Components that physically realize the joint.
    #[serde(default)]
    pub component_ids: Vec<String>,
}

/// - `Fixed`: glued for good
/// - `Separable`: comes apart in flight (e.g. recovery separation)
/// - `Functional`: opens on the ground (payload access)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    Fixed,
    Separable,
    Functional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MechanismType {
    Glue,
    FrictionFit,
    TabAndSlot,
    TwistLock,
    Magnet,
    Hinge,
}
