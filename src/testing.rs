//! Fixtures shared by unit tests.

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use crate::models::*;

pub fn trapezoid(root: f64, tip: f64, span: f64) -> Vec<BezierControlPoint> {
    vec![
        BezierControlPoint::new(0.0, 0.0),
        BezierControlPoint::new(root, 0.0),
        BezierControlPoint::new(root, span),
        BezierControlPoint::new(root - tip, span),
        BezierControlPoint::new(0.0, 0.0),
    ]
}

pub fn fin_component(id: &str) -> Component {
    Component {
        id: id.to_string(),
        name: "Fin".to_string(),
        kind: ComponentType::Fin,
        section_id: "main-body".to_string(),
        material: Some(Material::Balsa),
        thickness_mm: 2.0,
        doubled: false,
        cutting_method: None,
        outline: trapezoid(60.0, 30.0, 45.0),
        placement: Placement {
            x: 330.0,
            y: 20.0,
            rotation_deg: 0.0,
        },
        symmetry: Symmetry::radial(3),
        linked_components: Vec::new(),
        constraints: Vec::new(),
    }
}

fn panel(id: &str, kind: ComponentType, section: &str, x: f64, length: f64) -> Component {
    Component {
        id: id.to_string(),
        name: id.to_string(),
        kind,
        section_id: section.to_string(),
        material: None,
        thickness_mm: 0.3,
        doubled: false,
        cutting_method: None,
        outline: vec![
            BezierControlPoint::new(0.0, 0.0),
            BezierControlPoint::new(length, 0.0),
            BezierControlPoint::new(length, 125.0),
            BezierControlPoint::new(0.0, 125.0),
            BezierControlPoint::new(0.0, 0.0),
        ],
        placement: Placement {
            x,
            y: -62.5,
            rotation_deg: 0.0,
        },
        symmetry: Symmetry::default(),
        linked_components: Vec::new(),
        constraints: Vec::new(),
    }
}

/// A three-section design with a fin set, a body wrap, a payload bulkhead
/// and a separable nose joint. `components[0]` is the fin.
pub fn design_with_fins() -> Design {
    let now = Utc::now();
    let mut body = panel("body-wrap", ComponentType::Shroud, "main-body", 160.0, 240.0);
    body.linked_components = vec!["fin".to_string()];
    let bulkhead = panel("bulkhead", ComponentType::Bulkhead, "payload", 80.0, 80.0);

    Design {
        id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        name: "Test Rocket".to_string(),
        description: None,
        is_public: false,
        settings: DesignSettings::default(),
        sections: default_sections(),
        components: vec![fin_component("fin"), body, bulkhead],
        connections: vec![SectionConnection {
            id: "nose-joint".to_string(),
            section1_id: "nosecone".to_string(),
            section2_id: "payload".to_string(),
            connection_type: ConnectionType::Separable,
            mechanism: MechanismType::FrictionFit,
            component_ids: vec!["bulkhead".to_string()],
        }],
        fin_designs: vec![FinDesign {
            id: "fin-set".to_string(),
            component_id: "fin".to_string(),
            section_id: "main-body".to_string(),
            planform: FinPlanform {
                root_chord_mm: 60.0,
                tip_chord_mm: 30.0,
                span_mm: 45.0,
                sweep_mm: 30.0,
                station_mm: 330.0,
            },
            aero: None,
        }],
        template_settings: TemplateSettings::default(),
        metadata: BTreeMap::new(),
        mass_properties: None,
        stability: None,
        performance: None,
        version: 1,
        history: vec![VersionHistoryEntry::new(1, "Design created")],
        created_at: now,
        updated_at: now,
    }
}
