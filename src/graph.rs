//! Design graph validation and patch drafting.
//!
//! Sub-entities reference each other by string id. [`DesignIndex`] builds
//! per-design lookup tables over those ids so that every reference can be
//! checked without owning pointers; connections and component links are
//! free to form cycles.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::*;

/// Tolerance when comparing section boundaries.
pub const BOUNDARY_EPSILON: f64 = 1e-9;

/// What kind of invariant a violation breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Sections leave a gap, overlap, or don't span the whole body.
    BoundaryTiling,
    /// A boundary lies outside `[0, 1]` or `start >= end`.
    BoundaryRange,
    DanglingReference,
    SelfReference,
    DuplicateId,
    TypeMismatch,
    InvalidValue,
}

/// One field-level violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Path of the offending field, e.g. `components[2].sectionId`.
    pub field: String,
    pub message: String,
}

/// Every violation found in one validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub violations: Vec<Violation>,
}

impl ValidationErrors {
    pub fn has(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Design is invalid ({} violations)", self.violations.len())?;
        for v in &self.violations {
            write!(f, "; {}: {}", v.field, v.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Id lookup tables for one design.
pub struct DesignIndex<'a> {
    pub sections: HashMap<&'a str, &'a Section>,
    pub components: HashMap<&'a str, &'a Component>,
}

impl<'a> DesignIndex<'a> {
    pub fn new(design: &'a Design) -> Self {
        Self {
            sections: design.sections.iter().map(|s| (s.id.as_str(), s)).collect(),
            components: design
                .components
                .iter()
                .map(|c| (c.id.as_str(), c))
                .collect(),
        }
    }

    pub fn section(&self, id: &str) -> Option<&'a Section> {
        self.sections.get(id).copied()
    }

    pub fn component(&self, id: &str) -> Option<&'a Component> {
        self.components.get(id).copied()
    }
}

#[derive(Default)]
struct Collector {
    violations: Vec<Violation>,
}

impl Collector {
    fn push(&mut self, kind: ViolationKind, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation {
            kind,
            field: field.into(),
            message: message.into(),
        });
    }

    fn positive(&mut self, value: f64, field: String) {
        if !(value.is_finite() && value > 0.0) {
            self.push(
                ViolationKind::InvalidValue,
                field,
                format!("must be a positive number, got {}", value),
            );
        }
    }
}

/// Check every invariant of the design graph, reporting all violations.
pub fn validate(design: &Design) -> Result<(), ValidationErrors> {
    let mut out = Collector::default();
    let index = DesignIndex::new(design);

    check_settings(design, &mut out);
    check_duplicates(
        design.sections.iter().map(|s| s.id.as_str()),
        "sections",
        &mut out,
    );
    check_duplicates(
        design.components.iter().map(|c| c.id.as_str()),
        "components",
        &mut out,
    );
    check_duplicates(
        design.connections.iter().map(|c| c.id.as_str()),
        "connections",
        &mut out,
    );
    check_duplicates(
        design.fin_designs.iter().map(|f| f.id.as_str()),
        "finDesigns",
        &mut out,
    );
    check_boundaries(&design.sections, &mut out);
    check_components(design, &index, &mut out);
    check_connections(design, &index, &mut out);
    check_fin_designs(design, &index, &mut out);

    if out.violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors {
            violations: out.violations,
        })
    }
}

fn check_settings(design: &Design, out: &mut Collector) {
    if design.name.trim().is_empty() {
        out.push(ViolationKind::InvalidValue, "name", "must not be empty");
    }
    let s = &design.settings;
    out.positive(s.scale_factor, "settings.scaleFactor".to_string());
    out.positive(s.body_length_mm, "settings.bodyLengthMm".to_string());
    out.positive(s.body_diameter_mm, "settings.bodyDiameterMm".to_string());

    let t = &design.template_settings;
    if let Some(samples) = t.outline_samples {
        if !OUTLINE_SAMPLES_RANGE.contains(&samples) {
            out.push(
                ViolationKind::InvalidValue,
                "templateSettings.outlineSamples",
                format!(
                    "must be between {} and {}, got {}",
                    OUTLINE_SAMPLES_RANGE.start(),
                    OUTLINE_SAMPLES_RANGE.end(),
                    samples
                ),
            );
        }
    }
    if !(t.margin_mm.is_finite() && t.margin_mm >= 0.0) {
        out.push(
            ViolationKind::InvalidValue,
            "templateSettings.marginMm",
            format!("must not be negative, got {}", t.margin_mm),
        );
    }
    out.positive(t.stroke_width_mm, "templateSettings.strokeWidthMm".to_string());
}

fn check_duplicates<'a>(ids: impl Iterator<Item = &'a str>, collection: &str, out: &mut Collector) {
    let mut seen = HashSet::new();
    for (i, id) in ids.enumerate() {
        if !seen.insert(id) {
            out.push(
                ViolationKind::DuplicateId,
                format!("{}[{}].id", collection, i),
                format!("id '{}' is used more than once", id),
            );
        }
    }
}

fn check_boundaries(sections: &[Section], out: &mut Collector) {
    if sections.is_empty() {
        out.push(
            ViolationKind::BoundaryTiling,
            "sections",
            "at least one section is required to cover [0, 1]",
        );
        return;
    }

    for (i, s) in sections.iter().enumerate() {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        if !in_range(s.start) || !in_range(s.end) || s.start >= s.end {
            out.push(
                ViolationKind::BoundaryRange,
                format!("sections[{}]", i),
                format!(
                    "boundaries [{}, {}] must satisfy 0 <= start < end <= 1",
                    s.start, s.end
                ),
            );
        }
    }

    let first = &sections[0];
    if first.start.abs() > BOUNDARY_EPSILON {
        out.push(
            ViolationKind::BoundaryTiling,
            "sections[0].start",
            format!("first section must start at 0, starts at {}", first.start),
        );
    }

    for (i, pair) in sections.windows(2).enumerate() {
        let (a, b) = (&pair[0], &pair[1]);
        let delta = b.start - a.end;
        if delta > BOUNDARY_EPSILON {
            out.push(
                ViolationKind::BoundaryTiling,
                format!("sections[{}].start", i + 1),
                format!("gap between '{}' and '{}' ({} to {})", a.id, b.id, a.end, b.start),
            );
        } else if delta < -BOUNDARY_EPSILON {
            out.push(
                ViolationKind::BoundaryTiling,
                format!("sections[{}].start", i + 1),
                format!("'{}' overlaps '{}' ({} to {})", b.id, a.id, b.start, a.end),
            );
        }
    }

    let last_index = sections.len() - 1;
    let last = &sections[last_index];
    if (last.end - 1.0).abs() > BOUNDARY_EPSILON {
        out.push(
            ViolationKind::BoundaryTiling,
            format!("sections[{}].end", last_index),
            format!("last section must end at 1, ends at {}", last.end),
        );
    }
}

fn check_components(design: &Design, index: &DesignIndex, out: &mut Collector) {
    for (i, c) in design.components.iter().enumerate() {
        let field = |name: &str| format!("components[{}].{}", i, name);

        if index.section(&c.section_id).is_none() {
            out.push(
                ViolationKind::DanglingReference,
                field("sectionId"),
                format!("section '{}' does not exist", c.section_id),
            );
        }

        for (j, linked) in c.linked_components.iter().enumerate() {
            let linked_field = format!("components[{}].linkedComponents[{}]", i, j);
            if linked == &c.id {
                out.push(
                    ViolationKind::SelfReference,
                    linked_field,
                    format!("component '{}' links to itself", c.id),
                );
            } else if index.component(linked).is_none() {
                out.push(
                    ViolationKind::DanglingReference,
                    linked_field,
                    format!("component '{}' does not exist", linked),
                );
            }
        }

        out.positive(c.thickness_mm, field("thicknessMm"));

        if c.outline.len() < 2 {
            out.push(
                ViolationKind::InvalidValue,
                field("outline"),
                "an outline needs at least two control points",
            );
        }

        if c.symmetry.count < 1 {
            out.push(
                ViolationKind::InvalidValue,
                field("symmetry.count"),
                "symmetry count must be at least 1",
            );
        }
    }
}

fn check_connections(design: &Design, index: &DesignIndex, out: &mut Collector) {
    for (i, conn) in design.connections.iter().enumerate() {
        if conn.section1_id == conn.section2_id {
            out.push(
                ViolationKind::SelfReference,
                format!("connections[{}]", i),
                format!("connection joins section '{}' to itself", conn.section1_id),
            );
        }

        for (name, id) in [("section1Id", &conn.section1_id), ("section2Id", &conn.section2_id)] {
            if index.section(id).is_none() {
                out.push(
                    ViolationKind::DanglingReference,
                    format!("connections[{}].{}", i, name),
                    format!("section '{}' does not exist", id),
                );
            }
        }

        for (j, id) in conn.component_ids.iter().enumerate() {
            if index.component(id).is_none() {
                out.push(
                    ViolationKind::DanglingReference,
                    format!("connections[{}].componentIds[{}]", i, j),
                    format!("component '{}' does not exist", id),
                );
            }
        }
    }
}

fn check_fin_designs(design: &Design, index: &DesignIndex, out: &mut Collector) {
    for (i, fin) in design.fin_designs.iter().enumerate() {
        let field = |name: &str| format!("finDesigns[{}].{}", i, name);

        match index.component(&fin.component_id) {
            None => out.push(
                ViolationKind::DanglingReference,
                field("componentId"),
                format!("component '{}' does not exist", fin.component_id),
            ),
            Some(c) if c.kind != ComponentType::Fin => out.push(
                ViolationKind::TypeMismatch,
                field("componentId"),
                format!(
                    "component '{}' has type '{}', expected 'fin'",
                    c.id,
                    c.kind.as_str()
                ),
            ),
            Some(_) => {}
        }

        if index.section(&fin.section_id).is_none() {
            out.push(
                ViolationKind::DanglingReference,
                field("sectionId"),
                format!("section '{}' does not exist", fin.section_id),
            );
        }

        let p = &fin.planform;
        out.positive(p.root_chord_mm, field("planform.rootChordMm"));
        out.positive(p.span_mm, field("planform.spanMm"));
        if !(p.tip_chord_mm.is_finite() && p.tip_chord_mm >= 0.0) {
            out.push(
                ViolationKind::InvalidValue,
                field("planform.tipChordMm"),
                format!("must not be negative, got {}", p.tip_chord_mm),
            );
        }
    }
}

/// Merge a replace-patch into a copy of `current`.
///
/// Only content fields are touched; identity, ownership, visibility,
/// version and history stay as they are.
pub fn draft(current: &Design, patch: DesignPatch) -> Design {
    let mut next = current.clone();
    if let Some(name) = patch.name {
        next.name = name;
    }
    if let Some(description) = patch.description {
        next.description = description;
    }
    if let Some(settings) = patch.settings {
        next.settings = settings;
    }
    if let Some(sections) = patch.sections {
        next.sections = sections;
    }
    if let Some(components) = patch.components {
        next.components = components;
    }
    if let Some(connections) = patch.connections {
        next.connections = connections;
    }
    if let Some(fin_designs) = patch.fin_designs {
        next.fin_designs = fin_designs;
    }
    if let Some(template_settings) = patch.template_settings {
        next.template_settings = template_settings;
    }
    if let Some(metadata) = patch.metadata {
        next.metadata = metadata;
    }
    next
}
