//! Format-neutral vector document built from a design.

use kurbo::{Affine, Point, Rect, Vec2};
use serde::Serialize;

use crate::error::{DesignError, DesignResult};
use crate::geometry;
use crate::models::{Component, Design};

/// Label height in mm.
const LABEL_SIZE_MM: f64 = 4.0;

/// Every outline and label of a design, in mm, origin top-left.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorDocument {
    pub width_mm: f64,
    pub height_mm: f64,
    pub stroke_width_mm: f64,
    pub groups: Vec<VectorGroup>,
}

/// All parts belonging to one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorGroup {
    pub section_id: String,
    pub label: Option<TextLabel>,
    pub paths: Vec<VectorPath>,
    pub labels: Vec<TextLabel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorPath {
    pub component_id: String,
    /// Index of the symmetric copy this path traces.
    pub copy: u32,
    pub points: Vec<Point>,
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLabel {
    pub position: Point,
    pub text: String,
    pub size_mm: f64,
}

impl VectorDocument {
    pub fn path_count(&self) -> usize {
        self.groups.iter().map(|g| g.paths.len()).sum()
    }

    fn all_points(&self) -> impl Iterator<Item = &Point> {
        self.groups.iter().flat_map(|g| {
            g.paths
                .iter()
                .flat_map(|p| p.points.iter())
                .chain(g.labels.iter().map(|l| &l.position))
                .chain(g.label.iter().map(|l| &l.position))
        })
    }

    fn translate(&mut self, offset: Vec2) {
        for group in &mut self.groups {
            for path in &mut group.paths {
                for p in &mut path.points {
                    *p += offset;
                }
            }
            for label in group.labels.iter_mut().chain(group.label.iter_mut()) {
                label.position += offset;
            }
        }
    }
}

fn component_paths(
    component: &Component,
    samples: u32,
    scale: Affine,
) -> DesignResult<Vec<VectorPath>> {
    let outline = geometry::evaluate_outline(&component.outline, samples);
    let closed = match (outline.first(), outline.last()) {
        (Some(a), Some(b)) => outline.len() > 2 && a.distance(*b) < 1e-9,
        _ => false,
    };

    let copies = geometry::apply_symmetry(&outline, &component.symmetry)?;
    Ok(copies
        .into_iter()
        .enumerate()
        .map(|(k, copy)| VectorPath {
            component_id: component.id.clone(),
            copy: k as u32,
            points: geometry::transform(&geometry::place(&copy, &component.placement), scale),
            closed,
        })
        .collect())
}

/// Render every component of `design`, grouped by section.
///
/// Components are placed at their design positions and scaled by the
/// design's scale factor; the document is then shifted so that its content
/// starts at the template margin.
pub fn vectorize(design: &Design, samples: u32) -> DesignResult<VectorDocument> {
    if design.components.is_empty() {
        return Err(DesignError::EmptyDesign);
    }

    let template = &design.template_settings;
    let scale = Affine::scale(design.settings.scale_factor);
    let mut groups = Vec::with_capacity(design.sections.len());

    for section in &design.sections {
        let mut paths = Vec::new();
        let mut labels = Vec::new();

        for component in design.components.iter().filter(|c| c.section_id == section.id) {
            let component_paths = component_paths(component, samples, scale)?;
            if template.include_labels {
                if let Some(c) = component_paths
                    .first()
                    .and_then(|p| geometry::centroid(&p.points))
                {
                    labels.push(TextLabel {
                        position: c,
                        text: component.name.clone(),
                        size_mm: LABEL_SIZE_MM * 0.75,
                    });
                }
            }
            paths.extend(component_paths);
        }

        if paths.is_empty() {
            continue;
        }

        let label = if template.include_labels {
            group_bounds(&paths).map(|b| TextLabel {
                position: Point::new(b.x0, b.y0 - LABEL_SIZE_MM),
                text: section.name.clone(),
                size_mm: LABEL_SIZE_MM,
            })
        } else {
            None
        };

        groups.push(VectorGroup {
            section_id: section.id.clone(),
            label,
            paths,
            labels,
        });
    }

    let mut doc = VectorDocument {
        width_mm: 0.0,
        height_mm: 0.0,
        stroke_width_mm: template.stroke_width_mm,
        groups,
    };

    let margin = template.margin_mm;
    let bounds = doc
        .all_points()
        .fold(None, |acc: Option<Rect>, p| match acc {
            None => Some(Rect::from_points(*p, *p)),
            Some(r) => Some(r.union_pt(*p)),
        })
        .unwrap_or(Rect::ZERO);

    doc.translate(Vec2::new(margin - bounds.x0, margin - bounds.y0));
    doc.width_mm = bounds.width() + 2.0 * margin;
    doc.height_mm = bounds.height() + 2.0 * margin;
    Ok(doc)
}

fn group_bounds(paths: &[VectorPath]) -> Option<Rect> {
    paths
        .iter()
        .filter_map(|p| geometry::bounds(&p.points))
        .reduce(|a, b| a.union(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::design_with_fins;

    #[test]
    fn empty_design_is_rejected() {
        let mut design = design_with_fins();
        design.components.clear();
        assert!(matches!(vectorize(&design, 16), Err(DesignError::EmptyDesign)));
    }

    #[test]
    fn one_group_per_populated_section() {
        let doc = vectorize(&design_with_fins(), 16).unwrap();
        let ids: Vec<_> = doc.groups.iter().map(|g| g.section_id.as_str()).collect();
        assert_eq!(ids, vec!["payload", "main-body"]);
    }

    #[test]
    fn symmetric_parts_are_expanded() {
        let doc = vectorize(&design_with_fins(), 16).unwrap();
        let fins = doc.groups[1]
            .paths
            .iter()
            .filter(|p| p.component_id == "fin")
            .count();
        assert_eq!(fins, 3);
        assert_eq!(doc.path_count(), 5);
    }

    #[test]
    fn content_starts_at_the_margin() {
        let design = design_with_fins();
        let doc = vectorize(&design, 16).unwrap();
        let margin = design.template_settings.margin_mm;
        let min_x = doc
            .all_points()
            .map(|p| p.x)
            .fold(f64::INFINITY, f64::min);
        let min_y = doc
            .all_points()
            .map(|p| p.y)
            .fold(f64::INFINITY, f64::min);
        assert!((min_x - margin).abs() < 1e-9);
        assert!((min_y - margin).abs() < 1e-9);
        assert!(doc.width_mm > 2.0 * margin);
    }

    #[test]
    fn scale_factor_scales_the_document() {
        let mut design = design_with_fins();
        design.template_settings.include_labels = false;
        let base = vectorize(&design, 16).unwrap();
        design.settings.scale_factor = 2.0;
        let doubled = vectorize(&design, 16).unwrap();
        let margin = 2.0 * design.template_settings.margin_mm;
        assert!(((doubled.width_mm - margin) - 2.0 * (base.width_mm - margin)).abs() < 1e-6);
    }

    #[test]
    fn labels_can_be_turned_off() {
        let mut design = design_with_fins();
        design.template_settings.include_labels = false;
        let doc = vectorize(&design, 16).unwrap();
        assert!(doc.groups.iter().all(|g| g.label.is_none() && g.labels.is_empty()));
    }
}
