//! Mass and stability aggregation.
//!
//! A pure function of the design graph: component outlines and material
//! densities fold into mass properties, fin planforms and the nose shape
//! into a center of pressure (Barrowman's method), and the two combine into
//! a stability margin in calibers. All figures are at template scale 1;
//! `scale_factor` only affects export.
//!
//! Coordinates follow [`Placement`]: `x` runs aft from the nose tip.

use kurbo::Point;

use crate::geometry;
use crate::graph::DesignIndex;
use crate::models::*;

/// Margin, in calibers, at and above which a design counts as stable.
pub const STABLE_MARGIN_CALIBERS: f64 = 1.0;

/// Normal force coefficient slope of any nose shape at small angles of attack.
const NOSE_NORMAL_FORCE: f64 = 2.0;

/// Sea-level air density, kg/m³.
const AIR_DENSITY: f64 = 1.225;

const GRAVITY: f64 = 9.81;

pub fn classify(margin_calibers: f64) -> StabilityClass {
    if margin_calibers >= STABLE_MARGIN_CALIBERS {
        StabilityClass::Stable
    } else if margin_calibers >= 0.0 {
        StabilityClass::Marginal
    } else {
        StabilityClass::Unstable
    }
}

/// Derive all metrics for a design.
pub fn analyze(design: &Design, samples: u32) -> DesignAnalysis {
    let index = DesignIndex::new(design);
    let mass = mass_properties(design, samples);
    let stability = stability(design, &index, &mass);
    let performance = performance(design, &index, &mass);
    DesignAnalysis {
        mass,
        stability,
        performance,
    }
}

/// Recompute and cache the derived fields on the aggregate.
pub fn refresh(design: &mut Design, samples: u32) {
    let analysis = analyze(design, samples);

    let summaries: Vec<Option<FinAeroSummary>> = {
        let index = DesignIndex::new(design);
        design
            .fin_designs
            .iter()
            .map(|fin| fin_summary(fin, &index, &design.settings))
            .collect()
    };
    for (fin, aero) in design.fin_designs.iter_mut().zip(summaries) {
        fin.aero = aero;
    }

    design.mass_properties = Some(analysis.mass);
    design.stability = Some(analysis.stability);
    design.performance = Some(analysis.performance);
}

pub fn mass_properties(design: &Design, samples: u32) -> MassProperties {
    let mut components = Vec::with_capacity(design.components.len());
    let mut total = 0.0;
    let (mut mx, mut my) = (0.0, 0.0);

    for c in &design.components {
        let outline = geometry::evaluate_outline(&c.outline, samples);
        let area_mm2 = geometry::polygon_area(&outline);
        let material = c.material.unwrap_or(design.settings.default_material);
        let laminate = if c.doubled { 2.0 } else { 1.0 };
        let copies = c.symmetry.copies();

        // kg/m³ × mm³ × 1e-9 m³/mm³ × 1e3 g/kg
        let single_g = material.density_kg_m3() * area_mm2 * c.thickness_mm * laminate * 1e-6;
        let mass_g = single_g * copies as f64;

        if let Some(centroid) = geometry::centroid(&geometry::place(&outline, &c.placement)) {
            // Replicated parts are spread around the body axis.
            let radial = if copies > 1 { 0.0 } else { centroid.y };
            mx += mass_g * centroid.x;
            my += mass_g * radial;
        }
        total += mass_g;

        components.push(ComponentMass {
            component_id: c.id.clone(),
            mass_g,
            copies,
        });
    }

    let center_of_mass = if total > 0.0 {
        Point::new(mx / total, my / total)
    } else {
        Point::new(design.settings.body_length_mm / 2.0, 0.0)
    };

    MassProperties {
        total_mass_g: total,
        center_of_mass,
        components,
    }
}

fn nose(design: &Design) -> Option<(NoseShape, f64)> {
    design.sections.iter().find_map(|s| match s.kind {
        SectionKind::Nosecone { shape, .. } => {
            Some((shape, s.span() * design.settings.body_length_mm))
        }
        _ => None,
    })
}

/// Fraction of the nose length at which its center of pressure sits.
fn nose_cp_fraction(shape: NoseShape) -> f64 {
    match shape {
        NoseShape::Conical => 0.666,
        NoseShape::Ogive => 0.466,
        NoseShape::Parabolic => 0.5,
        NoseShape::Elliptical => 0.333,
    }
}

fn fin_summary(
    fin: &FinDesign,
    index: &DesignIndex,
    settings: &DesignSettings,
) -> Option<FinAeroSummary> {
    let fin_count = index.component(&fin.component_id)?.symmetry.copies();
    let p = &fin.planform;
    let d = settings.body_diameter_mm;
    let r = d / 2.0;
    let (cr, ct, s) = (p.root_chord_mm, p.tip_chord_mm, p.span_mm);
    let chord_sum = cr + ct;
    if chord_sum <= 0.0 || d <= 0.0 {
        return None;
    }

    let mid_chord_line = (s.powi(2) + (p.sweep_mm + ct / 2.0 - cr / 2.0).powi(2)).sqrt();
    let interference = 1.0 + r / (s + r);
    let cn = interference * (4.0 * fin_count as f64 * (s / d).powi(2))
        / (1.0 + (1.0 + (2.0 * mid_chord_line / chord_sum).powi(2)).sqrt());
    let cp = p.station_mm
        + p.sweep_mm / 3.0 * (cr + 2.0 * ct) / chord_sum
        + (chord_sum - cr * ct / chord_sum) / 6.0;

    Some(FinAeroSummary {
        fin_count,
        planform_area_mm2: p.area_mm2(),
        normal_force_coefficient: cn,
        center_of_pressure_mm: cp,
    })
}

pub fn center_of_pressure(design: &Design, index: &DesignIndex) -> f64 {
    let mut cn_total = 0.0;
    let mut moment = 0.0;

    if let Some((shape, length)) = nose(design) {
        cn_total += NOSE_NORMAL_FORCE;
        moment += NOSE_NORMAL_FORCE * nose_cp_fraction(shape) * length;
    }

    for fin in &design.fin_designs {
        if let Some(aero) = fin_summary(fin, index, &design.settings) {
            cn_total += aero.normal_force_coefficient;
            moment += aero.normal_force_coefficient * aero.center_of_pressure_mm;
        }
    }

    if cn_total > 0.0 {
        moment / cn_total
    } else {
        design.settings.body_length_mm / 2.0
    }
}

fn stability(design: &Design, index: &DesignIndex, mass: &MassProperties) -> StabilityAnalysis {
    let cp = center_of_pressure(design, index);
    let cg = mass.center_of_mass.x;
    let d = design.settings.body_diameter_mm;
    let margin = (cp - cg) / d;

    StabilityAnalysis {
        center_of_pressure_mm: cp,
        center_of_gravity_mm: cg,
        reference_diameter_mm: d,
        margin_calibers: margin,
        classification: classify(margin),
    }
}

/// Drag coefficient from nose shape, fin count and fineness ratio.
fn drag_coefficient(design: &Design, index: &DesignIndex) -> f64 {
    let base = match nose(design).map(|(shape, _)| shape) {
        Some(NoseShape::Conical) => 0.50,
        Some(NoseShape::Ogive) => 0.45,
        Some(NoseShape::Parabolic) => 0.42,
        Some(NoseShape::Elliptical) => 0.47,
        None => 0.75,
    };

    let fins: u32 = design
        .fin_designs
        .iter()
        .filter_map(|f| index.component(&f.component_id))
        .map(|c| c.symmetry.copies())
        .sum();

    let fineness = design.settings.body_length_mm / design.settings.body_diameter_mm;
    let stubby = if fineness < 10.0 {
        0.05 * (10.0 - fineness) / 10.0
    } else {
        0.0
    };

    base + 0.02 * fins as f64 + stubby
}

/// Coast height with quadratic drag from the burnout velocity `I / m`.
fn performance(design: &Design, index: &DesignIndex, mass: &MassProperties) -> PerformanceMetrics {
    let cd = drag_coefficient(design, index);
    let motor = design.settings.motor_class;
    let m = (mass.total_mass_g + motor.loaded_mass_g()) / 1000.0;
    let v = motor.total_impulse_ns() / m;
    let radius_m = design.settings.body_diameter_mm / 2000.0;
    let k = 0.5 * AIR_DENSITY * cd * std::f64::consts::PI * radius_m.powi(2);

    let height = if k > 0.0 {
        m / (2.0 * k) * (1.0 + k * v.powi(2) / (m * GRAVITY)).ln()
    } else {
        v.powi(2) / (2.0 * GRAVITY)
    };

    PerformanceMetrics {
        drag_coefficient: cd,
        estimated_height_m: height,
    }
}
