//! Per-format encoders for vector documents.
//!
//! Each format is one [`Encoder`]; [`EncoderRegistry`] maps format names to
//! encoders so that an unknown format is rejected by a table lookup before
//! any geometry work happens.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use super::vector::{TextLabel, VectorDocument, VectorPath};

/// Header of the laser cutter format: magic, then format version.
pub const CUTTER_A_MAGIC: &[u8; 8] = b"RFCUTA\x00\x01";

/// Header of the blade cutter format: magic, then format version.
pub const CUTTER_B_MAGIC: &[u8; 8] = b"RFCUTB\x00\x01";

/// HPGL plotter units per millimetre.
const HPGL_UNITS_PER_MM: f64 = 40.0;

/// PDF points per millimetre.
const PT_PER_MM: f64 = 72.0 / 25.4;

pub trait Encoder: Send + Sync {
    /// Format name used in export requests.
    fn format(&self) -> &'static str;
    fn content_type(&self) -> &'static str;
    fn extension(&self) -> &'static str;
    fn encode(&self, doc: &VectorDocument) -> Vec<u8>;
}

/// Format name to encoder lookup.
#[derive(Clone)]
pub struct EncoderRegistry {
    encoders: BTreeMap<&'static str, Arc<dyn Encoder>>,
}

impl EncoderRegistry {
    pub fn empty() -> Self {
        Self {
            encoders: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, encoder: Arc<dyn Encoder>) {
        self.encoders.insert(encoder.format(), encoder);
    }

    pub fn get(&self, format: &str) -> Option<Arc<dyn Encoder>> {
        self.encoders.get(format).cloned()
    }

    pub fn formats(&self) -> Vec<&'static str> {
        self.encoders.keys().copied().collect()
    }
}

impl Default for EncoderRegistry {
    /// SVG, PDF and both cutter formats.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(SvgEncoder));
        registry.register(Arc::new(PdfEncoder));
        registry.register(Arc::new(CutterAEncoder));
        registry.register(Arc::new(CutterBEncoder));
        registry
    }
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn svg_path_data(path: &VectorPath) -> String {
    let mut d = String::new();
    for (i, p) in path.points.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{}{:.3} {:.3} ", cmd, p.x, p.y);
    }
    if path.closed {
        d.push('Z');
    }
    d.trim_end().to_string()
}

fn svg_text(label: &TextLabel, out: &mut String) {
    let _ = writeln!(
        out,
        r#"    <text x="{:.3}" y="{:.3}" font-size="{:.3}" font-family="sans-serif">{}</text>"#,
        label.position.x,
        label.position.y,
        label.size_mm,
        xml_escape(&label.text)
    );
}

/// Serialize a vector document as a standalone SVG in millimetres.
pub fn to_svg(doc: &VectorDocument) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.3}mm" height="{h:.3}mm" viewBox="0 0 {w:.3} {h:.3}">"#,
        w = doc.width_mm,
        h = doc.height_mm
    );

    for group in &doc.groups {
        let _ = writeln!(
            out,
            r#"  <g id="section-{id}" data-section="{id}">"#,
            id = xml_escape(&group.section_id)
        );
        if let Some(label) = &group.label {
            svg_text(label, &mut out);
        }
        for path in &group.paths {
            let _ = writeln!(
                out,
                r#"    <path id="{}-{}" d="{}" fill="none" stroke="black" stroke-width="{:.3}"/>"#,
                xml_escape(&path.component_id),
                path.copy,
                svg_path_data(path),
                doc.stroke_width_mm
            );
        }
        for label in &group.labels {
            svg_text(label, &mut out);
        }
        out.push_str("  </g>\n");
    }

    out.push_str("</svg>\n");
    out
}

pub struct SvgEncoder;

impl Encoder for SvgEncoder {
    fn format(&self) -> &'static str {
        "svg"
    }

    fn content_type(&self) -> &'static str {
        "image/svg+xml"
    }

    fn extension(&self) -> &'static str {
        "svg"
    }

    fn encode(&self, doc: &VectorDocument) -> Vec<u8> {
        to_svg(doc).into_bytes()
    }
}

/// Escape a string for a PDF literal, dropping characters outside Latin-1.
fn pdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Single-page PDF drawing the document at 1:1 scale.
pub struct PdfEncoder;

impl PdfEncoder {
    fn content_stream(doc: &VectorDocument) -> String {
        // PDF's origin is bottom-left, the document's is top-left.
        let x = |mm: f64| mm * PT_PER_MM;
        let y = |mm: f64| (doc.height_mm - mm) * PT_PER_MM;

        let mut s = String::new();
        let _ = writeln!(s, "{:.3} w", doc.stroke_width_mm * PT_PER_MM);
        for group in &doc.groups {
            for path in &group.paths {
                for (i, p) in path.points.iter().enumerate() {
                    let op = if i == 0 { "m" } else { "l" };
                    let _ = writeln!(s, "{:.3} {:.3} {}", x(p.x), y(p.y), op);
                }
                s.push_str(if path.closed { "h S\n" } else { "S\n" });
            }
            for label in group.label.iter().chain(group.labels.iter()) {
                let _ = writeln!(
                    s,
                    "BT /F1 {:.3} Tf {:.3} {:.3} Td ({}) Tj ET",
                    label.size_mm * PT_PER_MM,
                    x(label.position.x),
                    y(label.position.y),
                    pdf_string(&label.text)
                );
            }
        }
        s
    }
}

impl Encoder for PdfEncoder {
    fn format(&self) -> &'static str {
        "pdf"
    }

    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn encode(&self, doc: &VectorDocument) -> Vec<u8> {
        let content = Self::content_stream(doc);
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.3} {:.3}] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>",
                doc.width_mm * PT_PER_MM,
                doc.height_mm * PT_PER_MM
            ),
            format!("<< /Length {} >>\nstream\n{}endstream", content.len(), content),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];

        let mut out = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref_at = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            let _ = writeln!(xref, "{:010} 00000 n ", offset);
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        );
        out.extend_from_slice(xref.as_bytes());
        out
    }
}

/// Laser cutter container: magic, little-endian payload length, SVG payload.
pub struct CutterAEncoder;

impl Encoder for CutterAEncoder {
    fn format(&self) -> &'static str {
        "cutterA"
    }

    fn content_type(&self) -> &'static str {
        "application/octet-stream"
    }

    fn extension(&self) -> &'static str {
        "rfa"
    }

    fn encode(&self, doc: &VectorDocument) -> Vec<u8> {
        let payload = to_svg(doc).into_bytes();
        let mut out = Vec::with_capacity(CUTTER_A_MAGIC.len() + 4 + payload.len());
        out.extend_from_slice(CUTTER_A_MAGIC);
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&payload);
        out
    }
}

/// Blade cutter container: magic followed by an HPGL plot of every path.
pub struct CutterBEncoder;

impl CutterBEncoder {
    fn hpgl(doc: &VectorDocument) -> String {
        let unit = |mm: f64| (mm * HPGL_UNITS_PER_MM).round() as i64;
        let mut s = String::from("IN;SP1;");
        for path in doc.groups.iter().flat_map(|g| g.paths.iter()) {
            let Some(first) = path.points.first() else {
                continue;
            };
            let _ = write!(s, "PU{},{};", unit(first.x), unit(first.y));
            let rest: Vec<String> = path
                .points
                .iter()
                .skip(1)
                .chain(path.closed.then_some(first))
                .map(|p| format!("{},{}", unit(p.x), unit(p.y)))
                .collect();
            if !rest.is_empty() {
                let _ = write!(s, "PD{};", rest.join(","));
            }
        }
        s.push_str("PU;SP0;");
        s
    }
}

impl Encoder for CutterBEncoder {
    fn format(&self) -> &'static str {
        "cutterB"
    }

    fn content_type(&self) -> &'static str {
        "application/octet-stream"
    }

    fn extension(&self) -> &'static str {
        "rfb"
    }

    fn encode(&self, doc: &VectorDocument) -> Vec<u8> {
        let mut out = CUTTER_B_MAGIC.to_vec();
        out.extend_from_slice(Self::hpgl(doc).as_bytes());
        out
    }
}
