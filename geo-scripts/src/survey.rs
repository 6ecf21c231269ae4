//! Plan de levé : polygone annoté en SVG
//!
//! Longueur de chaque segment, numérotation des sommets (`P01`, `P02`, …),
//! quadrillage en coordonnées UTM et échelle d'impression en pied de page.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context, Result};
use geo::{CoordsIter, Geometry};
use geoformats::Layer;
use tracing::{debug, info};

use crate::reproject_lite::{ReprojectorLite, UtmZone};

/// Inclinaison ajoutée aux étiquettes de longueur (degrés)
const LABEL_TILT_DEG: f64 = 7.5;

/// Mise en page du plan
#[derive(Debug, Clone, Copy)]
pub struct SurveyStyle {
    /// Marge autour des données, en fraction de l'emprise
    pub margin_factor: f64,
    /// Nombre de graduations réparties sur l'emprise élargie
    pub grid_lines: usize,
    /// Largeur du document (px)
    pub width: f64,
    /// Hauteur du document (px)
    pub height: f64,
    /// Réserve pour les graduations autour du cadre (px)
    pub padding: f64,
    /// Décalage des étiquettes de longueur (px)
    pub label_offset: f64,
    pub font_size: f64,
}

impl Default for SurveyStyle {
    fn default() -> Self {
        Self {
            margin_factor: 0.25,
            grid_lines: 6,
            width: 2500.0,
            height: 2200.0,
            padding: 120.0,
            label_offset: 10.0,
            font_size: 15.0,
        }
    }
}

/// Étiquette de longueur d'un segment
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentLabel {
    pub text: String,
    /// Milieu du segment (mètres)
    pub mid: (f64, f64),
    /// Rotation du texte, sens trigonométrique (degrés)
    pub rotation: f64,
}

/// Rotation d'une étiquette pour un segment (dx, dy)
///
/// Premier et troisième quadrants : -7.5°, sinon +7.5°.
pub fn label_rotation(dx: f64, dy: f64) -> f64 {
    let angle = dy.atan2(dx).to_degrees();
    if (0.0..90.0).contains(&angle) || (-180.0..-90.0).contains(&angle) {
        angle - LABEL_TILT_DEG
    } else {
        angle + LABEL_TILT_DEG
    }
}

/// Étiquettes de longueur pour chaque segment consécutif
pub fn segment_labels(points: &[(f64, f64)]) -> Vec<SegmentLabel> {
    points
        .windows(2)
        .map(|pair| {
            let ((x1, y1), (x2, y2)) = (pair[0], pair[1]);
            let (dx, dy) = (x2 - x1, y2 - y1);
            SegmentLabel {
                text: format!("{:.2} m", dx.hypot(dy)),
                mid: ((x1 + x2) / 2.0, (y1 + y2) / 2.0),
                rotation: label_rotation(dx, dy),
            }
        })
        .collect()
}

/// Libellé du sommet d'indice `index` (base 0)
pub fn vertex_label(index: usize) -> String {
    format!("P0{}", index + 1)
}

/// Graduations entières régulières sur l'emprise élargie, limitées aux données
pub fn grid_ticks(min: f64, max: f64, margin_factor: f64, count: usize) -> Vec<i64> {
    let span = max - min;
    let lo = min - margin_factor * span;
    let hi = max + margin_factor * span;

    (0..count)
        .map(|i| match count {
            1 => lo,
            _ if i == count - 1 => hi,
            _ => lo + i as f64 * (hi - lo) / (count - 1) as f64,
        })
        .map(|v| v.trunc() as i64)
        .filter(|&tick| (min..=max).contains(&(tick as f64)))
        .collect()
}

/// Emprise (min, max) d'une série
fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Transformation mètres → pixels
struct Viewport {
    x0: f64,
    y0: f64,
    x_span: f64,
    y_span: f64,
    left: f64,
    top: f64,
    plot_width: f64,
    plot_height: f64,
}

impl Viewport {
    fn new(x: (f64, f64), y: (f64, f64), style: &SurveyStyle) -> Self {
        let expand = |(lo, hi): (f64, f64)| {
            let span = hi - lo;
            if span == 0.0 {
                // Emprise nulle : ±1 m autour du point
                (lo - 1.0, 2.0)
            } else {
                (lo - style.margin_factor * span, span * (1.0 + 2.0 * style.margin_factor))
            }
        };
        let (x0, x_span) = expand(x);
        let (y0, y_span) = expand(y);

        Self {
            x0,
            y0,
            x_span,
            y_span,
            left: style.padding,
            top: style.padding,
            plot_width: style.width - 2.0 * style.padding,
            plot_height: style.height - 2.0 * style.padding,
        }
    }

    fn px(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.left + (x - self.x0) / self.x_span * self.plot_width,
            self.top + self.plot_height - (y - self.y0) / self.y_span * self.plot_height,
        )
    }

    fn right(&self) -> f64 {
        self.left + self.plot_width
    }

    fn bottom(&self) -> f64 {
        self.top + self.plot_height
    }
}

/// Génère le document SVG pour des sommets en coordonnées planes (mètres)
pub fn render_svg(points: &[(f64, f64)], scale: u32, style: &SurveyStyle) -> Result<String> {
    if points.is_empty() {
        bail!("Cannot draw a survey plan without vertices");
    }

    let (x_min, x_max) = bounds(points.iter().map(|p| p.0));
    let (y_min, y_max) = bounds(points.iter().map(|p| p.1));
    let view = Viewport::new((x_min, x_max), (y_min, y_max), style);

    let x_ticks = grid_ticks(x_min, x_max, style.margin_factor, style.grid_lines);
    let y_ticks = grid_ticks(y_min, y_max, style.margin_factor, style.grid_lines);
    let font = style.font_size;

    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = style.width,
        h = style.height
    )?;
    writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
    writeln!(
        svg,
        r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="black" stroke-width="1"/>"#,
        view.left, view.top, view.plot_width, view.plot_height
    )?;

    // Quadrillage et graduations sur les quatre côtés
    writeln!(svg, r#"<g stroke="gray" stroke-dasharray="6,4" stroke-width="0.5">"#)?;
    for &tick in &x_ticks {
        let (px, _) = view.px(tick as f64, y_min);
        writeln!(
            svg,
            r#"<line x1="{px:.2}" y1="{:.2}" x2="{px:.2}" y2="{:.2}"/>"#,
            view.top,
            view.bottom()
        )?;
    }
    for &tick in &y_ticks {
        let (_, py) = view.px(x_min, tick as f64);
        writeln!(
            svg,
            r#"<line x1="{:.2}" y1="{py:.2}" x2="{:.2}" y2="{py:.2}"/>"#,
            view.left,
            view.right()
        )?;
    }
    writeln!(svg, "</g>")?;

    writeln!(svg, r#"<g font-family="sans-serif" font-size="{font}" text-anchor="middle">"#)?;
    for &tick in &x_ticks {
        let (px, _) = view.px(tick as f64, y_min);
        writeln!(svg, r#"<text x="{px:.2}" y="{:.2}">{tick}</text>"#, view.bottom() + 2.0 * font)?;
        writeln!(svg, r#"<text x="{px:.2}" y="{:.2}">{tick}</text>"#, view.top - font)?;
    }
    for &tick in &y_ticks {
        let (_, py) = view.px(x_min, tick as f64);
        let (lx, rx) = (view.left - font, view.right() + font);
        writeln!(
            svg,
            r#"<text x="{lx:.2}" y="{py:.2}" transform="rotate(-90 {lx:.2} {py:.2})">{tick}</text>"#
        )?;
        writeln!(
            svg,
            r#"<text x="{rx:.2}" y="{py:.2}" transform="rotate(-270 {rx:.2} {py:.2})">{tick}</text>"#
        )?;
    }
    writeln!(svg, "</g>")?;

    // Tracé
    let path: Vec<String> = points
        .iter()
        .map(|&(x, y)| {
            let (px, py) = view.px(x, y);
            format!("{:.2},{:.2}", px, py)
        })
        .collect();
    writeln!(
        svg,
        r#"<polyline points="{}" fill="none" stroke="black" stroke-width="1"/>"#,
        path.join(" ")
    )?;

    // Longueurs des segments, décalées perpendiculairement au texte
    let labels = segment_labels(points);
    writeln!(svg, r#"<g font-family="sans-serif" font-size="{font}" text-anchor="middle" dominant-baseline="central">"#)?;
    for label in &labels {
        let (mx, my) = view.px(label.mid.0, label.mid.1);
        let normal = (label.rotation + 90.0).to_radians();
        let tx = mx + style.label_offset * normal.cos();
        let ty = my - style.label_offset * normal.sin();
        writeln!(
            svg,
            r#"<text x="{tx:.2}" y="{ty:.2}" transform="rotate({:.2} {tx:.2} {ty:.2})">{}</text>"#,
            -label.rotation,
            label.text
        )?;
    }
    writeln!(svg, "</g>")?;

    // Sommets, sauf le dernier (fermeture du polygone)
    writeln!(svg, r#"<g font-family="sans-serif" font-size="{font}" text-anchor="middle" dominant-baseline="central" fill="red">"#)?;
    for (i, &(x, y)) in points.iter().enumerate().take(labels.len()) {
        let (px, py) = view.px(x, y);
        writeln!(svg, r#"<circle cx="{px:.2}" cy="{py:.2}" r="3"/>"#)?;
        writeln!(svg, r#"<text x="{px:.2}" y="{py:.2}">{}</text>"#, vertex_label(i))?;
    }
    writeln!(svg, "</g>")?;

    writeln!(
        svg,
        r#"<text x="{:.2}" y="{:.2}" font-family="sans-serif" font-size="{font}">Escala 1:{scale}</text>"#,
        style.width * 0.8,
        style.height * 0.98
    )?;
    writeln!(svg, "</svg>")?;

    debug!(vertices = points.len(), x_ticks = x_ticks.len(), y_ticks = y_ticks.len(), "Survey rendered");
    Ok(svg)
}

/// Sommets de la première feature, projetés en UTM si `zone` est fourni
///
/// Polygone : anneau extérieur. Ligne : ses sommets dans l'ordre.
pub fn survey_points(layer: &Layer, zone: Option<UtmZone>) -> Result<Vec<(f64, f64)>> {
    let Some(feature) = layer.features.first() else {
        bail!("Layer has no feature to draw");
    };

    let geometry = match zone {
        Some(zone) => ReprojectorLite::to_utm(zone).transform_geometry(&feature.geometry)?,
        None => feature.geometry.clone(),
    };

    let points: Vec<(f64, f64)> = match &geometry {
        Geometry::Polygon(p) => p.exterior().coords().map(|c| (c.x, c.y)).collect(),
        Geometry::MultiPolygon(mp) => match mp.0.first() {
            Some(p) => p.exterior().coords().map(|c| (c.x, c.y)).collect(),
            None => Vec::new(),
        },
        Geometry::LineString(ls) => ls.coords().map(|c| (c.x, c.y)).collect(),
        other => other.coords_iter().map(|c| (c.x, c.y)).collect(),
    };

    if points.is_empty() {
        bail!("Feature {} has no vertex", feature.label());
    }
    Ok(points)
}

/// Zone UTM du premier sommet de la couche (WGS84)
pub fn auto_zone(layer: &Layer) -> Option<UtmZone> {
    layer
        .geometries()
        .flat_map(|g| g.coords_iter())
        .next()
        .map(|c| UtmZone::for_lon_lat(c.x, c.y))
}

/// Écrit le plan SVG dans un fichier
pub fn write_survey(points: &[(f64, f64)], scale: u32, style: &SurveyStyle, path: &Path) -> Result<()> {
    let svg = render_svg(points, scale, style)?;
    std::fs::write(path, svg).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), vertices = points.len(), scale, "Survey plan written");
    Ok(())
}
