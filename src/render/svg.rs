// src/render/svg.rs
//
// Server-side chart drawing. Each function returns a standalone <svg> element
// sized WIDTH x HEIGHT; the page embeds them inline.

use crate::aggregate::{CategorySpread, DensityCurve, Histogram};
use crate::render::format::format_tick;
use crate::render::Point;

pub const WIDTH: f64 = 720.0;
pub const HEIGHT: f64 = 380.0;

const BAR_FILL: &str = "#4c78a8";
const LINE_STROKE: &str = "#f58518";
const KDE_STROKE: &str = "#1f3b5c";
const BOX_FILL: &str = "#9ecae9";
const GRID: &str = "#e6e6e6";
const AXIS: &str = "#444";

/// Categorical labels are rotated once there are more than this many.
const ROTATE_AFTER: usize = 6;
const Y_TICKS: f64 = 5.0;

/// Escape text for XML/HTML content and attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Plot area inside the canvas.
#[derive(Debug, Clone, Copy)]
struct Frame {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

impl Frame {
    fn new(top: f64, bottom_margin: f64) -> Self {
        Self {
            left: 70.0,
            right: WIDTH - 20.0,
            top,
            bottom: HEIGHT - bottom_margin,
        }
    }

    fn width(&self) -> f64 {
        self.right - self.left
    }
}

#[derive(Debug, Clone, Copy)]
struct LinearScale {
    d0: f64,
    d1: f64,
    r0: f64,
    r1: f64,
}

impl LinearScale {
    fn map(&self, v: f64) -> f64 {
        if self.d1 == self.d0 {
            return self.r0;
        }
        self.r0 + (v - self.d0) / (self.d1 - self.d0) * (self.r1 - self.r0)
    }
}

/// 1, 2 or 5 times a power of ten, at least `raw`.
fn nice_step(raw: f64) -> f64 {
    if !(raw > 0.0) || !raw.is_finite() {
        return 1.0;
    }
    let exp = 10f64.powf(raw.log10().floor());
    let f = raw / exp;
    let nice = if f <= 1.0 {
        1.0
    } else if f <= 2.0 {
        2.0
    } else if f <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * exp
}

/// Widen `[lo, hi]` to whole tick steps; returns (lo, hi, step).
fn nice_domain(lo: f64, hi: f64) -> (f64, f64, f64) {
    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo, lo + 1.0) };
    let step = nice_step((hi - lo) / Y_TICKS);
    ((lo / step).floor() * step, (hi / step).ceil() * step, step)
}

fn ticks(lo: f64, hi: f64, step: f64) -> Vec<f64> {
    let n = ((hi - lo) / step).round() as usize;
    (0..=n).map(|i| lo + step * i as f64).collect()
}

fn open(out: &mut String, title: Option<&str>) {
    out.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}" font-family="sans-serif" font-size="12">"#,
        w = WIDTH,
        h = HEIGHT
    ));
    if let Some(t) = title {
        out.push_str(&format!(
            r#"<text x="{}" y="20" text-anchor="middle" font-size="15" font-weight="bold">{}</text>"#,
            WIDTH / 2.0,
            escape(t)
        ));
    }
}

fn empty_chart(title: Option<&str>) -> String {
    let mut out = String::new();
    open(&mut out, title);
    out.push_str(&format!(
        r#"<text x="{}" y="{}" text-anchor="middle" fill="{}">Sin datos</text></svg>"#,
        WIDTH / 2.0,
        HEIGHT / 2.0,
        AXIS
    ));
    out
}

/// Horizontal grid lines with tick labels on the left.
fn y_axis(out: &mut String, frame: &Frame, scale: &LinearScale, tick_values: &[f64]) {
    for t in tick_values {
        let y = scale.map(*t);
        out.push_str(&format!(
            r#"<line x1="{l}" x2="{r}" y1="{y:.2}" y2="{y:.2}" stroke="{g}"/><text x="{tx}" y="{ty:.2}" text-anchor="end">{label}</text>"#,
            l = frame.left,
            r = frame.right,
            y = y,
            g = GRID,
            tx = frame.left - 6.0,
            ty = y + 4.0,
            label = format_tick(*t)
        ));
    }
    out.push_str(&format!(
        r#"<line x1="{l}" x2="{l}" y1="{t}" y2="{b}" stroke="{a}"/><line x1="{l}" x2="{r}" y1="{b}" y2="{b}" stroke="{a}"/>"#,
        l = frame.left,
        r = frame.right,
        t = frame.top,
        b = frame.bottom,
        a = AXIS
    ));
}

fn axis_labels(out: &mut String, frame: &Frame, x_label: &str, y_label: &str) {
    out.push_str(&format!(
        r#"<text x="{x}" y="{y}" text-anchor="middle">{label}</text>"#,
        x = frame.left + frame.width() / 2.0,
        y = HEIGHT - 6.0,
        label = escape(x_label)
    ));
    let cy = (frame.top + frame.bottom) / 2.0;
    out.push_str(&format!(
        r#"<text x="16" y="{cy}" text-anchor="middle" transform="rotate(-90, 16, {cy})">{label}</text>"#,
        cy = cy,
        label = escape(y_label)
    ));
}

/// Label under a categorical slot, optionally rotated 45° and right-aligned
/// to its tick.
fn category_label(out: &mut String, x: f64, y: f64, label: &str, rotate: bool) {
    if rotate {
        out.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end" transform="rotate(-45, {x:.2}, {y:.2})">{label}</text>"#,
            x = x,
            y = y,
            label = escape(label)
        ));
    } else {
        out.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
            x = x,
            y = y + 4.0,
            label = escape(label)
        ));
    }
}

fn should_rotate(labels: &[&str]) -> bool {
    labels.len() > ROTATE_AFTER || labels.iter().any(|l| l.chars().count() > 12)
}

fn value_domain(values: impl Iterator<Item = f64>) -> (f64, f64, f64) {
    let (lo, hi) = values.fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    nice_domain(lo, hi)
}

pub fn bar_chart(points: &[Point]) -> String {
    if points.is_empty() {
        return empty_chart(None);
    }
    let labels: Vec<&str> = points.iter().map(|p| p.label.as_str()).collect();
    let rotate = should_rotate(&labels);
    let frame = Frame::new(20.0, if rotate { 100.0 } else { 40.0 });

    let (lo, hi, step) = value_domain(points.iter().map(|p| p.value));
    let y = LinearScale {
        d0: lo,
        d1: hi,
        r0: frame.bottom,
        r1: frame.top,
    };

    let mut out = String::new();
    open(&mut out, None);
    y_axis(&mut out, &frame, &y, &ticks(lo, hi, step));

    let band = frame.width() / points.len() as f64;
    for (i, p) in points.iter().enumerate() {
        let x = frame.left + band * i as f64 + band * 0.1;
        let top = y.map(p.value.max(0.0));
        let base = y.map(p.value.min(0.0));
        out.push_str(&format!(
            r#"<rect x="{x:.2}" y="{top:.2}" width="{w:.2}" height="{h:.2}" fill="{fill}"><title>{label}: {value}</title></rect>"#,
            x = x,
            top = top,
            w = band * 0.8,
            h = (base - top).max(0.0),
            fill = BAR_FILL,
            label = escape(&p.label),
            value = format_tick(p.value)
        ));
        category_label(
            &mut out,
            frame.left + band * (i as f64 + 0.5),
            frame.bottom + 14.0,
            &p.label,
            rotate,
        );
    }
    out.push_str("</svg>");
    out
}

pub fn line_chart(points: &[Point]) -> String {
    if points.is_empty() {
        return empty_chart(None);
    }
    let labels: Vec<&str> = points.iter().map(|p| p.label.as_str()).collect();
    let rotate = should_rotate(&labels);
    let frame = Frame::new(20.0, if rotate { 100.0 } else { 40.0 });

    let (lo, hi, step) = value_domain(points.iter().map(|p| p.value));
    let y = LinearScale {
        d0: lo,
        d1: hi,
        r0: frame.bottom,
        r1: frame.top,
    };

    let mut out = String::new();
    open(&mut out, None);
    y_axis(&mut out, &frame, &y, &ticks(lo, hi, step));

    let band = frame.width() / points.len() as f64;
    let coords: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| (frame.left + band * (i as f64 + 0.5), y.map(p.value)))
        .collect();

    let path: Vec<String> = coords
        .iter()
        .map(|(x, y)| format!("{:.2},{:.2}", x, y))
        .collect();
    out.push_str(&format!(
        r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
        path.join(" "),
        LINE_STROKE
    ));
    for ((x, cy), p) in coords.iter().zip(points) {
        out.push_str(&format!(
            r#"<circle cx="{x:.2}" cy="{cy:.2}" r="3.5" fill="{s}"><title>{label}: {value}</title></circle>"#,
            x = x,
            cy = cy,
            s = LINE_STROKE,
            label = escape(&p.label),
            value = format_tick(p.value)
        ));
        category_label(&mut out, *x, frame.bottom + 14.0, &p.label, rotate);
    }
    out.push_str("</svg>");
    out
}

/// Histogram bars with the density curve drawn over them.
pub fn distribution_chart(
    title: &str,
    x_label: &str,
    y_label: &str,
    histogram: Option<&Histogram>,
    density: Option<&DensityCurve>,
) -> String {
    let hist = match histogram {
        Some(h) if !h.counts.is_empty() => h,
        _ => return empty_chart(Some(title)),
    };
    let frame = Frame::new(36.0, 50.0);

    let (x_lo, x_hi) = match (hist.edges.first(), hist.edges.last()) {
        (Some(lo), Some(hi)) => (*lo, *hi),
        _ => return empty_chart(Some(title)),
    };
    let x = LinearScale {
        d0: x_lo,
        d1: x_hi,
        r0: frame.left,
        r1: frame.right,
    };

    let peak = density
        .map(|d| d.ys.iter().copied().fold(0.0f64, f64::max))
        .unwrap_or(0.0)
        .max(hist.max_count() as f64);
    let (lo, hi, step) = nice_domain(0.0, peak);
    let y = LinearScale {
        d0: lo,
        d1: hi,
        r0: frame.bottom,
        r1: frame.top,
    };

    let mut out = String::new();
    open(&mut out, Some(title));
    y_axis(&mut out, &frame, &y, &ticks(lo, hi, step));

    for (i, count) in hist.counts.iter().enumerate() {
        let x0 = x.map(hist.edges[i]);
        let x1 = x.map(hist.edges[i + 1]);
        let top = y.map(*count as f64);
        out.push_str(&format!(
            r#"<rect x="{x0:.2}" y="{top:.2}" width="{w:.2}" height="{h:.2}" fill="{fill}" fill-opacity="0.75" stroke="white"><title>{count}</title></rect>"#,
            x0 = x0,
            top = top,
            w = (x1 - x0).max(0.0),
            h = (frame.bottom - top).max(0.0),
            fill = BAR_FILL,
            count = count
        ));
    }

    if let Some(d) = density {
        let path: Vec<String> = d
            .xs
            .iter()
            .zip(&d.ys)
            .enumerate()
            .map(|(i, (px, py))| {
                format!(
                    "{}{:.2},{:.2}",
                    if i == 0 { "M" } else { "L" },
                    x.map(*px),
                    y.map(*py)
                )
            })
            .collect();
        out.push_str(&format!(
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
            path.join(" "),
            KDE_STROKE
        ));
    }

    let (_, _, x_step) = nice_domain(x_lo, x_hi);
    let first = (x_lo / x_step).ceil() * x_step;
    let mut t = first;
    while t <= x_hi + x_step * 1e-9 {
        let px = x.map(t);
        out.push_str(&format!(
            r#"<text x="{px:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
            px = px,
            y = frame.bottom + 16.0,
            label = format_tick(t)
        ));
        t += x_step;
    }

    axis_labels(&mut out, &frame, x_label, y_label);
    out.push_str("</svg>");
    out
}

/// One box per category, categories in the order given.
pub fn box_plot(title: &str, x_label: &str, y_label: &str, groups: &[CategorySpread]) -> String {
    if groups.is_empty() {
        return empty_chart(Some(title));
    }
    let frame = Frame::new(36.0, 110.0);

    let (lo, hi) = groups.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), g| {
            let (a, b) = g.stats.extent();
            (lo.min(a), hi.max(b))
        },
    );
    let (lo, hi, step) = nice_domain(lo.min(0.0), hi);
    let y = LinearScale {
        d0: lo,
        d1: hi,
        r0: frame.bottom,
        r1: frame.top,
    };

    let mut out = String::new();
    open(&mut out, Some(title));
    y_axis(&mut out, &frame, &y, &ticks(lo, hi, step));

    let band = frame.width() / groups.len() as f64;
    for (i, g) in groups.iter().enumerate() {
        let s = &g.stats;
        let cx = frame.left + band * (i as f64 + 0.5);
        let half = band * 0.3;
        let cap = band * 0.15;

        out.push_str(&format!(
            r#"<line x1="{cx:.2}" x2="{cx:.2}" y1="{lo:.2}" y2="{hi:.2}" stroke="{a}"/>"#,
            cx = cx,
            lo = y.map(s.whisker_low),
            hi = y.map(s.whisker_high),
            a = AXIS
        ));
        for w in [s.whisker_low, s.whisker_high] {
            out.push_str(&format!(
                r#"<line x1="{x1:.2}" x2="{x2:.2}" y1="{y:.2}" y2="{y:.2}" stroke="{a}"/>"#,
                x1 = cx - cap,
                x2 = cx + cap,
                y = y.map(w),
                a = AXIS
            ));
        }
        let top = y.map(s.q3);
        out.push_str(&format!(
            r#"<rect x="{x:.2}" y="{top:.2}" width="{w:.2}" height="{h:.2}" fill="{fill}" stroke="{a}"><title>{label}: Q1 {q1}, mediana {med}, Q3 {q3}</title></rect>"#,
            x = cx - half,
            top = top,
            w = half * 2.0,
            h = (y.map(s.q1) - top).max(0.0),
            fill = BOX_FILL,
            a = AXIS,
            label = escape(&g.category),
            q1 = format_tick(s.q1),
            med = format_tick(s.median),
            q3 = format_tick(s.q3)
        ));
        out.push_str(&format!(
            r#"<line x1="{x1:.2}" x2="{x2:.2}" y1="{y:.2}" y2="{y:.2}" stroke="{a}" stroke-width="2"/>"#,
            x1 = cx - half,
            x2 = cx + half,
            y = y.map(s.median),
            a = AXIS
        ));
        for o in &s.outliers {
            out.push_str(&format!(
                r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="3" fill="none" stroke="{a}"/>"#,
                cx = cx,
                cy = y.map(*o),
                a = AXIS
            ));
        }
        category_label(&mut out, cx, frame.bottom + 14.0, &g.category, true);
    }

    axis_labels(&mut out, &frame, x_label, y_label);
    out.push_str("</svg>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::BoxStats;

    fn pts(pairs: &[(&str, f64)]) -> Vec<Point> {
        pairs
            .iter()
            .map(|(l, v)| Point {
                label: l.to_string(),
                value: *v,
            })
            .collect()
    }

    #[test]
    fn escape_special_chars() {
        assert_eq!(escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn nice_domain_rounds_outward() {
        assert_eq!(nice_domain(0.0, 23.0), (0.0, 25.0, 5.0));
        let (lo, hi, _) = nice_domain(0.0, 0.0);
        assert!(lo == 0.0 && hi > lo);
        let (lo, hi, step) = nice_domain(0.0, 980.0);
        assert_eq!((lo, hi, step), (0.0, 1000.0, 200.0));
    }

    #[test]
    fn bar_chart_draws_one_rect_per_point() {
        let svg = bar_chart(&pts(&[("1", 25.0), ("2", 10.0), ("3", 0.0)]));
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<rect").count(), 3);
        assert!(svg.contains(">2<"));
    }

    #[test]
    fn many_bar_labels_are_rotated() {
        let many: Vec<(String, f64)> = (0..10).map(|i| (format!("P{}", i), i as f64)).collect();
        let refs: Vec<(&str, f64)> = many.iter().map(|(l, v)| (l.as_str(), *v)).collect();
        let svg = bar_chart(&pts(&refs));
        assert!(svg.contains("rotate(-45"));
    }

    #[test]
    fn labels_are_escaped() {
        let svg = bar_chart(&pts(&[("Hogar & Jardín", 1.0)]));
        assert!(svg.contains("Hogar &amp; Jardín"));
        assert!(!svg.contains("Hogar & Jardín"));
    }

    #[test]
    fn line_chart_has_polyline() {
        let svg = line_chart(&pts(&[("2023", 10.0), ("2024", 30.0)]));
        assert!(svg.contains("<polyline"));
        assert_eq!(svg.matches("<circle").count(), 2);
    }

    #[test]
    fn empty_inputs_render_placeholder() {
        assert!(bar_chart(&[]).contains("Sin datos"));
        assert!(line_chart(&[]).contains("Sin datos"));
        assert!(distribution_chart("t", "x", "y", None, None).contains("Sin datos"));
        assert!(box_plot("t", "x", "y", &[]).contains("Sin datos"));
    }

    #[test]
    fn distribution_draws_bins_and_curve() {
        let values = [20.0, 5.0, 9.0, 12.0, 30.0];
        let h = Histogram::from_values(&values).unwrap();
        let d = DensityCurve::estimate(&values, h.bin_width());
        let svg = distribution_chart("Distribución de Ventas", "Total Venta", "Frecuencia", Some(&h), d.as_ref());
        assert_eq!(svg.matches("<rect").count(), h.counts.len());
        assert!(svg.contains("<path d=\"M"));
        assert!(svg.contains("Frecuencia"));
    }

    #[test]
    fn box_plot_rotates_categories_and_marks_outliers() {
        let groups = vec![CategorySpread {
            category: "Ropa".into(),
            stats: BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap(),
        }];
        let svg = box_plot("Ventas por Categoría (Boxplot)", "Categoría", "Total Venta", &groups);
        assert!(svg.contains("rotate(-45"));
        assert_eq!(svg.matches("<circle").count(), 1);
        assert!(svg.contains("Ropa"));
    }
}
