//! # Chart
//! Rendering collaborator for the topic distribution. The aggregation in
//! [`crate::topics`] stays pure; this is the only place that touches disk.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use crate::topics::TopicDistribution;

pub const CHART_TITLE: &str = "Share of Topics in News Articles";

/// Slice colors, cycled.
const PALETTE: [&str; 4] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728"];

pub trait ChartRenderer: Send + Sync {
    /// Render `dist`, replacing any previous output.
    fn render(&self, dist: &TopicDistribution) -> Result<()>;
}

/// Writes an SVG pie chart to a fixed path.
#[derive(Debug, Clone)]
pub struct SvgPieChart {
    path: PathBuf,
    size: u32,
}

impl SvgPieChart {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: 400,
        }
    }

    /// SVG document for `dist`.
    pub fn to_svg(&self, dist: &TopicDistribution) -> String {
        let size = self.size as f64;
        let (cx, cy) = (size / 2.0, size / 2.0 + 15.0);
        let r = size * 0.32;

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{s}" height="{s}" viewBox="0 0 {s} {s}">"#,
            s = self.size
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
        let _ = writeln!(
            svg,
            r#"<text x="{cx}" y="28" text-anchor="middle" font-family="sans-serif" font-size="16">{CHART_TITLE}</text>"#
        );

        let shares = dist.shares();
        if shares.is_empty() {
            let _ = writeln!(
                svg,
                r##"<text x="{cx}" y="{cy}" text-anchor="middle" font-family="sans-serif" font-size="13" fill="#666">No topic mentions</text>"##
            );
            svg.push_str("</svg>\n");
            return svg;
        }

        // Start at 12 o'clock and go counter-clockwise.
        let mut angle = 90.0_f64;
        for (i, (topic, pct)) in shares.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            let sweep = 360.0 * pct / 100.0;
            let end = angle + sweep;

            if sweep >= 359.999 {
                let _ = writeln!(
                    svg,
                    r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}" fill="{color}"/>"#
                );
            } else {
                let (x0, y0) = point(cx, cy, r, angle);
                let (x1, y1) = point(cx, cy, r, end);
                let large = u8::from(sweep > 180.0);
                let _ = writeln!(
                    svg,
                    r#"<path d="M {cx:.2} {cy:.2} L {x0:.2} {y0:.2} A {r:.2} {r:.2} 0 {large} 0 {x1:.2} {y1:.2} Z" fill="{color}"/>"#
                );
            }

            let mid = angle + sweep / 2.0;
            let (lx, ly) = point(cx, cy, r * 1.18, mid);
            let anchor = if lx >= cx { "start" } else { "end" };
            let _ = writeln!(
                svg,
                r#"<text x="{lx:.2}" y="{ly:.2}" text-anchor="{anchor}" font-family="sans-serif" font-size="12">{}</text>"#,
                html_escape::encode_text(topic)
            );
            let (px, py) = point(cx, cy, r * 0.6, mid);
            let _ = writeln!(
                svg,
                r#"<text x="{px:.2}" y="{py:.2}" text-anchor="middle" font-family="sans-serif" font-size="11" fill="white">{pct:.1}%</text>"#
            );

            angle = end;
        }

        svg.push_str("</svg>\n");
        svg
    }
}

impl ChartRenderer for SvgPieChart {
    fn render(&self, dist: &TopicDistribution) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating chart dir {}", dir.display()))?;
        }
        // Write beside the target, then rename over it.
        let tmp = self.path.with_extension("svg.tmp");
        fs::write(&tmp, self.to_svg(dist))
            .with_context(|| format!("writing chart to {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing chart at {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), topics = dist.counts().len(), "topic chart rendered");
        Ok(())
    }
}

/// Point on the circle at `deg` degrees (counter-clockwise from 3 o'clock),
/// in SVG's y-down coordinates.
fn point(cx: f64, cy: f64, r: f64, deg: f64) -> (f64, f64) {
    let rad = deg.to_radians();
    (cx + r * rad.cos(), cy - r * rad.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::Article;
    use crate::topics::aggregate;

    fn dist(titles: &[&str]) -> TopicDistribution {
        let items: Vec<_> = titles.iter().map(|t| Article::new(*t, "", "", "")).collect();
        aggregate(&items)
    }

    #[test]
    fn svg_has_one_slice_per_topic_with_percent_labels() {
        let svg = SvgPieChart::new("x.svg").to_svg(&dist(&["solar", "solar", "wind", "natural gas"]));
        assert_eq!(svg.matches("<path").count(), 3);
        assert!(svg.contains("50.0%"));
        assert!(svg.contains("25.0%"));
        assert!(svg.contains(CHART_TITLE));
        assert!(svg.contains(">natural gas<"));
    }

    #[test]
    fn single_topic_draws_full_circle() {
        let svg = SvgPieChart::new("x.svg").to_svg(&dist(&["wind"]));
        assert!(svg.contains("<circle"));
        assert!(svg.contains("100.0%"));
    }

    #[test]
    fn empty_distribution_renders_placeholder() {
        let svg = SvgPieChart::new("x.svg").to_svg(&TopicDistribution::default());
        assert!(svg.contains("No topic mentions"));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn render_overwrites_fixed_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("static").join("topic_pie_chart.svg");
        let chart = SvgPieChart::new(&path);

        chart.render(&dist(&["solar"])).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        chart.render(&dist(&["wind", "oil and gas"])).unwrap();
        let second = fs::read_to_string(&path).unwrap();

        assert_ne!(first, second);
        assert!(second.contains(">oil and gas<"));
        assert!(!path.with_extension("svg.tmp").exists());
    }
}
