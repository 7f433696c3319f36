//! Visualization utilities for PDP instances and solutions.
//!
//! Generates SVG pictures of the candidate points, with the selected points
//! highlighted in red.

use crate::instance::PDPInstance;
use crate::solution::Solution;
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// SVG visualization generator
pub struct Visualizer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
    /// Point radius
    pub point_radius: f64,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            point_radius: 4.0,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate SVG of all the points of an instance
    pub fn generate_instance_svg(&self, instance: &PDPInstance) -> String {
        let title = format!("Instance: {} | n = {} | p = {}", instance.name, instance.n(), instance.p);
        self.render(instance, &HashSet::new(), &title)
    }

    /// Generate SVG of an instance with the solution's points highlighted
    pub fn generate_svg(&self, instance: &PDPInstance, solution: &Solution) -> String {
        let title = format!(
            "Instance: {} | {} | Objective: {} | Feasible: {}",
            instance.name, solution.algorithm, solution.objective, solution.feasible
        );
        self.render(instance, &solution.index_set(), &title)
    }

    fn render(&self, instance: &PDPInstance, selected: &HashSet<usize>, title: &str) -> String {
        let mut svg = String::new();

        let (min_x, max_x, min_y, max_y) = self.get_bounds(instance);

        let scale_x = (self.width - 2.0 * self.margin) / (max_x - min_x).max(1.0);
        let scale_y = (self.height - 2.0 * self.margin) / (max_y - min_y).max(1.0);
        let scale = scale_x.min(scale_y);

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .candidate {{ fill: #3498db; stroke: #2c3e50; stroke-width: 0.5; opacity: 0.4; }}
    .selected {{ fill: #e74c3c; stroke: #2c3e50; stroke-width: 1; }}
    .label {{ font-family: Arial; font-size: 9px; fill: #2c3e50; opacity: 0.75; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
<text x="{}" y="25" class="title">{}</text>
"##,
            self.width, self.height, self.width, self.height, self.margin, title
        ));

        let transform = |x: f64, y: f64| -> (f64, f64) {
            let tx = self.margin + (x - min_x) * scale;
            let ty = self.height - self.margin - (y - min_y) * scale;
            (tx, ty)
        };

        // candidates first so selected points are drawn on top
        for point in instance.points.iter().filter(|pt| !selected.contains(&pt.index)) {
            let (x, y) = transform(point.x as f64, point.y as f64);
            svg.push_str(&format!(
                r#"<circle cx="{:.2}" cy="{:.2}" r="{}" class="candidate"/>
"#,
                x, y, self.point_radius
            ));
        }

        for point in instance.points.iter().filter(|pt| selected.contains(&pt.index)) {
            let (x, y) = transform(point.x as f64, point.y as f64);
            svg.push_str(&format!(
                r#"<circle cx="{:.2}" cy="{:.2}" r="{}" class="selected"/>
<text x="{:.2}" y="{:.2}" class="label">{}</text>
"#,
                x,
                y,
                self.point_radius,
                x + self.point_radius + 1.0,
                y - self.point_radius - 1.0,
                point.index
            ));
        }

        svg.push_str("</svg>");

        svg
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
        Ok(())
    }

    /// Get coordinate bounds
    fn get_bounds(&self, instance: &PDPInstance) -> (f64, f64, f64, f64) {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for point in &instance.points {
            min_x = min_x.min(point.x as f64);
            max_x = max_x.max(point.x as f64);
            min_y = min_y.min(point.y as f64);
            max_y = max_y.max(point.y as f64);
        }

        if instance.points.is_empty() {
            return (0.0, 1.0, 0.0, 1.0);
        }

        (min_x, max_x, min_y, max_y)
    }
}
