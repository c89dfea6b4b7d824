// SPDX: CC0-1.0

use crate::{view::ViewTransform, Number, Point};

/// How finely an axis range is divided.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Density {
    pub divisions: Number,
    pub min_steps: Number,
}

impl Density {
    pub const GRID: Self = Self {
        divisions: 10.0,
        min_steps: 5.0,
    };

    pub const LABELS: Self = Self {
        divisions: 6.0,
        min_steps: 4.0,
    };

    // 10^floor(log10(range / divisions)), halved when that leaves fewer than
    // min_steps steps across the range
    pub fn step(&self, range: Number) -> Option<Number> {
        if !(range.is_finite() && range > 0.0) {
            return None;
        }
        let mut step = Number::powf(10.0, (range / self.divisions).log10().floor());
        if range / step < self.min_steps {
            step /= 2.0;
        }
        (step.is_finite() && step > 0.0).then_some(step)
    }
}

/// Multiples of `step` in `[min, max]`, ascending.
pub fn positions(min: Number, max: Number, step: Number) -> impl Iterator<Item = Number> {
    let start = (min / step).ceil() * step;
    (0u32..)
        .map(move |i| start + Number::from(i) * step)
        .take_while(move |v| *v <= max)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Screen-space line segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    pub from: Point<Number>,
    pub to: Point<Number>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLine {
    pub axis: Axis,
    pub value: Number,
    pub line: Line,
    /// The line nearest zero, drawn brighter.
    pub origin: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub axis: Axis,
    pub value: Number,
    pub text: String,
    /// Screen point the label is attached to.
    pub anchor: Point<Number>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridPlanner {
    pub grid: Density,
    pub labels: Density,
    pub max_labels: usize,
}

impl Default for GridPlanner {
    fn default() -> Self {
        Self {
            grid: Density::GRID,
            labels: Density::LABELS,
            max_labels: 8,
        }
    }
}

// keeps labels readable near the viewport edges
const LABEL_TOP: Number = 15.0;
const LABEL_BOTTOM: Number = 20.0;
const LABEL_LEFT: Number = 5.0;
const LABEL_RIGHT: Number = 50.0;

impl GridPlanner {
    pub fn grid_lines(&self, view: &ViewTransform) -> Vec<GridLine> {
        let r = view.rect();
        let mut out = Vec::new();

        if let Some(step) = self.grid.step(r.x_range()) {
            out.extend(positions(r.x_min(), r.x_max(), step).map(|x| GridLine {
                axis: Axis::X,
                value: x,
                line: Line {
                    from: view.world_to_screen(Point::new(x, r.y_max())),
                    to: view.world_to_screen(Point::new(x, r.y_min())),
                },
                origin: x.abs() < step / 2.0,
            }));
        }

        if let Some(step) = self.grid.step(r.y_range()) {
            out.extend(positions(r.y_min(), r.y_max(), step).map(|y| GridLine {
                axis: Axis::Y,
                value: y,
                line: Line {
                    from: view.world_to_screen(Point::new(r.x_min(), y)),
                    to: view.world_to_screen(Point::new(r.x_max(), y)),
                },
                origin: y.abs() < step / 2.0,
            }));
        }

        out
    }

    /// Lines through the origin for each axis whose zero is visible.
    pub fn axis_lines(&self, view: &ViewTransform) -> Vec<(Axis, Line)> {
        let r = view.rect();
        let mut out = Vec::with_capacity(2);
        if r.y_min() <= 0.0 && r.y_max() >= 0.0 {
            out.push((
                Axis::X,
                Line {
                    from: view.world_to_screen(Point::new(r.x_min(), 0.0)),
                    to: view.world_to_screen(Point::new(r.x_max(), 0.0)),
                },
            ));
        }
        if r.x_min() <= 0.0 && r.x_max() >= 0.0 {
            out.push((
                Axis::Y,
                Line {
                    from: view.world_to_screen(Point::new(0.0, r.y_max())),
                    to: view.world_to_screen(Point::new(0.0, r.y_min())),
                },
            ));
        }
        out
    }

    pub fn labels(&self, view: &ViewTransform) -> Vec<Label> {
        let r = view.rect();
        let (width, height) = (view.viewport().width(), view.viewport().height());
        let mut out = Vec::new();

        if let Some(step) = self.labels.step(r.x_range()) {
            out.extend(self.label_values(r.x_min(), r.x_max(), step).map(|x| {
                let mut anchor = view.world_to_screen(Point::new(x, 0.0));
                anchor.y = anchor.y.min(height - LABEL_BOTTOM).max(LABEL_TOP);
                Label {
                    axis: Axis::X,
                    value: x,
                    text: format_label(x),
                    anchor,
                }
            }));
        }

        if let Some(step) = self.labels.step(r.y_range()) {
            out.extend(self.label_values(r.y_min(), r.y_max(), step).map(|y| {
                let mut anchor = view.world_to_screen(Point::new(0.0, y));
                anchor.x = anchor.x.min(width - LABEL_RIGHT).max(LABEL_LEFT);
                Label {
                    axis: Axis::Y,
                    value: y,
                    text: format_label(y),
                    anchor,
                }
            }));
        }

        out
    }

    // the origin is skipped but still counts towards the cap
    fn label_values(
        &self,
        min: Number,
        max: Number,
        step: Number,
    ) -> impl Iterator<Item = Number> {
        positions(min, max, step)
            .take(self.max_labels)
            .filter(move |v| v.abs() > step / 10.0)
    }
}

/// Format a label value: `0` for tiny magnitudes, `1e+04` style above 9999,
/// otherwise at most one fractional digit without trailing zeros.
pub fn format_label(value: Number) -> String {
    if value != 0.0 && value.abs() < 0.001 {
        return String::from("0");
    }
    if value.abs() > 9999.0 {
        // exponent as C prints it: explicit sign, at least two digits
        let sci = format!("{value:.0e}");
        if let Some((mantissa, exp)) = sci.split_once('e') {
            if let Ok(exp) = exp.parse::<i32>() {
                let sign = if exp < 0 { '-' } else { '+' };
                return format!("{mantissa}e{sign}{:02}", exp.abs());
            }
        }
        return sci;
    }
    let fixed = format!("{value:.1}");
    fixed
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ViewRect, Viewport};

    fn view(x_min: Number, x_max: Number, y_min: Number, y_max: Number) -> ViewTransform {
        ViewTransform::new(
            ViewRect::new(x_min, x_max, y_min, y_max).unwrap(),
            Viewport::new(1200, 700).unwrap(),
        )
    }

    fn is_nice(step: Number) -> bool {
        let near_int = |v: Number| (v - v.round()).abs() < 1e-9;
        near_int(step.log10()) || near_int((2.0 * step).log10())
    }

    #[test]
    fn picks_nice_steps() {
        assert_eq!(Density::GRID.step(20.0), Some(1.0));
        assert_eq!(Density::GRID.step(100.0), Some(10.0));
        assert_eq!(Density::LABELS.step(20.0), Some(1.0));
        assert_eq!(Density::LABELS.step(60.0), Some(10.0));
        assert_eq!(Density::GRID.step(0.0), None);
        assert_eq!(Density::GRID.step(Number::NAN), None);
    }

    #[test]
    fn halves_sparse_steps() {
        let dense = Density {
            divisions: 10.0,
            min_steps: 25.0,
        };
        // 20 / 1 = 20 steps is below 25, so the step halves
        assert_eq!(dense.step(20.0), Some(0.5));
    }

    #[test]
    fn steps_are_powers_of_ten_or_halves() {
        let mut range = 1e-6;
        while range < 1e9 {
            for density in [Density::GRID, Density::LABELS] {
                let step = density.step(range).unwrap();
                assert!(is_nice(step), "range {range} gave step {step}");
            }
            range *= 1.37;
        }
    }

    #[test]
    fn enumerates_positions_from_first_multiple() {
        let got: Vec<Number> = positions(-2.5, 3.0, 1.0).collect();
        assert_eq!(got, [-2.0, -1.0, 0.0, 1.0, 2.0, 3.0]);
        assert_eq!(positions(0.1, 0.9, 1.0).count(), 0);
    }

    #[test]
    fn marks_origin_gridlines() {
        let lines = GridPlanner::default().grid_lines(&view(-10.0, 10.0, -10.0, 10.0));
        let origins: Vec<_> = lines.iter().filter(|l| l.origin).collect();
        assert_eq!(origins.len(), 2);
        assert!(origins.iter().all(|l| l.value == 0.0));
        // 21 vertical and 21 horizontal lines at step 1
        assert_eq!(lines.len(), 42);
    }

    #[test]
    fn never_more_than_eight_labels_per_axis() {
        let planner = GridPlanner::default();
        for (x_min, x_max) in [(-10.0, 10.0), (0.0, 1e6), (-3.3, 97.1), (1e-3, 2e-3)] {
            let labels = planner.labels(&view(x_min, x_max, x_min, x_max));
            for axis in [Axis::X, Axis::Y] {
                assert!(labels.iter().filter(|l| l.axis == axis).count() <= 8);
            }
        }
    }

    #[test]
    fn skips_origin_label_and_clamps_anchors() {
        // zero is far below the view, x labels stick to the bottom margin
        let labels = GridPlanner::default().labels(&view(-10.0, 10.0, 50.0, 70.0));
        let xs: Vec<&Label> = labels.iter().filter(|l| l.axis == Axis::X).collect();
        assert!(xs.iter().all(|l| l.value != 0.0));
        assert!(xs.iter().all(|l| l.anchor.y == 700.0 - LABEL_BOTTOM));
        // zero is inside the view horizontally, y labels sit on the y axis
        let ys: Vec<&Label> = labels.iter().filter(|l| l.axis == Axis::Y).collect();
        assert!(!ys.is_empty());
        assert!(ys.iter().all(|l| l.anchor.x == 600.0));
    }

    #[test]
    fn axis_lines_only_when_zero_is_visible() {
        let planner = GridPlanner::default();
        assert_eq!(planner.axis_lines(&view(-1.0, 1.0, -1.0, 1.0)).len(), 2);
        let lines = planner.axis_lines(&view(1.0, 2.0, -1.0, 1.0));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Axis::X);
        assert!(planner.axis_lines(&view(1.0, 2.0, 1.0, 2.0)).is_empty());
    }

    #[test]
    fn formats_labels() {
        assert_eq!(format_label(0.0), "0");
        assert_eq!(format_label(0.0005), "0");
        assert_eq!(format_label(-0.0002), "0");
        assert_eq!(format_label(2.0), "2");
        assert_eq!(format_label(-2.5), "-2.5");
        assert_eq!(format_label(0.5), "0.5");
        assert_eq!(format_label(100.0), "100");
        assert_eq!(format_label(9999.0), "9999");
        assert_eq!(format_label(12345.0), "1e+04");
        assert_eq!(format_label(-260000.0), "-3e+05");
        assert_eq!(format_label(1e100), "1e+100");
    }
}
