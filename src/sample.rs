// SPDX: CC0-1.0

use crate::{
    eval::{Bindings, Program, Sample},
    view::ViewTransform,
    Number, Point,
};
use core::mem;

/// How an expression is plotted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `y = f(x)`, drawn as polylines.
    Explicit,
    /// `g(x, y) = 0`, drawn as a point cloud.
    Implicit,
}

/// Any `y` in the preprocessed text makes the expression implicit, even one
/// that is part of a longer name.
pub fn classify(preprocessed: &str) -> Kind {
    if preprocessed.contains('y') {
        Kind::Implicit
    } else {
        Kind::Explicit
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerConfig {
    pub max_explicit_samples: u32,
    pub samples_per_pixel: u32,
    /// Largest step between consecutive points of a polyline, as a fraction
    /// of the visible y range.
    pub max_jump: Number,
    pub max_implicit_resolution: u32,
    pub pixels_per_cell: u32,
    /// `|g(x, y)|` below this counts as on the curve.
    pub implicit_threshold: Number,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_explicit_samples: 1600,
            samples_per_pixel: 2,
            max_jump: 0.1,
            max_implicit_resolution: 150,
            pixels_per_cell: 3,
            implicit_threshold: 0.5,
        }
    }
}

/// Screen-space geometry of one expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Polylines(Vec<Vec<Point<Number>>>),
    Points(Vec<Point<Number>>),
}

impl Shape {
    pub fn point_count(&self) -> usize {
        match self {
            Self::Polylines(lines) => lines.iter().map(Vec::len).sum(),
            Self::Points(points) => points.len(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CurveSampler {
    pub config: SamplerConfig,
}

impl CurveSampler {
    pub const fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    pub fn sample(&self, prog: &Program, kind: Kind, view: &ViewTransform) -> Shape {
        match kind {
            Kind::Explicit => Shape::Polylines(self.explicit(|x| prog.eval(Bindings::x(x)), view)),
            Kind::Implicit => {
                Shape::Points(self.implicit(|p| prog.eval(Bindings::new(p.x, p.y)), view))
            }
        }
    }

    pub fn explicit_samples(&self, view: &ViewTransform) -> u32 {
        let c = &self.config;
        view.viewport()
            .width
            .get()
            .saturating_mul(c.samples_per_pixel)
            .min(c.max_explicit_samples)
    }

    pub fn implicit_resolution(&self, view: &ViewTransform) -> u32 {
        let c = &self.config;
        (view.viewport().width.get() / c.pixels_per_cell.max(1)).min(c.max_implicit_resolution)
    }

    /// Sample `f` across the visible x range and split the result into
    /// polylines wherever the curve is invalid, leaves the view, or jumps.
    pub fn explicit<F>(&self, mut f: F, view: &ViewTransform) -> Vec<Vec<Point<Number>>>
    where
        F: FnMut(Number) -> Sample,
    {
        let r = view.rect();
        let n = self.explicit_samples(view);
        let max_jump = self.config.max_jump * r.y_range();

        let mut lines = Vec::new();
        let mut line: Vec<Point<Number>> = Vec::new();
        let mut last: Option<Number> = None;
        let mut flush = |line: &mut Vec<Point<Number>>| {
            if line.len() >= 2 {
                lines.push(mem::take(line));
            } else {
                line.clear();
            }
        };

        for i in 0..n {
            let t = if n > 1 {
                Number::from(i) / Number::from(n - 1)
            } else {
                0.0
            };
            let x = r.x_min() * (1.0 - t) + r.x_max() * t;

            let visible = f(x)
                .value()
                .filter(|y| (r.y_min()..=r.y_max()).contains(y))
                .map(|y| (y, view.world_to_screen(Point::new(x, y))))
                .filter(|(_, p)| view.viewport().contains(*p));
            let Some((y, p)) = visible else {
                flush(&mut line);
                last = None;
                continue;
            };

            if last.is_some_and(|prev| (y - prev).abs() > max_jump) {
                flush(&mut line);
            }
            line.push(p);
            last = Some(y);
        }
        flush(&mut line);

        lines
    }

    /// Evaluate `f` on a regular grid over the view and keep the grid points
    /// where it is close to zero.
    ///
    /// This thresholds a sampled field; it does not trace contours, so steep
    /// relations come out thin or broken and flat ones come out thick.
    pub fn implicit<F>(&self, mut f: F, view: &ViewTransform) -> Vec<Point<Number>>
    where
        F: FnMut(Point<Number>) -> Sample,
    {
        let r = view.rect();
        let res = self.implicit_resolution(view);
        if res == 0 {
            return Vec::new();
        }
        let step = Point {
            x: r.x_range() / Number::from(res),
            y: r.y_range() / Number::from(res),
        };

        let mut points = Vec::new();
        for i in 0..res {
            for j in 0..res {
                let world = Point {
                    x: r.x_min() + Number::from(i) * step.x,
                    y: r.y_min() + Number::from(j) * step.y,
                };
                let Some(val) = f(world).value() else {
                    continue;
                };
                if val.abs() < self.config.implicit_threshold {
                    let p = view.world_to_screen(world);
                    if view.viewport().contains(p) {
                        points.push(p);
                    }
                }
            }
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lex::preprocess, parse::parse, ViewRect, Viewport};

    fn view(width: u32) -> ViewTransform {
        ViewTransform::new(ViewRect::DEFAULT, Viewport::new(width, 700).unwrap())
    }

    fn explicit(text: &str, view: &ViewTransform) -> Vec<Vec<Point<Number>>> {
        let prog = parse(text);
        match CurveSampler::default().sample(&prog, Kind::Explicit, view) {
            Shape::Polylines(lines) => lines,
            Shape::Points(_) => unreachable!(),
        }
    }

    #[test]
    fn classifies_by_substring() {
        assert_eq!(classify(&preprocess("sin(x)")), Kind::Explicit);
        assert_eq!(classify(&preprocess("x^2 + y^2 - 25")), Kind::Implicit);
        assert_eq!(classify(&preprocess("y")), Kind::Implicit);
        // "yy" is an unknown name, not the variable, but it still contains 'y'
        let text = "2x + yy*0";
        assert!(!parse(text).root().uses(crate::eval::Var::Y));
        assert_eq!(classify(&preprocess(text)), Kind::Implicit);
    }

    #[test]
    fn sample_counts_follow_viewport() {
        let sampler = CurveSampler::default();
        assert_eq!(sampler.explicit_samples(&view(300)), 600);
        assert_eq!(sampler.explicit_samples(&view(1200)), 1600);
        assert_eq!(sampler.implicit_resolution(&view(300)), 100);
        assert_eq!(sampler.implicit_resolution(&view(1200)), 150);
        assert_eq!(sampler.implicit_resolution(&view(2)), 0);

        let mut calls = 0;
        sampler.explicit(
            |_| {
                calls += 1;
                Sample::Value(0.0)
            },
            &view(1200),
        );
        assert_eq!(calls, 1600);

        let mut calls = 0;
        sampler.implicit(
            |_| {
                calls += 1;
                Sample::Invalid
            },
            &view(1200),
        );
        assert_eq!(calls, 150 * 150);
    }

    #[test]
    fn straight_line_is_one_polyline_spanning_the_view() {
        let v = view(400);
        let lines = explicit("x", &v);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 800);
        assert_eq!(lines[0][0], Point::new(0.0, 700.0));
        assert_eq!(lines[0][799], Point::new(400.0, 0.0));
    }

    #[test]
    fn asymptote_splits_the_curve() {
        let v = view(400);
        let lines = explicit("1/x", &v);
        assert!(lines.len() >= 2);
        let max_step = 0.1 * 700.0 + 1e-9;
        for line in &lines {
            assert!(line.len() >= 2);
            for pair in line.windows(2) {
                assert!((pair[1].y - pair[0].y).abs() <= max_step);
            }
        }
    }

    #[test]
    fn tan_never_jumps_more_than_a_tenth_of_the_view() {
        let v = view(800);
        let max_step = 0.1 * 700.0 + 1e-9;
        let lines = explicit("tan(x)", &v);
        assert!(lines.len() > 3);
        for line in &lines {
            for pair in line.windows(2) {
                assert!((pair[1].y - pair[0].y).abs() <= max_step);
            }
        }
    }

    #[test]
    fn invalid_and_out_of_range_samples_break_lines() {
        let sampler = CurveSampler::default();
        let v = view(400);
        let lines = sampler.explicit(
            |x| {
                if x.abs() < 1.0 {
                    Sample::Invalid
                } else {
                    Sample::Value(0.0)
                }
            },
            &v,
        );
        assert_eq!(lines.len(), 2);

        // parabola leaves the view at |x| = sqrt(10)
        let lines = explicit("x^2", &v);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].iter().all(|p| (0.0..=700.0).contains(&p.y)));
        assert!(lines[0].iter().all(|p| (120.0..=280.0).contains(&p.x)));
    }

    #[test]
    fn isolated_points_are_dropped() {
        let sampler = CurveSampler::default();
        let mut i = 0;
        let lines = sampler.explicit(
            |_| {
                i += 1;
                // every other sample is invalid
                if i % 2 == 0 {
                    Sample::Value(1.0)
                } else {
                    Sample::Invalid
                }
            },
            &view(400),
        );
        assert!(lines.is_empty());
    }

    #[test]
    fn implicit_circle_points_lie_near_the_circle() {
        let v = view(450);
        let prog = parse("x^2 + y^2 - 25");
        let Shape::Points(points) = CurveSampler::default().sample(&prog, Kind::Implicit, &v)
        else {
            unreachable!()
        };
        assert!(!points.is_empty());
        for p in points {
            let w = v.screen_to_world(p);
            assert!((w.x * w.x + w.y * w.y - 25.0).abs() < 0.5 + 1e-9);
            assert!(v.viewport().contains(p));
        }
    }

    #[test]
    fn implicit_ignores_invalid_samples() {
        let points = CurveSampler::default().implicit(|_| Sample::Invalid, &view(300));
        assert!(points.is_empty());
    }
}
