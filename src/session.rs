// SPDX: CC0-1.0

use crate::{
    error::{PlotError, Result},
    eval::Program,
    grid::{Axis, GridLine, GridPlanner, Label, Line},
    parse,
    sample::{self, CurveSampler, Kind, SamplerConfig, Shape},
    view::{ViewError, ViewTransform},
    Number, Point, ViewRect, Viewport,
};
use core::fmt;
use std::sync::Arc;

/// Stable identity of a registered expression. Never reused by a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpressionId(u32);

impl ExpressionId {
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ExpressionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl core::str::FromStr for ExpressionId {
    type Err = core::num::ParseIntError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        s.trim_start_matches('#').parse().map(Self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const PALETTE: [Self; 8] = [
        Self::rgb(255, 0, 0),
        Self::rgb(0, 0, 255),
        Self::rgb(0, 255, 0),
        Self::rgb(255, 255, 0),
        Self::rgb(255, 0, 255),
        Self::rgb(0, 255, 255),
        Self::rgb(255, 165, 0),
        Self::rgb(128, 0, 128),
    ];

    pub fn for_id(id: ExpressionId) -> Self {
        Self::PALETTE[id.0 as usize % Self::PALETTE.len()]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Clone, Debug)]
pub struct Expression {
    pub id: ExpressionId,
    pub text: Arc<String>,
    pub color: Color,
    pub kind: Kind,
    pub program: Program,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CurveGeometry {
    pub id: ExpressionId,
    pub color: Color,
    pub text: Arc<String>,
    pub shape: Shape,
}

/// Everything the host draws for one redraw, in screen coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub grid_lines: Vec<GridLine>,
    pub axis_lines: Vec<(Axis, Line)>,
    pub labels: Vec<Label>,
    pub curves: Vec<CurveGeometry>,
}

#[derive(Debug)]
pub struct Session {
    expressions: Vec<Expression>,
    next_id: u32,
    view: ViewTransform,
    strict: bool,
    sampler: CurveSampler,
    grid: GridPlanner,
}

impl Session {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            expressions: Vec::new(),
            next_id: 0,
            view: ViewTransform::new(ViewRect::DEFAULT, viewport),
            strict: false,
            sampler: CurveSampler::default(),
            grid: GridPlanner::default(),
        }
    }

    /// Reject malformed expressions at registration instead of plotting
    /// whatever part of them parses.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_sampler(mut self, config: SamplerConfig) -> Self {
        self.sampler = CurveSampler::new(config);
        self
    }

    pub fn with_view(mut self, rect: ViewRect) -> Self {
        self.view.set_view(rect);
        self
    }

    pub fn register_expression(&mut self, text: &str) -> Result<ExpressionId> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PlotError::EmptyExpression);
        }
        let program = if self.strict {
            parse::parse_strict(text)?
        } else {
            parse::parse(text)
        };

        let id = ExpressionId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(PlotError::IdsExhausted)?;
        let kind = sample::classify(program.src());
        tracing::info!(%id, text, ?kind, "registered expression");
        self.expressions.push(Expression {
            id,
            text: Arc::new(text.to_string()),
            color: Color::for_id(id),
            kind,
            program,
        });
        Ok(id)
    }

    pub fn remove(&mut self, id: ExpressionId) -> Result<Expression> {
        let idx = self
            .expressions
            .iter()
            .position(|expr| expr.id == id)
            .ok_or(PlotError::UnknownExpression(id))?;
        tracing::info!(%id, "removed expression");
        Ok(self.expressions.remove(idx))
    }

    pub fn clear_all(&mut self) {
        tracing::info!(count = self.expressions.len(), "cleared expressions");
        self.expressions.clear();
    }

    pub fn expressions(&self) -> core::slice::Iter<'_, Expression> {
        self.expressions.iter()
    }

    pub fn get(&self, id: ExpressionId) -> Option<&Expression> {
        self.expressions.iter().find(|expr| expr.id == id)
    }

    pub const fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn set_view(
        &mut self,
        x_min: Number,
        x_max: Number,
        y_min: Number,
        y_max: Number,
    ) -> Result<()> {
        let rect = ViewRect::new(x_min, x_max, y_min, y_max).ok_or(ViewError::BadBounds)?;
        self.view.set_view(rect);
        tracing::debug!(view = %rect, "view set");
        Ok(())
    }

    pub fn reset_view(&mut self) {
        self.view.set_view(ViewRect::DEFAULT);
        tracing::info!("view reset");
    }

    pub fn pan(&mut self, dx: Number, dy: Number) -> Result<()> {
        self.view
            .pan(dx, dy)
            .inspect_err(|err| tracing::warn!(%err, "pan rejected"))?;
        Ok(())
    }

    pub fn zoom(&mut self, factor: Number, focal: Point<Number>) -> Result<()> {
        self.view
            .zoom(factor, focal)
            .inspect_err(|err| tracing::warn!(%err, "zoom rejected"))?;
        Ok(())
    }

    /// Build this frame's geometry from scratch.
    pub fn compute_frame_geometry(&mut self, viewport: Viewport) -> Frame {
        self.view.set_viewport(viewport);
        let view = &self.view;

        let curves: Vec<CurveGeometry> = self
            .expressions
            .iter()
            .map(|expr| CurveGeometry {
                id: expr.id,
                color: expr.color,
                text: Arc::clone(&expr.text),
                shape: self.sampler.sample(&expr.program, expr.kind, view),
            })
            .collect();

        let frame = Frame {
            grid_lines: self.grid.grid_lines(view),
            axis_lines: self.grid.axis_lines(view),
            labels: self.grid.labels(view),
            curves,
        };
        tracing::debug!(
            %viewport,
            grid_lines = frame.grid_lines.len(),
            labels = frame.labels.len(),
            points = frame.curves.iter().map(|c| c.shape.point_count()).sum::<usize>(),
            "computed frame"
        );
        frame
    }
}
