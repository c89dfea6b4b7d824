// SPDX: CC0-1.0

use crate::{
    grid::{Axis, Line},
    sample::Shape,
    session::{Color, Frame},
    Number, Point, Viewport,
};
use core::fmt;
use std::io::{self, Write};

const BACKGROUND: Color = Color::rgb(0, 0, 0);
const GRID: Color = Color::rgb(40, 40, 40);
const GRID_ORIGIN: Color = Color::rgb(80, 80, 80);
const FOREGROUND: Color = Color::rgb(255, 255, 255);

const LABEL_SIZE: u32 = 12;
const LEGEND_SIZE: u32 = 14;
const LEGEND_ORIGIN: Point<Number> = Point::new(10.0, 10.0);
const LEGEND_SPACING: Number = 20.0;

/// Text with the XML special characters escaped.
struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '&' => f.write_str("&amp;")?,
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '"' => f.write_str("&quot;")?,
                _ => write!(f, "{c}")?,
            }
        }
        Ok(())
    }
}

fn line<W: Write>(mut out: W, line: &Line, color: Color) -> io::Result<()> {
    writeln!(
        out,
        r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{color}"/>"#,
        line.from.x, line.from.y, line.to.x, line.to.y,
    )
}

// text is positioned by its top-left corner
fn text<W: Write>(mut out: W, at: Point<Number>, body: &str) -> io::Result<()> {
    writeln!(
        out,
        r#"<text x="{:.2}" y="{:.2}" dominant-baseline="hanging">{}</text>"#,
        at.x,
        at.y,
        Escaped(body),
    )
}

pub fn write_svg<W: Write>(mut out: W, frame: &Frame, viewport: Viewport) -> io::Result<()> {
    let (width, height) = (viewport.width.get(), viewport.height.get());
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    )?;
    writeln!(
        out,
        r#"<rect width="{width}" height="{height}" fill="{BACKGROUND}"/>"#
    )?;

    writeln!(out, r#"<g stroke-width="1">"#)?;
    for grid_line in &frame.grid_lines {
        let color = if grid_line.origin { GRID_ORIGIN } else { GRID };
        line(&mut out, &grid_line.line, color)?;
    }
    for (_, axis) in &frame.axis_lines {
        line(&mut out, axis, FOREGROUND)?;
    }
    writeln!(out, "</g>")?;

    writeln!(
        out,
        r#"<g font-family="sans-serif" font-size="{LABEL_SIZE}" fill="{FOREGROUND}">"#
    )?;
    for label in &frame.labels {
        let offset = match label.axis {
            Axis::X => Point::new(-15.0, 5.0),
            Axis::Y => Point::new(5.0, -6.0),
        };
        let at = Point::new(label.anchor.x + offset.x, label.anchor.y + offset.y);
        text(&mut out, at, &label.text)?;
    }
    writeln!(out, "</g>")?;

    for curve in &frame.curves {
        match &curve.shape {
            Shape::Polylines(lines) => {
                writeln!(
                    out,
                    r#"<g fill="none" stroke="{}" stroke-width="1">"#,
                    curve.color
                )?;
                for points in lines {
                    write!(out, r#"<polyline points=""#)?;
                    for (i, p) in points.iter().enumerate() {
                        if i > 0 {
                            write!(out, " ")?;
                        }
                        write!(out, "{:.2},{:.2}", p.x, p.y)?;
                    }
                    writeln!(out, r#""/>"#)?;
                }
            }
            Shape::Points(points) => {
                writeln!(out, r#"<g fill="{}">"#, curve.color)?;
                for p in points {
                    writeln!(
                        out,
                        r#"<rect x="{:.2}" y="{:.2}" width="1" height="1"/>"#,
                        p.x, p.y
                    )?;
                }
            }
        }
        writeln!(out, "</g>")?;
    }

    writeln!(
        out,
        r#"<g font-family="sans-serif" font-size="{LEGEND_SIZE}">"#
    )?;
    for (i, curve) in frame.curves.iter().enumerate() {
        let at = Point::new(
            LEGEND_ORIGIN.x,
            LEGEND_ORIGIN.y + i as Number * LEGEND_SPACING,
        );
        write!(out, r#"<g fill="{}">"#, curve.color)?;
        text(&mut out, at, &curve.text)?;
        writeln!(out, "</g>")?;
    }
    writeln!(out, "</g>")?;

    writeln!(out, "</svg>")?;
    Ok(())
}
