//! SVG serialization of a recorded [`Scene`].

use std::fmt::Write;

use super::surface::{AxisOrient, Primitive, Scene, TextAnchor, TextStyle, Tick};
use crate::chart::Stroke;
use crate::error::Result;

const TICK_SIZE: f64 = 6.0;
const TICK_PADDING: f64 = 3.0;
const TICK_FONT_SIZE: f64 = 10.0;

/// Format a coordinate with at most three decimals and no trailing zeros.
fn num(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let s = format!("{value:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn stroke_attrs(stroke: Option<&Stroke>) -> String {
    match stroke {
        None => String::new(),
        Some(s) => {
            let mut attrs = format!(
                " stroke=\"{}\" stroke-width=\"{}\"",
                escape(&s.color),
                num(s.width)
            );
            if let Some(dash) = s.dash {
                attrs.push_str(&format!(" stroke-dasharray=\"{}\"", num(dash)));
            }
            attrs
        }
    }
}

fn fill_attr(fill: Option<&String>) -> String {
    match fill {
        Some(color) => format!(" fill=\"{}\"", escape(color)),
        None => " fill=\"none\"".to_string(),
    }
}

fn opacity_attr(opacity: f64) -> String {
    if opacity < 1.0 {
        format!(" opacity=\"{}\"", num(opacity))
    } else {
        String::new()
    }
}

fn anchor_name(anchor: TextAnchor) -> &'static str {
    match anchor {
        TextAnchor::Start => "start",
        TextAnchor::Middle => "middle",
        TextAnchor::End => "end",
    }
}

fn write_text(out: &mut String, position: (f64, f64), text: &str, style: &TextStyle) -> Result<()> {
    let transform = match style.rotate {
        Some(deg) => format!(" transform=\"rotate({})\"", num(deg)),
        None => String::new(),
    };
    let weight = if style.bold { " font-weight=\"bold\"" } else { "" };
    writeln!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"{}\" text-anchor=\"{}\"{}{}>{}</text>",
        num(position.0),
        num(position.1),
        num(style.size),
        anchor_name(style.anchor),
        weight,
        transform,
        escape(text)
    )?;
    Ok(())
}

fn write_axis(
    out: &mut String,
    orient: AxisOrient,
    offset: f64,
    range: (f64, f64),
    ticks: &[Tick],
    rotate_labels: bool,
) -> Result<()> {
    match orient {
        AxisOrient::Bottom => {
            writeln!(out, "<g class=\"axis x-axis\" transform=\"translate(0,{})\">", num(offset))?;
            writeln!(
                out,
                "<line x1=\"{}\" y1=\"0\" x2=\"{}\" y2=\"0\" stroke=\"currentColor\"/>",
                num(range.0),
                num(range.1)
            )?;
            for tick in ticks {
                writeln!(
                    out,
                    "<g transform=\"translate({},0)\"><line y2=\"{}\" stroke=\"currentColor\"/>",
                    num(tick.offset),
                    num(TICK_SIZE)
                )?;
                let style = if rotate_labels {
                    TextStyle::new(TICK_FONT_SIZE)
                        .anchor(TextAnchor::End)
                        .rotate(-45.0)
                } else {
                    TextStyle::new(TICK_FONT_SIZE).anchor(TextAnchor::Middle)
                };
                let y = TICK_SIZE + TICK_PADDING + TICK_FONT_SIZE;
                write_text(out, (0.0, y), &tick.label, &style)?;
                writeln!(out, "</g>")?;
            }
        }
        AxisOrient::Left => {
            writeln!(out, "<g class=\"axis y-axis\" transform=\"translate({},0)\">", num(offset))?;
            writeln!(
                out,
                "<line x1=\"0\" y1=\"{}\" x2=\"0\" y2=\"{}\" stroke=\"currentColor\"/>",
                num(range.0),
                num(range.1)
            )?;
            for tick in ticks {
                writeln!(
                    out,
                    "<g transform=\"translate(0,{})\"><line x2=\"{}\" stroke=\"currentColor\"/>",
                    num(tick.offset),
                    num(-TICK_SIZE)
                )?;
                let style = TextStyle::new(TICK_FONT_SIZE).anchor(TextAnchor::End);
                let x = -(TICK_SIZE + TICK_PADDING);
                write_text(out, (x, TICK_FONT_SIZE / 3.0), &tick.label, &style)?;
                writeln!(out, "</g>")?;
            }
        }
    }
    writeln!(out, "</g>")?;
    Ok(())
}

fn write_primitive(out: &mut String, primitive: &Primitive) -> Result<()> {
    match primitive {
        Primitive::Line { from, to, stroke } => {
            writeln!(
                out,
                "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\"{}/>",
                num(from.0),
                num(from.1),
                num(to.0),
                num(to.1),
                stroke_attrs(Some(stroke))
            )?;
        }
        Primitive::Path { points, stroke } => {
            let mut d = String::new();
            for (i, (x, y)) in points.iter().enumerate() {
                let cmd = if i == 0 { 'M' } else { 'L' };
                write!(d, "{cmd}{},{}", num(*x), num(*y))?;
            }
            writeln!(out, "<path d=\"{d}\" fill=\"none\"{}/>", stroke_attrs(Some(stroke)))?;
        }
        Primitive::Circle {
            center,
            radius,
            fill,
            stroke,
            opacity,
        } => {
            writeln!(
                out,
                "<circle cx=\"{}\" cy=\"{}\" r=\"{}\"{}{}{}/>",
                num(center.0),
                num(center.1),
                num(*radius),
                fill_attr(fill.as_ref()),
                stroke_attrs(stroke.as_ref()),
                opacity_attr(*opacity)
            )?;
        }
        Primitive::Rect {
            origin,
            width,
            height,
            fill,
            stroke,
            opacity,
        } => {
            writeln!(
                out,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"{}{}{}/>",
                num(origin.0),
                num(origin.1),
                num(*width),
                num(*height),
                fill_attr(fill.as_ref()),
                stroke_attrs(stroke.as_ref()),
                opacity_attr(*opacity)
            )?;
        }
        Primitive::Text {
            position,
            text,
            style,
        } => write_text(out, *position, text, style)?,
        Primitive::Axis {
            orient,
            offset,
            range,
            ticks,
            rotate_labels,
        } => write_axis(out, *orient, *offset, *range, ticks, *rotate_labels)?,
    }
    Ok(())
}

/// Render `scene` as a standalone SVG document.
///
/// Primitives are drawn inside a group translated by the viewport margins,
/// so plot coordinates map onto the inner area.
pub fn to_svg(scene: &Scene) -> Result<String> {
    let viewport = &scene.viewport;
    let mut out = String::new();

    writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" font-family=\"sans-serif\">",
        w = num(viewport.width),
        h = num(viewport.height)
    )?;
    writeln!(
        out,
        "<g transform=\"translate({},{})\">",
        num(viewport.margin.left),
        num(viewport.margin.top)
    )?;
    for primitive in &scene.primitives {
        write_primitive(&mut out, primitive)?;
    }
    writeln!(out, "</g>")?;
    writeln!(out, "</svg>")?;

    Ok(out)
}
