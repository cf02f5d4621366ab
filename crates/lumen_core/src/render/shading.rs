//! Pure shading functions for the built-in visual programs.
//!
//! CPU twins of the GLSL fragment sources in `model::program`. Every program
//! is a deterministic function of `(uv, uniforms)` and shares the same
//! circular mask: alpha is `smoothstep(0.5, 0.45, |uv - centre|)`.

use super::math::{smoothstep, Rgb, Rgba, Vec2};
use crate::model::program::VisualProgramId;
use serde::{Deserialize, Serialize};

/// Per-frame parameters fed into a program.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameUniforms {
    /// Seconds since the render loop's time origin.
    pub time: f32,
    /// Last pointer position, unit square, origin bottom-left.
    pub pointer: Vec2,
    pub has_active: bool,
    pub has_upcoming: bool,
}

struct Palette {
    active: Rgb,
    upcoming: Rgb,
    neutral: Rgb,
}

fn palette(program: VisualProgramId) -> Palette {
    match program {
        VisualProgramId::Plasma => Palette {
            active: Rgb::new(0.2, 0.4, 0.9),
            upcoming: Rgb::new(0.2, 0.8, 0.4),
            neutral: Rgb::new(0.5, 0.3, 0.8),
        },
        VisualProgramId::Ether => Palette {
            active: Rgb::new(0.9, 0.2, 0.4),
            upcoming: Rgb::new(0.2, 0.8, 0.4),
            neutral: Rgb::new(0.8, 0.4, 0.9),
        },
        VisualProgramId::Nebula => Palette {
            active: Rgb::new(0.2, 0.4, 0.9),
            upcoming: Rgb::new(0.2, 0.8, 0.4),
            neutral: Rgb::new(0.3, 0.7, 0.9),
        },
        VisualProgramId::WavyLines => Palette {
            active: Rgb::new(0.2, 0.8, 0.4),
            upcoming: Rgb::new(0.9, 0.7, 0.2),
            neutral: Rgb::new(0.3, 0.8, 0.7),
        },
    }
}

fn base_color(palette: &Palette, uniforms: &FrameUniforms) -> Rgb {
    let base = if uniforms.has_active {
        palette.active
    } else {
        palette.neutral
    };
    if uniforms.has_upcoming {
        // Pulse toward the upcoming tint.
        let pulse = 0.35 + 0.35 * (uniforms.time * 3.0).sin();
        base.mix(palette.upcoming, pulse)
    } else {
        base
    }
}

/// Soft circular mask centred in the viewport.
pub fn circle_mask(uv: Vec2) -> f32 {
    smoothstep(0.5, 0.45, uv.distance(Vec2::CENTER))
}

/// Shades one fragment. Colour is premultiplied by the mask.
pub fn shade(program: VisualProgramId, uv: Vec2, uniforms: &FrameUniforms) -> Rgba {
    let edge = circle_mask(uv);
    if edge == 0.0 {
        return Rgba::default();
    }

    let base = base_color(&palette(program), uniforms);
    let color = match program {
        VisualProgramId::Plasma => plasma(base, uv, uniforms),
        VisualProgramId::Ether => ether(base, uv, uniforms),
        VisualProgramId::Nebula => nebula(base, uv, uniforms),
        VisualProgramId::WavyLines => wavy_lines(base, uv, uniforms),
    }
    .clamp01()
    .scale(edge);

    Rgba {
        r: color.r,
        g: color.g,
        b: color.b,
        a: edge,
    }
}

fn plasma(base: Rgb, uv: Vec2, u: &FrameUniforms) -> Rgb {
    let x = uv.x * 8.0 + u.time * 0.5;
    let y = uv.y * 8.0 + u.time * 0.7;
    let plasma = x.sin() + y.sin() + ((x + y) * 0.5).sin() + ((x * x + y * y).sqrt() * 2.0).sin();
    let highlight = (-uv.distance(u.pointer) * 8.0).exp() * 0.5;
    base.offset(plasma * 0.2 + highlight)
}

fn ether(base: Rgb, uv: Vec2, u: &FrameUniforms) -> Rgb {
    let dist = uv.distance(Vec2::CENTER);
    let ether = (0..3)
        .map(|i| {
            let fi = i as f32;
            let wave = (dist * 20.0 - u.time * 2.0 + fi * 2.0).sin() * 0.5 + 0.5;
            wave / (3.0 + fi)
        })
        .sum::<f32>();
    let md = uv.distance(u.pointer);
    let ripple = (md * 30.0 - u.time * 5.0).sin() * (-md * 5.0).exp() * 0.3;
    base.scale(0.5 + ether * 0.5 + ripple)
}

fn nebula(base: Rgb, uv: Vec2, u: &FrameUniforms) -> Rgb {
    let mut pos = Vec2::new(uv.x * 4.0, uv.y * 4.0);
    let mut nebula = 0.0_f32;
    for i in 0..4 {
        let fi = i as f32;
        pos.x += (u.time * 0.1 + fi).sin() * 0.5;
        pos.y += (u.time * 0.13 + fi * 1.5).cos() * 0.5;
        let len = pos.length();
        nebula += (len - u.time * 0.5).sin() / len.max(0.1);
    }
    let swirl = 1.0 + (uv.distance(u.pointer) * 10.0 - u.time * 3.0).sin() * 0.1;
    base.scale((0.3 + nebula.abs() * 0.7) * swirl)
}

fn wavy_lines(base: Rgb, uv: Vec2, u: &FrameUniforms) -> Rgb {
    let dist = uv.distance(Vec2::CENTER);
    let angle = (uv.y - 0.5).atan2(uv.x - 0.5);
    let waves = (0..5)
        .map(|i| {
            let fi = i as f32;
            (dist * 15.0 + angle * 3.0 + u.time * (1.0 + fi * 0.5)).sin() / (fi + 1.0)
        })
        .sum::<f32>();
    let md = uv.distance(u.pointer);
    let wave = (md * 20.0 - u.time * 4.0).sin() * (-md * 3.0).exp() * 0.5;
    base.scale(0.5 + waves * 0.3 + wave)
}
