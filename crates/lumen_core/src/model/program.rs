//! Visual program catalog.
//!
//! # Responsibility
//! - Define the closed set of built-in visual programs.
//! - Carry GLSL sources for GPU hosts alongside the id/name metadata.
//!
//! # Invariants
//! - Program ids are `1..=4` and map one-to-one to `VisualProgramId` variants.
//! - Catalog entries are immutable; selection swaps which entry is active.

use serde::{Deserialize, Serialize};

/// Built-in visual program selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualProgramId {
    /// Interference pattern of summed sines.
    #[default]
    Plasma,
    /// Concentric ripples accumulated over a few octaves.
    Ether,
    /// Orbiting sample points accumulated into a glow.
    Nebula,
    /// Angular waves around the centre.
    WavyLines,
}

impl VisualProgramId {
    pub const ALL: [VisualProgramId; 4] = [
        VisualProgramId::Plasma,
        VisualProgramId::Ether,
        VisualProgramId::Nebula,
        VisualProgramId::WavyLines,
    ];

    /// Resolves a numeric id (as stored and as typed by users).
    pub fn from_number(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Plasma),
            2 => Some(Self::Ether),
            3 => Some(Self::Nebula),
            4 => Some(Self::WavyLines),
            _ => None,
        }
    }

    pub fn number(self) -> u32 {
        match self {
            Self::Plasma => 1,
            Self::Ether => 2,
            Self::Nebula => 3,
            Self::WavyLines => 4,
        }
    }

    /// Parses the string-encoded integer stored under the selection key.
    pub fn parse(value: &str) -> Option<Self> {
        value.trim().parse::<u32>().ok().and_then(Self::from_number)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Plasma => "Plasma",
            Self::Ether => "Ether",
            Self::Nebula => "Nebula",
            Self::WavyLines => "Wavy Lines",
        }
    }

    /// Returns the immutable catalog entry for this id.
    pub fn program(self) -> VisualProgram {
        VisualProgram {
            id: self,
            name: self.name(),
            vertex_source: FULLSCREEN_QUAD_VERTEX,
            fragment_source: match self {
                Self::Plasma => PLASMA_FRAGMENT,
                Self::Ether => ETHER_FRAGMENT,
                Self::Nebula => NEBULA_FRAGMENT,
                Self::WavyLines => WAVY_LINES_FRAGMENT,
            },
        }
    }
}

/// Catalog entry: display name plus shader sources for GPU hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualProgram {
    pub id: VisualProgramId,
    pub name: &'static str,
    pub vertex_source: &'static str,
    pub fragment_source: &'static str,
}

const FULLSCREEN_QUAD_VERTEX: &str = r#"
attribute vec2 a_position;
void main() {
  gl_Position = vec4(a_position, 0.0, 1.0);
}
"#;

// Uniform block shared by every fragment program. `u_has_upcoming` pulses the
// base colour toward the upcoming tint so it stays visible while active.
macro_rules! fragment_prelude {
    () => {
        r#"
precision mediump float;
uniform float u_time;
uniform vec2 u_resolution;
uniform vec2 u_mouse;
uniform bool u_has_active;
uniform bool u_has_upcoming;

vec3 base_color(vec3 active, vec3 upcoming, vec3 neutral) {
  vec3 base = u_has_active ? active : neutral;
  if (u_has_upcoming) {
    base = mix(base, upcoming, 0.35 + 0.35 * sin(u_time * 3.0));
  }
  return base;
}
"#
    };
}

const PLASMA_FRAGMENT: &str = concat!(
    fragment_prelude!(),
    r#"
void main() {
  vec2 uv = gl_FragCoord.xy / u_resolution.xy;
  float dist = distance(uv, vec2(0.5));
  vec3 base = base_color(vec3(0.2, 0.4, 0.9), vec3(0.2, 0.8, 0.4), vec3(0.5, 0.3, 0.8));
  float x = uv.x * 8.0 + u_time * 0.5;
  float y = uv.y * 8.0 + u_time * 0.7;
  float plasma = sin(x) + sin(y) + sin((x + y) * 0.5) + sin(sqrt(x * x + y * y) * 2.0);
  float highlight = exp(-distance(uv, u_mouse) * 8.0) * 0.5;
  vec3 color = base + plasma * 0.2 + highlight;
  float edge = smoothstep(0.5, 0.45, dist);
  gl_FragColor = vec4(color * edge, edge);
}
"#
);

const ETHER_FRAGMENT: &str = concat!(
    fragment_prelude!(),
    r#"
void main() {
  vec2 uv = gl_FragCoord.xy / u_resolution.xy;
  float dist = distance(uv, vec2(0.5));
  vec3 base = base_color(vec3(0.9, 0.2, 0.4), vec3(0.2, 0.8, 0.4), vec3(0.8, 0.4, 0.9));
  float ether = 0.0;
  for (int i = 0; i < 3; i++) {
    float fi = float(i);
    float wave = sin(dist * 20.0 - u_time * 2.0 + fi * 2.0) * 0.5 + 0.5;
    ether += wave / (3.0 + fi);
  }
  float md = distance(uv, u_mouse);
  float ripple = sin(md * 30.0 - u_time * 5.0) * exp(-md * 5.0) * 0.3;
  vec3 color = base * (0.5 + ether * 0.5 + ripple);
  float edge = smoothstep(0.5, 0.45, dist);
  gl_FragColor = vec4(color * edge, edge);
}
"#
);

const NEBULA_FRAGMENT: &str = concat!(
    fragment_prelude!(),
    r#"
void main() {
  vec2 uv = gl_FragCoord.xy / u_resolution.xy;
  float dist = distance(uv, vec2(0.5));
  vec3 base = base_color(vec3(0.2, 0.4, 0.9), vec3(0.2, 0.8, 0.4), vec3(0.3, 0.7, 0.9));
  vec2 pos = uv * 4.0;
  float nebula = 0.0;
  for (int i = 0; i < 4; i++) {
    float fi = float(i);
    pos += vec2(sin(u_time * 0.1 + fi), cos(u_time * 0.13 + fi * 1.5)) * 0.5;
    nebula += sin(length(pos) - u_time * 0.5) / max(length(pos), 0.1);
  }
  float swirl = 1.0 + sin(distance(uv, u_mouse) * 10.0 - u_time * 3.0) * 0.1;
  vec3 color = base * (0.3 + abs(nebula) * 0.7) * swirl;
  float edge = smoothstep(0.5, 0.45, dist);
  gl_FragColor = vec4(color * edge, edge);
}
"#
);

const WAVY_LINES_FRAGMENT: &str = concat!(
    fragment_prelude!(),
    r#"
void main() {
  vec2 uv = gl_FragCoord.xy / u_resolution.xy;
  float dist = distance(uv, vec2(0.5));
  vec3 base = base_color(vec3(0.2, 0.8, 0.4), vec3(0.9, 0.7, 0.2), vec3(0.3, 0.8, 0.7));
  float angle = atan(uv.y - 0.5, uv.x - 0.5);
  float waves = 0.0;
  for (int i = 0; i < 5; i++) {
    float fi = float(i);
    waves += sin(dist * 15.0 + angle * 3.0 + u_time * (1.0 + fi * 0.5)) / (fi + 1.0);
  }
  float md = distance(uv, u_mouse);
  float wave = sin(md * 20.0 - u_time * 4.0) * exp(-md * 3.0) * 0.5;
  vec3 color = base * (0.5 + waves * 0.3 + wave);
  float edge = smoothstep(0.5, 0.45, dist);
  gl_FragColor = vec4(color * edge, edge);
}
"#
);
