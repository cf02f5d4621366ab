//! Graphics seam and the built-in software canvas.
//!
//! # Responsibility
//! - Define `GraphicsContext`, the pipeline contract a host implements.
//! - Provide `SoftwareCanvas`, a CPU rasterizer over an RGBA8 framebuffer.
//!
//! # Invariants
//! - `draw` is only valid between `build_pipeline` and `teardown`.
//! - The software canvas covers the whole viewport with one shaded square.

use super::math::Vec2;
use super::shading::{shade, FrameUniforms};
use crate::model::program::{VisualProgram, VisualProgramId};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ASCII_RAMP: &[u8] = b" .:-=+*#%@";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// `draw` called without a built pipeline.
    PipelineMissing,
    /// Host could not compile or link the program.
    PipelineBuild(String),
    /// Surface has zero area.
    EmptySurface,
}

impl Display for GraphicsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PipelineMissing => write!(f, "no pipeline built for draw"),
            Self::PipelineBuild(details) => write!(f, "pipeline build failed: {details}"),
            Self::EmptySurface => write!(f, "surface has zero area"),
        }
    }
}

impl Error for GraphicsError {}

/// Pipeline contract between the render loop and a graphics backend.
pub trait GraphicsContext {
    fn build_pipeline(&mut self, program: &VisualProgram) -> Result<(), GraphicsError>;
    fn teardown(&mut self);
    fn draw(&mut self, uniforms: &FrameUniforms) -> Result<(), GraphicsError>;
}

/// CPU rasterizer producing premultiplied RGBA8 pixels, row 0 at the top.
#[derive(Debug, Clone)]
pub struct SoftwareCanvas {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
    program: Option<VisualProgramId>,
    pipelines_built: usize,
}

impl SoftwareCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 4]; (width as usize) * (height as usize)],
            program: None,
            pipelines_built: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn program(&self) -> Option<VisualProgramId> {
        self.program
    }

    /// Number of pipelines built over this canvas's lifetime.
    pub fn pipelines_built(&self) -> usize {
        self.pipelines_built
    }

    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get((y as usize) * (self.width as usize) + x as usize)
            .copied()
    }

    /// Renders the last frame as ASCII luminance art, one line per row.
    pub fn ascii_preview(&self) -> String {
        let mut out = String::with_capacity(self.pixels.len() + self.height as usize);
        for row in self.pixels.chunks(self.width.max(1) as usize) {
            for pixel in row {
                let luma =
                    0.299 * f32::from(pixel[0]) + 0.587 * f32::from(pixel[1]) + 0.114 * f32::from(pixel[2]);
                let level = ((luma / 255.0) * (ASCII_RAMP.len() - 1) as f32).round() as usize;
                out.push(ASCII_RAMP[level.min(ASCII_RAMP.len() - 1)] as char);
            }
            out.push('\n');
        }
        out
    }
}

impl GraphicsContext for SoftwareCanvas {
    fn build_pipeline(&mut self, program: &VisualProgram) -> Result<(), GraphicsError> {
        if self.width == 0 || self.height == 0 {
            return Err(GraphicsError::EmptySurface);
        }
        self.program = Some(program.id);
        self.pipelines_built += 1;
        Ok(())
    }

    fn teardown(&mut self) {
        self.program = None;
    }

    fn draw(&mut self, uniforms: &FrameUniforms) -> Result<(), GraphicsError> {
        let program = self.program.ok_or(GraphicsError::PipelineMissing)?;
        let (width, height) = (self.width as f32, self.height as f32);
        for (index, pixel) in self.pixels.iter_mut().enumerate() {
            let x = (index % self.width as usize) as f32;
            let y = (index / self.width as usize) as f32;
            // Fragment coordinates are bottom-up.
            let uv = Vec2::new((x + 0.5) / width, (height - y - 0.5) / height);
            *pixel = shade(program, uv, uniforms).to_rgba8();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{GraphicsContext, GraphicsError, SoftwareCanvas};
    use crate::model::program::VisualProgramId;
    use crate::render::math::Vec2;
    use crate::render::shading::FrameUniforms;

    fn uniforms() -> FrameUniforms {
        FrameUniforms {
            time: 1.5,
            pointer: Vec2::CENTER,
            has_active: true,
            has_upcoming: false,
        }
    }

    #[test]
    fn draw_without_pipeline_fails() {
        let mut canvas = SoftwareCanvas::new(8, 8);
        assert_eq!(canvas.draw(&uniforms()), Err(GraphicsError::PipelineMissing));
    }

    #[test]
    fn draw_masks_corners_and_fills_centre() {
        let mut canvas = SoftwareCanvas::new(32, 32);
        canvas
            .build_pipeline(&VisualProgramId::Ether.program())
            .expect("pipeline should build");
        canvas.draw(&uniforms()).expect("draw should succeed");

        assert_eq!(canvas.pixel(0, 0).expect("corner")[3], 0);
        assert_eq!(canvas.pixel(31, 31).expect("corner")[3], 0);
        assert_eq!(canvas.pixel(16, 16).expect("centre")[3], 255);
        assert!(canvas.pixel(32, 0).is_none());
    }

    #[test]
    fn ascii_preview_has_one_line_per_row() {
        let mut canvas = SoftwareCanvas::new(12, 6);
        canvas
            .build_pipeline(&VisualProgramId::Plasma.program())
            .expect("pipeline should build");
        canvas.draw(&uniforms()).expect("draw should succeed");
        let preview = canvas.ascii_preview();
        assert_eq!(preview.lines().count(), 6);
        assert!(preview.lines().all(|line| line.chars().count() == 12));
    }

    #[test]
    fn zero_area_surface_rejects_pipeline() {
        let mut canvas = SoftwareCanvas::new(0, 10);
        assert_eq!(
            canvas.build_pipeline(&VisualProgramId::Nebula.program()),
            Err(GraphicsError::EmptySurface)
        );
    }
}
