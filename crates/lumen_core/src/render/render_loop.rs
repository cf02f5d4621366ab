//! Frame-paced render loop.
//!
//! # Responsibility
//! - Track the selected visual program and the last pointer position.
//! - Build per-frame uniforms and hand them to the graphics context.
//!
//! # Invariants
//! - Switching programs tears down and rebuilds the pipeline synchronously.
//! - A missing or failing graphics context disables rendering only; the loop
//!   keeps producing uniforms so hosts can still draw themselves.
//! - Per-frame work does not depend on reminder count; the two state flags
//!   arrive precomputed.

use super::canvas::{GraphicsContext, GraphicsError};
use super::math::Vec2;
use super::shading::FrameUniforms;
use crate::model::program::VisualProgramId;
use chrono::{DateTime, Utc};
use log::{info, warn};

pub struct RenderLoop<G: GraphicsContext> {
    context: Option<G>,
    selected: VisualProgramId,
    pointer: Vec2,
    origin: Option<DateTime<Utc>>,
    frames: u64,
}

impl<G: GraphicsContext> RenderLoop<G> {
    /// Creates the loop and builds the initial pipeline.
    ///
    /// `context = None` means the host has no graphics; rendering is skipped.
    pub fn new(context: Option<G>, selected: VisualProgramId) -> Self {
        let mut render = Self {
            context,
            selected,
            pointer: Vec2::CENTER,
            origin: None,
            frames: 0,
        };
        if render.context.is_none() {
            warn!("event=render_init module=render status=degraded reason=graphics_unavailable");
        }
        render.rebuild_pipeline();
        render
    }

    pub fn selected(&self) -> VisualProgramId {
        self.selected
    }

    pub fn is_enabled(&self) -> bool {
        self.context.is_some()
    }

    pub fn context(&self) -> Option<&G> {
        self.context.as_ref()
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames
    }

    /// Switches program, rebuilding the pipeline before returning.
    pub fn select_program(&mut self, program: VisualProgramId) {
        if let Some(context) = self.context.as_mut() {
            context.teardown();
        }
        self.selected = program;
        self.rebuild_pipeline();
        info!(
            "event=program_select module=render status=ok program={}",
            program.number()
        );
    }

    /// Records a pointer move in surface pixels (origin top-left).
    pub fn pointer_moved(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if let Some(pointer) = Vec2::from_surface(x, y, width, height) {
            self.pointer = pointer;
        }
    }

    /// Builds uniforms for `now` without drawing.
    pub fn uniforms(&mut self, now: DateTime<Utc>, has_active: bool, has_upcoming: bool) -> FrameUniforms {
        let origin = *self.origin.get_or_insert(now);
        let elapsed_ms = (now - origin).num_milliseconds().max(0);
        FrameUniforms {
            time: elapsed_ms as f32 / 1000.0,
            pointer: self.pointer,
            has_active,
            has_upcoming,
        }
    }

    /// Draws one frame. Returns the uniforms used when a frame was drawn.
    pub fn frame(
        &mut self,
        now: DateTime<Utc>,
        has_active: bool,
        has_upcoming: bool,
    ) -> Option<FrameUniforms> {
        let uniforms = self.uniforms(now, has_active, has_upcoming);
        let context = self.context.as_mut()?;
        match context.draw(&uniforms) {
            Ok(()) => {
                self.frames += 1;
                Some(uniforms)
            }
            Err(err) => {
                warn!("event=render_frame module=render status=error error={err}");
                None
            }
        }
    }

    fn rebuild_pipeline(&mut self) {
        let Some(context) = self.context.as_mut() else {
            return;
        };
        let program = self.selected.program();
        if let Err(err) = context.build_pipeline(&program) {
            self.disable(err);
        }
    }

    fn disable(&mut self, err: GraphicsError) {
        warn!(
            "event=pipeline_build module=render status=degraded program={} error={err}",
            self.selected.number()
        );
        self.context = None;
    }
}

#[cfg(test)]
mod tests {
    use super::RenderLoop;
    use crate::model::program::VisualProgramId;
    use crate::render::canvas::SoftwareCanvas;
    use crate::render::math::Vec2;
    use chrono::{Duration, TimeZone, Utc};

    fn t0() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 2, 10, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn pointer_is_normalized_flipped_and_clamped() {
        let mut render: RenderLoop<SoftwareCanvas> = RenderLoop::new(None, VisualProgramId::Plasma);
        render.pointer_moved(50.0, 25.0, 100.0, 100.0);
        assert_eq!(render.pointer(), Vec2::new(0.5, 0.75));
        render.pointer_moved(150.0, -10.0, 100.0, 100.0);
        assert_eq!(render.pointer(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn time_advances_from_first_frame() {
        let mut render = RenderLoop::new(Some(SoftwareCanvas::new(4, 4)), VisualProgramId::Nebula);
        let first = render.frame(t0(), false, false).expect("frame drawn");
        let second = render
            .frame(t0() + Duration::milliseconds(1500), false, false)
            .expect("frame drawn");
        assert_eq!(first.time, 0.0);
        assert!((second.time - 1.5).abs() < 1e-6);
        assert_eq!(render.frames_drawn(), 2);
    }

    #[test]
    fn missing_graphics_disables_drawing_only() {
        let mut render: RenderLoop<SoftwareCanvas> = RenderLoop::new(None, VisualProgramId::Ether);
        assert!(!render.is_enabled());
        assert!(render.frame(t0(), true, true).is_none());
        let uniforms = render.uniforms(t0(), true, true);
        assert!(uniforms.has_active && uniforms.has_upcoming);
    }

    #[test]
    fn failing_pipeline_build_disables_rendering() {
        let render = RenderLoop::new(Some(SoftwareCanvas::new(0, 0)), VisualProgramId::Plasma);
        assert!(!render.is_enabled());
    }

    #[test]
    fn switching_program_rebuilds_pipeline() {
        let mut render = RenderLoop::new(Some(SoftwareCanvas::new(4, 4)), VisualProgramId::Plasma);
        render.select_program(VisualProgramId::WavyLines);
        let canvas = render.context().expect("canvas present");
        assert_eq!(canvas.program(), Some(VisualProgramId::WavyLines));
        assert_eq!(canvas.pipelines_built(), 2);
    }
}
