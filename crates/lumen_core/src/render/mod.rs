//! Animated background rendering.
//!
//! # Responsibility
//! - Shade the selected visual program from time, pointer and reminder state.
//! - Drive a graphics context once per frame.

pub mod canvas;
pub mod math;
pub mod render_loop;
pub mod shading;
