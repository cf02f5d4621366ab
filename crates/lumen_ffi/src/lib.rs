//! Flutter-facing bindings for the Lumen reminder widget.

pub mod api;
