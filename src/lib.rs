//! A CPU-only deferred software rasterizer.
//!
//! A frame flows through fixed stages: per-object vertex transform and
//! near-plane clipping ([`pipeline::transform`]), perspective-correct
//! scanline rasterization into a fragment buffer ([`core::rasterizer`]),
//! and a deferred point-light shading sweep ([`pipeline::shade`]).
//! [`pipeline::renderer::Renderer`] ties the stages together over a
//! [`scene::Scene`].

pub mod core;
pub mod io;
pub mod pipeline;
pub mod scene;
