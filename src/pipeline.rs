pub mod renderer;
pub mod shade;
pub mod transform;
