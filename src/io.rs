pub mod image;
pub mod obj_loader;
