pub mod entity;
pub mod geometry;
pub mod path;
pub mod scene;
