pub mod camera;
pub mod demo;
pub mod input;
pub mod math;
pub mod rendering;
pub mod scene_graph;
pub mod texture;
pub mod window;
