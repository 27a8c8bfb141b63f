pub mod backend;
pub mod binding_offsets;
pub mod config;
pub mod controller;
pub mod draw_list;
pub mod per_frame;
pub mod permutation;
pub mod reflection;
pub mod render_mode;
pub mod renderer;
pub mod scene_resources;
pub mod shader_loader;
pub mod strategies;
