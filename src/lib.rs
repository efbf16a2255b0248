//! Portal-based sector raycaster.
//!
//! A [`World`](world::World) of convex or concave sectors joined by portal
//! edges is rendered one screen column at a time by [`Renderer`]. Lighting
//! comes from per-sector voxel caches filled by a shadow tracer that walks the
//! same portals.

pub mod camera;
pub mod config;
pub mod error;
pub mod light;
pub mod lightmap;
pub mod material;
pub mod math;
pub mod present;
pub mod pvs;
pub mod render;
pub mod world;

pub use camera::Camera;
pub use config::RenderConfig;
pub use error::{Error, Result};
pub use render::{PickResult, Renderer, Selectable, SurfaceKind};
pub use world::{World, WorldBuilder};
