pub mod geometry;
mod pack;
mod session;
mod visualizer;

pub use geometry::{Circle, Point};
pub use pack::{PackOptions, Packing, pack, separate};
pub use session::Session;
pub use visualizer::TreeVisualizer;
