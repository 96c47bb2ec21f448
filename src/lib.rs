#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod text_metrics;
pub mod theme;
pub mod tree;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, load_config};
pub use error::{ParseError, TreeError};
pub use layout::{Session, TreeVisualizer, pack};
pub use parser::parse_tree;
pub use render::{RenderBinding, SceneBinding, render_svg};
pub use text_metrics::{FixedWidthMeasure, FontMeasure, TextMeasure};
pub use theme::Theme;
pub use tree::{NodeId, Tree};
