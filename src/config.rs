use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound for [`LayoutConfig::relative_text_position`]; at 1.0 the
/// label would sit on the rim where the circle has no width left.
const MAX_RELATIVE_TEXT_POSITION: f64 = 0.95;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Minimum gap between sibling circles and between children and the rim.
    pub circle_padding: f64,
    /// Gap between a label and the rim of its circle.
    pub text_padding: f64,
    /// Vertical label offset of expanded nodes, as a fraction of the radius
    /// above the centre.
    pub relative_text_position: f64,
    pub max_relax_iterations: usize,
    pub tolerance: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            circle_padding: 10.0,
            text_padding: 5.0,
            relative_text_position: 0.8,
            max_relax_iterations: 500,
            tolerance: 1e-6,
        }
    }
}

impl LayoutConfig {
    pub fn text_position(&self) -> f64 {
        self.relative_text_position
            .clamp(0.0, MAX_RELATIVE_TEXT_POSITION)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            margin: 20.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::default_theme();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeFile {
    name: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    depth_fills: Option<Vec<String>>,
    folded_fill: Option<String>,
    stroke_color: Option<String>,
    stroke_width: Option<f32>,
    text_color: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutFile {
    circle_padding: Option<f64>,
    text_padding: Option<f64>,
    relative_text_position: Option<f64>,
    max_relax_iterations: Option<usize>,
    tolerance: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderFile {
    width: Option<f32>,
    height: Option<f32>,
    margin: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<ThemeFile>,
    layout: Option<LayoutFile>,
    render: Option<RenderFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses a JSON5 (or plain JSON) config document over the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme) = parsed.theme {
        if theme.name.as_deref() == Some("dark") {
            config.theme = Theme::dark();
        }
        if let Some(v) = theme.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = theme.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = theme.depth_fills {
            config.theme.depth_fills = v;
        }
        if let Some(v) = theme.folded_fill {
            config.theme.folded_fill = v;
        }
        if let Some(v) = theme.stroke_color {
            config.theme.stroke_color = v;
        }
        if let Some(v) = theme.stroke_width {
            config.theme.stroke_width = v;
        }
        if let Some(v) = theme.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = theme.background {
            config.theme.background = v;
        }
        config.render.background = config.theme.background.clone();
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.circle_padding {
            config.layout.circle_padding = v;
        }
        if let Some(v) = layout.text_padding {
            config.layout.text_padding = v;
        }
        if let Some(v) = layout.relative_text_position {
            config.layout.relative_text_position = v;
        }
        if let Some(v) = layout.max_relax_iterations {
            config.layout.max_relax_iterations = v;
        }
        if let Some(v) = layout.tolerance {
            config.layout.tolerance = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.margin {
            config.render.margin = v;
        }
    }

    Ok(config)
}
