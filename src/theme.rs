use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    /// Circle fills, cycled by tree depth.
    pub depth_fills: Vec<String>,
    pub folded_fill: String,
    pub stroke_color: String,
    pub stroke_width: f32,
    pub text_color: String,
    pub background: String,
}

impl Theme {
    pub fn default_theme() -> Self {
        Self {
            font_family: "Arial, Helvetica, sans-serif".to_string(),
            font_size: 10.0,
            depth_fills: vec![
                "#FFFFFF".to_string(),
                "#E8F0FE".to_string(),
                "#D2E3FC".to_string(),
                "#AECBFA".to_string(),
            ],
            folded_fill: "#FCE8B2".to_string(),
            stroke_color: "#5F6368".to_string(),
            stroke_width: 1.0,
            text_color: "#202124".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 10.0,
            depth_fills: vec![
                "#1E1F22".to_string(),
                "#2B2D31".to_string(),
                "#383A40".to_string(),
                "#4E5058".to_string(),
            ],
            folded_fill: "#5865F2".to_string(),
            stroke_color: "#B5BAC1".to_string(),
            stroke_width: 1.0,
            text_color: "#F2F3F5".to_string(),
            background: "#111214".to_string(),
        }
    }

    pub fn fill_for_depth(&self, depth: usize) -> &str {
        if self.depth_fills.is_empty() {
            return self.background.as_str();
        }
        self.depth_fills[depth % self.depth_fills.len()].as_str()
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}
