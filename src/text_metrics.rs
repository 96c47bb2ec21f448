use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

/// Fallback advance as a fraction of the font size when no font is loaded.
const FALLBACK_ADVANCE: f64 = 0.56;

static FONT_CACHE: Lazy<Mutex<FontCache>> = Lazy::new(|| Mutex::new(FontCache::new()));

/// Maps a label to its rendered width in pixels. Implementations must be
/// deterministic.
pub trait TextMeasure {
    fn measure(&self, label: &str) -> f64;
}

impl<F> TextMeasure for F
where
    F: Fn(&str) -> f64,
{
    fn measure(&self, label: &str) -> f64 {
        self(label)
    }
}

/// Every character is `char_width` pixels wide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedWidthMeasure {
    pub char_width: f64,
}

impl FixedWidthMeasure {
    pub fn new(char_width: f64) -> Self {
        Self { char_width }
    }
}

impl TextMeasure for FixedWidthMeasure {
    fn measure(&self, label: &str) -> f64 {
        label.chars().count() as f64 * self.char_width
    }
}

/// Measures with glyph advances of a system font resolved through `fontdb`.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMeasure {
    pub font_family: String,
    pub font_size: f64,
}

impl FontMeasure {
    pub fn new(font_family: impl Into<String>, font_size: f64) -> Self {
        Self {
            font_family: font_family.into(),
            font_size,
        }
    }
}

impl TextMeasure for FontMeasure {
    fn measure(&self, label: &str) -> f64 {
        measure_text_width(label, self.font_size, &self.font_family)
            .unwrap_or_else(|| fallback_text_width(label, self.font_size))
    }
}

pub fn fallback_text_width(text: &str, font_size: f64) -> f64 {
    text.chars().filter(|ch| *ch != '\n').count() as f64 * font_size * FALLBACK_ADVANCE
}

/// Width of `text` in the first font matching `font_family`, or `None` when no
/// font could be loaded.
pub fn measure_text_width(text: &str, font_size: f64, font_family: &str) -> Option<f64> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut cache = FONT_CACHE.lock().ok()?;
    let advances = cache.advances(font_family)?;
    Some(advances.width(text, font_size))
}

struct FontCache {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<String, Option<Advances>>,
}

impl FontCache {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn advances(&mut self, font_family: &str) -> Option<&Advances> {
        let key = normalize_family_key(font_family);
        if !self.faces.contains_key(&key) {
            let loaded = self.load(&key);
            if loaded.is_none() {
                log::debug!("no font found for {key:?}, using estimated advances");
            }
            self.faces.insert(key.clone(), loaded);
        }
        self.faces.get(&key).and_then(|advances| advances.as_ref())
    }

    fn load(&mut self, font_family: &str) -> Option<Advances> {
        let names: Vec<&str> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\''))
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names
            .iter()
            .map(|&name| match name.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                    Family::SansSerif
                }
                "monospace" | "ui-monospace" => Family::Monospace,
                "cursive" => Family::Cursive,
                "fantasy" => Family::Fantasy,
                _ => Family::Name(name),
            })
            .collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| {
                Face::parse(data, index).ok().map(|face| Advances::from_face(&face))
            })
            .flatten()
    }
}

/// Horizontal advances extracted from a face, in font units.
struct Advances {
    units_per_em: f64,
    ascii: [u16; 128],
    other: HashMap<char, u16>,
}

impl Advances {
    fn from_face(face: &Face<'_>) -> Self {
        let mut ascii = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        // Latin-1 supplement covers most accented identifiers.
        let other = (0xA0u32..=0xFF)
            .filter_map(char::from_u32)
            .filter_map(|ch| {
                let glyph = face.glyph_index(ch)?;
                Some((ch, face.glyph_hor_advance(glyph)?))
            })
            .collect();
        Self {
            units_per_em: f64::from(face.units_per_em().max(1)),
            ascii,
            other,
        }
    }

    fn width(&self, text: &str, font_size: f64) -> f64 {
        let scale = font_size / self.units_per_em;
        let fallback = font_size * FALLBACK_ADVANCE;
        text.chars()
            .filter(|ch| *ch != '\n')
            .map(|ch| {
                let advance = if ch.is_ascii() {
                    self.ascii[ch as usize]
                } else {
                    self.other.get(&ch).copied().unwrap_or(0)
                };
                if advance == 0 {
                    fallback
                } else {
                    f64::from(advance) * scale
                }
            })
            .sum()
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}
