use ab_glyph::{Font, FontArc};
use eframe::egui;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::scene::TextStyle;
use crate::theme::ThemeMode;

// ============================================================================
// CAPTION FONT
// ============================================================================

/// Families probed for the caption typeface, best first. Impact is the meme
/// standard; the rest are common substitutes across platforms. Whatever the
/// platform resolves, the exact same bytes feed the egui preview and the
/// export rasterizer, so on-screen captions match the downloaded PNG.
const CAPTION_FAMILIES: &[&str] = &[
    "Impact",
    "Anton",
    "Arial Black",
    "Haettenschweiler",
    "Liberation Sans",
    "DejaVu Sans",
];

/// Name egui knows the caption typeface under.
pub const CAPTION_FONT_FAMILY: &str = "caption";

/// One caption typeface, held as raw bytes (for egui) and a parsed face
/// (for the export rasterizer).
pub struct CaptionFont {
    pub name: String,
    pub bytes: Vec<u8>,
    pub font: FontArc,
}

static CAPTION_FONT: OnceLock<Option<CaptionFont>> = OnceLock::new();

/// The caption typeface for this process, resolved once on first use.
pub fn caption_font() -> Option<&'static CaptionFont> {
    CAPTION_FONT.get_or_init(find_caption_font).as_ref()
}

/// Register the caption typeface with egui under [`CAPTION_FONT_FAMILY`].
/// Without a resolved font the preview falls back to egui's proportional
/// family; captions still render, just not in meme lettering.
pub fn install_caption_font(ctx: &egui::Context) {
    let Some(caption) = caption_font() else {
        log_warn!("No caption font available; preview uses the default typeface");
        return;
    };
    let mut fonts = egui::FontDefinitions::default();
    fonts.font_data.insert(
        CAPTION_FONT_FAMILY.to_owned(),
        egui::FontData::from_owned(caption.bytes.clone()),
    );
    fonts.families.insert(
        egui::FontFamily::Name(CAPTION_FONT_FAMILY.into()),
        vec![CAPTION_FONT_FAMILY.to_owned()],
    );
    ctx.set_fonts(fonts);
    log_info!("Caption font installed: {}", caption.name);
}

fn find_caption_font() -> Option<CaptionFont> {
    for family in CAPTION_FAMILIES {
        if let Some((name, bytes)) = system_font_bytes(family, 700)
            && let Ok(font) = FontArc::try_from_vec(bytes.clone())
        {
            log_info!("Caption font: {} (requested family {})", name, family);
            return Some(CaptionFont { name, bytes, font });
        }
    }
    // No usable system font at all: borrow one of the faces egui embeds so
    // captions keep rendering everywhere.
    let defs = egui::FontDefinitions::default();
    for (name, data) in &defs.font_data {
        let bytes = data.font.clone().into_owned();
        if let Ok(font) = FontArc::try_from_vec(bytes.clone())
            && font.glyph_id('A').0 != 0
        {
            log_warn!("No system caption font found; falling back to embedded {}", name);
            return Some(CaptionFont {
                name: name.clone(),
                bytes,
                font,
            });
        }
    }
    None
}

/// Load a font's raw bytes by family name from the system.
/// `weight` is a CSS-style weight value (400=Regular, 700=Bold).
/// Returns the resolved face name alongside the bytes — the platform may
/// substitute a different family than the one requested.
fn system_font_bytes(family: &str, weight: u16) -> Option<(String, Vec<u8>)> {
    use font_kit::family_name::FamilyName;
    use font_kit::properties::{Properties, Weight};
    use font_kit::source::SystemSource;

    let mut props = Properties::new();
    props.weight = Weight(weight as f32);

    let source = SystemSource::new();
    let handle = source
        .select_best_match(&[FamilyName::Title(family.to_string())], &props)
        .ok()?;
    let font = handle.load().ok()?;
    let data = font.copy_font_data()?;
    Some((font.full_name(), (*data).clone()))
}

// ============================================================================
// APP SETTINGS
// ============================================================================

/// Preferences that survive restarts: the theme mode and the caption style
/// the add-text form starts with. Stored as `key=value` lines at
/// `<platform config dir>/MemeForge/memeforge_settings.cfg`.
pub struct AppSettings {
    pub theme_mode: ThemeMode,
    pub caption_style: TextStyle,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme_mode: ThemeMode::Light,
            caption_style: TextStyle::default(),
        }
    }
}

impl AppSettings {
    /// Defaults when the file is missing or unreadable; unknown keys and
    /// unparseable values are skipped line by line.
    pub fn load() -> Self {
        match std::fs::read_to_string(settings_path()) {
            Ok(content) => Self::from_config_str(&content),
            Err(_) => Self::default(),
        }
    }

    /// Best-effort write; a failed save costs one session of preferences.
    pub fn save(&self) {
        let path = settings_path();
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        let _ = std::fs::write(path, self.to_config_string());
    }

    fn to_config_string(&self) -> String {
        let mode = match self.theme_mode {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        };
        let style = &self.caption_style;
        format!(
            "theme_mode={mode}\ncaption_color={}\ncaption_font_size={}\ncaption_stroke_width={}\n",
            Self::color_to_str(style.color),
            style.font_size,
            style.stroke_width,
        )
    }

    fn from_config_str(content: &str) -> Self {
        let mut settings = Self::default();
        for line in content.lines() {
            if let Some((key, value)) = line.split_once('=') {
                settings.apply_entry(key.trim(), value.trim());
            }
        }
        settings
    }

    fn apply_entry(&mut self, key: &str, value: &str) {
        use crate::scene::{FONT_SIZE_MAX, FONT_SIZE_MIN, STROKE_WIDTH_MAX, STROKE_WIDTH_MIN};
        match key {
            "theme_mode" => {
                self.theme_mode = if value == "dark" {
                    ThemeMode::Dark
                } else {
                    ThemeMode::Light
                };
            }
            "caption_color" => {
                if let Some(color) = Self::str_to_color(value) {
                    self.caption_style.color = color;
                }
            }
            "caption_font_size" => {
                if let Ok(size) = value.parse::<f32>() {
                    self.caption_style.font_size = size.clamp(FONT_SIZE_MIN, FONT_SIZE_MAX);
                }
            }
            "caption_stroke_width" => {
                if let Ok(width) = value.parse::<f32>() {
                    self.caption_style.stroke_width =
                        width.clamp(STROKE_WIDTH_MIN, STROKE_WIDTH_MAX);
                }
            }
            _ => {}
        }
    }

    /// An RGB triple as the literal `"r,g,b"`.
    fn color_to_str(color: [u8; 3]) -> String {
        format!("{},{},{}", color[0], color[1], color[2])
    }

    fn str_to_color(s: &str) -> Option<[u8; 3]> {
        let mut channels = s.splitn(3, ',').map(|part| part.trim().parse::<u8>());
        match (channels.next(), channels.next(), channels.next()) {
            (Some(Ok(r)), Some(Ok(g)), Some(Ok(b))) => Some([r, g, b]),
            _ => None,
        }
    }
}

/// Settings file location: `%APPDATA%` on Windows, `~/Library/Application
/// Support` on macOS, `$XDG_CONFIG_HOME` or `~/.config` elsewhere, with the
/// working directory as the last resort.
fn settings_path() -> PathBuf {
    let base = if cfg!(target_os = "windows") {
        env::var("APPDATA").map(PathBuf::from).ok()
    } else if cfg!(target_os = "macos") {
        env::var("HOME")
            .map(|home| PathBuf::from(home).join("Library").join("Application Support"))
            .ok()
    } else {
        env::var("XDG_CONFIG_HOME").map(PathBuf::from).ok().or_else(|| {
            env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .ok()
        })
    };
    base.unwrap_or_else(|| PathBuf::from("."))
        .join("MemeForge")
        .join("memeforge_settings.cfg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_roundtrip_through_config_text() {
        let settings = AppSettings {
            theme_mode: ThemeMode::Dark,
            caption_style: TextStyle {
                color: [10, 200, 30],
                font_size: 48.0,
                stroke_width: 1.5,
            },
        };
        let parsed = AppSettings::from_config_str(&settings.to_config_string());
        assert_eq!(parsed.theme_mode, ThemeMode::Dark);
        assert_eq!(parsed.caption_style, settings.caption_style);
    }

    #[test]
    fn unknown_keys_and_garbage_lines_are_ignored() {
        let parsed = AppSettings::from_config_str(
            "not a key value line\nwho=knows\ntheme_mode=dark\n\ncaption_color=banana\n",
        );
        assert_eq!(parsed.theme_mode, ThemeMode::Dark);
        // Unparseable color keeps the default.
        assert_eq!(parsed.caption_style.color, TextStyle::default().color);
    }

    #[test]
    fn out_of_range_style_values_are_clamped_on_load() {
        let parsed = AppSettings::from_config_str(
            "caption_font_size=9000\ncaption_stroke_width=-4\n",
        );
        assert_eq!(parsed.caption_style.font_size, crate::scene::FONT_SIZE_MAX);
        assert_eq!(parsed.caption_style.stroke_width, crate::scene::STROKE_WIDTH_MIN);
    }

    #[test]
    fn color_str_roundtrip() {
        let c = [255, 0, 17];
        assert_eq!(
            AppSettings::str_to_color(&AppSettings::color_to_str(c)),
            Some(c)
        );
        assert_eq!(AppSettings::str_to_color("1,2"), None);
        assert_eq!(AppSettings::str_to_color("300,0,0"), None);
    }

    #[test]
    fn caption_font_resolves_somewhere() {
        // System chain or egui's embedded fallback; either way we get a face
        // that can shape Latin captions.
        let font = caption_font().expect("some caption font must resolve");
        assert!(font.font.glyph_id('A').0 != 0);
        assert!(!font.bytes.is_empty());
    }
}
