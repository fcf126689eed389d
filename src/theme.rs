use eframe::egui;
use egui::Color32;

/// Light or dark UI chrome. The scene itself renders the same in both.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeMode {
    Light,
    Dark,
}

/// Resolved colors for the current mode, applied to egui via [`Theme::apply`].
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub mode: ThemeMode,
    /// Selection accent: focus rings on the canvas, highlighted list rows.
    pub accent: Color32,
    /// Dashed frame around the editing container.
    pub canvas_frame: Color32,
    /// Footer text for failed background jobs.
    pub error_text: Color32,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            mode: ThemeMode::Light,
            accent: Color32::from_rgb(28, 113, 216),
            canvas_frame: Color32::from_rgb(209, 213, 219),
            error_text: Color32::from_rgb(192, 28, 40),
        }
    }

    pub fn dark() -> Self {
        Self {
            mode: ThemeMode::Dark,
            accent: Color32::from_rgb(99, 162, 255),
            canvas_frame: Color32::from_rgb(82, 88, 100),
            error_text: Color32::from_rgb(246, 97, 81),
        }
    }

    pub fn from_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self::light(),
            ThemeMode::Dark => Self::dark(),
        }
    }

    pub fn toggle(&mut self) {
        *self = match self.mode {
            ThemeMode::Light => Self::dark(),
            ThemeMode::Dark => Self::light(),
        };
    }

    /// Push this theme into egui's visuals. Widget selection and hyperlink
    /// colors follow the accent so every built-in control matches.
    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = match self.mode {
            ThemeMode::Light => egui::Visuals::light(),
            ThemeMode::Dark => egui::Visuals::dark(),
        };
        visuals.selection.bg_fill = self.accent.linear_multiply(0.35);
        visuals.selection.stroke = egui::Stroke::new(1.0, self.accent);
        visuals.hyperlink_color = self.accent;
        ctx.set_visuals(visuals);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_the_whole_palette() {
        let mut theme = Theme::light();
        theme.toggle();
        assert_eq!(theme.mode, ThemeMode::Dark);
        assert_eq!(theme.accent, Theme::dark().accent);
        theme.toggle();
        assert_eq!(theme.mode, ThemeMode::Light);
    }

    #[test]
    fn from_mode_matches_constructors() {
        assert_eq!(Theme::from_mode(ThemeMode::Light).mode, ThemeMode::Light);
        assert_eq!(Theme::from_mode(ThemeMode::Dark).mode, ThemeMode::Dark);
    }
}
