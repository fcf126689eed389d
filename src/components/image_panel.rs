use eframe::egui;

use crate::scene::SceneState;

/// Which ingestion slot the picker and window-level file drops target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ImageTab {
    #[default]
    Base,
    Overlay,
}

/// App-level request produced by the panel; the app owns the file dialogs
/// and the background decode jobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageAction {
    PickBase,
    PickOverlays,
}

/// Image ingestion: a two-tab chooser for the base slot and for overlays.
#[derive(Default)]
pub struct ImagePanel {
    pub active_tab: ImageTab,
}

impl ImagePanel {
    pub fn show(&mut self, ui: &mut egui::Ui, scene: &SceneState) -> Option<ImageAction> {
        let mut action = None;

        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.active_tab, ImageTab::Base, "Main image");
            ui.selectable_value(&mut self.active_tab, ImageTab::Overlay, "Overlays");
        });
        ui.add_space(4.0);

        match self.active_tab {
            ImageTab::Base => {
                match scene.base().map(|b| b.dimensions()) {
                    Some((w, h)) => {
                        ui.label(format!("Current: {w} × {h} px"));
                    }
                    None => {
                        ui.weak("No main image yet.");
                    }
                }
                if ui
                    .button(if scene.has_base() {
                        "Replace image…"
                    } else {
                        "Choose image…"
                    })
                    .clicked()
                {
                    action = Some(ImageAction::PickBase);
                }
                ui.weak("Or drop a file anywhere on the window.");
            }
            ImageTab::Overlay => {
                let count = scene.overlays().len();
                if count == 0 {
                    ui.weak("No overlays yet.");
                } else {
                    ui.label(format!(
                        "{count} overlay{}",
                        if count == 1 { "" } else { "s" }
                    ));
                }
                if ui.button("Add overlay image…").clicked() {
                    action = Some(ImageAction::PickOverlays);
                }
                ui.weak("Dropped files land here while this tab is active.");
            }
        }

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_starts_on_the_base_tab() {
        let panel = ImagePanel::default();
        assert_eq!(panel.active_tab, ImageTab::Base);
    }
}
