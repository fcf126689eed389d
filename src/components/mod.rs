pub mod image_panel;
pub mod overlay_panel;
pub mod text_panel;
