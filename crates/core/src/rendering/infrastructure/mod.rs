pub mod display_list;
pub mod image_surface;
pub mod label_font;
