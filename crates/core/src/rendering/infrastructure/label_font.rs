use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::FontArc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelFontError {
    #[error("failed to read font {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not a usable TrueType or OpenType font")]
    Invalid(PathBuf),
}

/// Well-known locations of a plain sans-serif face on each desktop platform.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

pub fn load_label_font(path: &Path) -> Result<FontArc, LabelFontError> {
    let bytes = fs::read(path).map_err(|source| LabelFontError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    FontArc::try_from_vec(bytes).map_err(|_| LabelFontError::Invalid(path.to_path_buf()))
}

/// First installed system font that parses, if any.
pub fn find_system_font() -> Option<FontArc> {
    SYSTEM_FONT_CANDIDATES
        .iter()
        .map(Path::new)
        .filter(|p| p.is_file())
        .find_map(|p| match load_label_font(p) {
            Ok(font) => {
                log::debug!("Using label font {}", p.display());
                Some(font)
            }
            Err(e) => {
                log::debug!("Skipping label font: {e}");
                None
            }
        })
}
