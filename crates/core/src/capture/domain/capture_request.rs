use std::fmt;

use crate::shared::constants::{
    CAPTURE_HEIGHT_HINT, CAPTURE_WIDTH_HINT, CAPTURE_WIDTH_HINT_NARROW, NARROW_DISPLAY_WIDTH,
};

/// Which physical camera to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FacingDirection {
    /// User-facing camera.
    Front,
    /// Environment-facing camera.
    #[default]
    Back,
}

impl FacingDirection {
    pub const ALL: &[FacingDirection] = &[FacingDirection::Front, FacingDirection::Back];

    pub fn flipped(self) -> Self {
        match self {
            FacingDirection::Front => FacingDirection::Back,
            FacingDirection::Back => FacingDirection::Front,
        }
    }
}

impl fmt::Display for FacingDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacingDirection::Front => write!(f, "front"),
            FacingDirection::Back => write!(f, "back"),
        }
    }
}

impl std::str::FromStr for FacingDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" | "user" => Ok(FacingDirection::Front),
            "back" | "environment" => Ok(FacingDirection::Back),
            other => Err(format!(
                "facing direction must be 'front' or 'back', got '{other}'"
            )),
        }
    }
}

/// Parameters for one camera acquisition.
///
/// Width and height are hints; the device may deliver another resolution,
/// so consumers must read dimensions back from the live source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRequest {
    pub facing: FacingDirection,
    pub width_hint: u32,
    pub height_hint: u32,
}

impl CaptureRequest {
    pub fn new(facing: FacingDirection, width_hint: u32, height_hint: u32) -> Self {
        Self {
            facing,
            width_hint,
            height_hint,
        }
    }

    /// Picks a resolution hint suited to a display of the given width.
    pub fn for_display_width(facing: FacingDirection, display_width: u32) -> Self {
        let width_hint = if display_width < NARROW_DISPLAY_WIDTH {
            CAPTURE_WIDTH_HINT_NARROW
        } else {
            CAPTURE_WIDTH_HINT
        };
        Self::new(facing, width_hint, CAPTURE_HEIGHT_HINT)
    }

    /// Same hints, other camera.
    pub fn with_facing(self, facing: FacingDirection) -> Self {
        Self { facing, ..self }
    }
}

impl Default for CaptureRequest {
    fn default() -> Self {
        Self::new(
            FacingDirection::default(),
            CAPTURE_WIDTH_HINT,
            CAPTURE_HEIGHT_HINT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_is_back_camera() {
        assert_eq!(FacingDirection::default(), FacingDirection::Back);
        assert_eq!(CaptureRequest::default().facing, FacingDirection::Back);
    }

    #[rstest]
    #[case(FacingDirection::Front, FacingDirection::Back)]
    #[case(FacingDirection::Back, FacingDirection::Front)]
    fn test_flipped(#[case] from: FacingDirection, #[case] to: FacingDirection) {
        assert_eq!(from.flipped(), to);
        assert_eq!(from.flipped().flipped(), from);
    }

    #[rstest]
    #[case(360, 360)]
    #[case(767, 360)]
    #[case(768, 800)]
    #[case(1920, 800)]
    fn test_width_hint_follows_display(#[case] display: u32, #[case] expected: u32) {
        let request = CaptureRequest::for_display_width(FacingDirection::Front, display);
        assert_eq!(request.width_hint, expected);
        assert_eq!(request.height_hint, 600);
    }

    #[rstest]
    #[case("front", FacingDirection::Front)]
    #[case("user", FacingDirection::Front)]
    #[case("BACK", FacingDirection::Back)]
    #[case("environment", FacingDirection::Back)]
    fn test_parse(#[case] input: &str, #[case] expected: FacingDirection) {
        assert_eq!(input.parse::<FacingDirection>().unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("sideways".parse::<FacingDirection>().is_err());
    }

    #[test]
    fn test_with_facing_keeps_hints() {
        let request = CaptureRequest::new(FacingDirection::Back, 360, 600);
        let flipped = request.with_facing(FacingDirection::Front);
        assert_eq!(flipped, CaptureRequest::new(FacingDirection::Front, 360, 600));
    }
}
