//! Camera channel groups that can be enabled for a conversion run.

use serde::{Deserialize, Serialize};

pub const IR_CAMERAS: [&str; 3] = ["ir_center", "ir_left", "ir_right"];
pub const RGB_CAMERAS: [&str; 3] = ["rgb_center", "rgb_left", "rgb_right"];
pub const RGB_HIGHRES_CAMERAS: [&str; 3] =
    ["rgb_highres_center", "rgb_highres_left", "rgb_highres_right"];

/// Which camera groups take part in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraGroups {
    pub ir: bool,
    pub rgb: bool,
    pub rgb_highres: bool,
}

impl Default for CameraGroups {
    fn default() -> Self {
        Self {
            ir: false,
            rgb: false,
            rgb_highres: true,
        }
    }
}

impl CameraGroups {
    /// Build from deployment-style string flags.
    pub fn from_flags(ir: &str, rgb: &str, rgb_highres: &str) -> Self {
        Self {
            ir: parse_flag(ir),
            rgb: parse_flag(rgb),
            rgb_highres: parse_flag(rgb_highres),
        }
    }

    /// Enabled channel names; the position in this list is the image slot.
    pub fn channels(&self) -> Vec<&'static str> {
        let mut channels = Vec::new();
        if self.ir {
            channels.extend(IR_CAMERAS);
        }
        if self.rgb {
            channels.extend(RGB_CAMERAS);
        }
        if self.rgb_highres {
            channels.extend(RGB_HIGHRES_CAMERAS);
        }
        channels
    }
}

/// `"true"` and `"True"` enable a flag, anything else disables it.
pub fn parse_flag(value: &str) -> bool {
    matches!(value, "true" | "True")
}
