use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use stickpad::session::StickSide;
use stickpad::stick::{Padding, StickMoved, StickStyle, StickWidget, TouchAction};

/// Pad layout file: the touch surface plus one style table per stick.
///
/// ```toml
/// [surface]
/// width = 800
/// height = 400
/// padding = 16
///
/// [left]
/// joystick_axis = "horizontal"
///
/// [right]
/// fixed_center = false
/// stick_image = "knob.bmp"
/// ```
///
/// Image paths are relative to the layout file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PadLayout {
    pub surface: Surface,
    pub left: StickStyle,
    pub right: StickStyle,
    #[serde(skip)]
    pub dir: PathBuf,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Surface {
    pub width: i32,
    pub height: i32,
    pub padding: i32,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            padding: 16,
        }
    }
}

impl PadLayout {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading layout {}", path.display()))?;
        let mut layout: Self = toml::from_str(&raw)
            .with_context(|| format!("failed parsing layout {}", path.display()))?;
        layout.dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(layout)
    }
}

/// Two widgets side by side, each owning one half of the surface.
pub struct Pad {
    pub left: StickWidget,
    pub right: StickWidget,
    half_width: i32,
}

impl Pad {
    pub fn from_layout(layout: &PadLayout) -> Result<Self> {
        let left = layout.left.resolve_in(&layout.dir).context("invalid [left] style")?;
        let right = layout.right.resolve_in(&layout.dir).context("invalid [right] style")?;

        let half_width = layout.surface.width.max(0) / 2;
        let padding = Padding::uniform(layout.surface.padding.max(0));
        let mut pad = Self {
            left: StickWidget::from_style(&left),
            right: StickWidget::from_style(&right),
            half_width,
        };
        pad.left.set_size(0, half_width, layout.surface.height, padding);
        pad.right.set_size(0, half_width, layout.surface.height, padding);
        Ok(pad)
    }

    pub fn widget_mut(&mut self, side: StickSide) -> &mut StickWidget {
        match side {
            StickSide::Left => &mut self.left,
            StickSide::Right => &mut self.right,
        }
    }

    /// Routes a touch given in surface coordinates to the widget of `side`.
    pub fn touch(&mut self, now_ms: u64, side: StickSide, action: TouchAction) -> Option<StickMoved> {
        let shift = match side {
            StickSide::Left => 0.0,
            StickSide::Right => self.half_width as f32,
        };
        let action = match action {
            TouchAction::Down { x, y } => TouchAction::Down { x: x - shift, y },
            TouchAction::Move { x, y } => TouchAction::Move { x: x - shift, y },
            TouchAction::Up => TouchAction::Up,
        };
        self.widget_mut(side).on_touch(now_ms, action)
    }
}
