use core::str::FromStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fs, io};

use serde::Deserialize;

use super::types::{StickAxes, StickConfig, StickPolicy};

#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    #[error("{field}: invalid color {value:?} (expected #RRGGBB, #RGB or a color name)")]
    InvalidColor { field: &'static str, value: String },
    #[error("{field}: unknown tint mode {value:?}")]
    UnknownTintMode { field: &'static str, value: String },
    #[error("joystick_axis: unknown axis {0:?}")]
    UnknownAxis(String),
    #[error("border_width must not be negative, got {0}")]
    NegativeBorder(i32),
    #[error("{field}: set either a color or an image, not both")]
    ConflictingPaint { field: &'static str },
    #[error("{field}: failed reading {}: {source}", .path.display())]
    ImageRead {
        field: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    #[error("{field}: {} is not a usable image: {reason}", .path.display())]
    ImageDecode {
        field: &'static str,
        path: PathBuf,
        reason: String,
    },
    #[error("style decode failed: {0}")]
    Decode(#[from] toml::de::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0x00, 0x00, 0x00);
    pub const GRAY: Self = Self::rgb(0x88, 0x88, 0x88);
    pub const WHITE: Self = Self::rgb(0xFF, 0xFF, 0xFF);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    fn map(self, other: Self, f: impl Fn(u8, u8) -> u8) -> Self {
        Self::rgb(f(self.r, other.r), f(self.g, other.g), f(self.b, other.b))
    }
}

impl FromStr for Color {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim();
        match value.to_ascii_lowercase().as_str() {
            "black" => return Ok(Self::BLACK),
            "gray" | "grey" => return Ok(Self::GRAY),
            "white" => return Ok(Self::WHITE),
            _ => {}
        }
        let hex = value.strip_prefix('#').ok_or(())?;
        let digit = |index: usize| {
            hex.get(index..index + 1)
                .and_then(|d| u8::from_str_radix(d, 16).ok())
                .ok_or(())
        };
        match hex.len() {
            3 => Ok(Self::rgb(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
            6 => Ok(Self::rgb(
                digit(0)? * 16 + digit(1)?,
                digit(2)? * 16 + digit(3)?,
                digit(4)? * 16 + digit(5)?,
            )),
            _ => Err(()),
        }
    }
}

/// Tint blend modes, numbered like the Android `tintMode` attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TintMode {
    SrcOver,
    SrcIn,
    SrcAtop,
    Multiply,
    Screen,
    Add,
}

impl TintMode {
    pub fn from_persisted(code: i32) -> Option<Self> {
        match code {
            3 => Some(Self::SrcOver),
            5 => Some(Self::SrcIn),
            9 => Some(Self::SrcAtop),
            14 => Some(Self::Multiply),
            15 => Some(Self::Screen),
            16 => Some(Self::Add),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "src_over" => Some(Self::SrcOver),
            "src_in" => Some(Self::SrcIn),
            "src_atop" => Some(Self::SrcAtop),
            "multiply" => Some(Self::Multiply),
            "screen" => Some(Self::Screen),
            "add" => Some(Self::Add),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tint {
    pub color: Color,
    pub alpha: u8,
    pub mode: TintMode,
}

impl Tint {
    /// Blends the tint over an opaque `base` color.
    pub fn apply(&self, base: Color) -> Color {
        let alpha = u16::from(self.alpha);
        let over = |src: u8, dst: u8| {
            ((u16::from(src) * alpha + u16::from(dst) * (255 - alpha) + 127) / 255) as u8
        };
        match self.mode {
            TintMode::SrcOver | TintMode::SrcAtop => self.color.map(base, over),
            // The destination is opaque, so SRC_IN keeps the tint and drops the base.
            TintMode::SrcIn => self.color,
            TintMode::Multiply => {
                let product = self
                    .color
                    .map(base, |s, d| ((u16::from(s) * u16::from(d) + 127) / 255) as u8);
                product.map(base, over)
            }
            TintMode::Screen => {
                let screen = self.color.map(base, |s, d| {
                    let (s, d) = (u16::from(s), u16::from(d));
                    (s + d - (s * d + 127) / 255) as u8
                });
                screen.map(base, over)
            }
            TintMode::Add => {
                let sum = self.color.map(base, |s, d| s.saturating_add(d));
                sum.map(base, over)
            }
        }
    }
}

/// Opaque RGB bitmap used as a paint source. Cloning shares the pixel buffer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StickImage {
    width: u32,
    height: u32,
    pixels: Arc<[Color]>,
}

impl StickImage {
    /// Row-major pixels; `None` unless there are exactly `width * height` of them.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Color>) -> Option<Self> {
        if width == 0 || height == 0 || pixels.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: pixels.into(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Nearest-neighbour sample of the image stretched over a `size x size` square.
    pub fn sample(&self, col: u32, row: u32, size: u32) -> Color {
        let size = u64::from(size.max(1));
        let x = (u64::from(col) * u64::from(self.width) / size).min(u64::from(self.width - 1));
        let y = (u64::from(row) * u64::from(self.height) / size).min(u64::from(self.height - 1));
        self.pixels[(y * u64::from(self.width) + x) as usize]
    }
}

/// Source of a disc: a flat color or a bitmap stretched over the disc, optionally tinted.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Paint {
    pub color: Color,
    pub image: Option<StickImage>,
    pub tint: Option<Tint>,
}

impl Paint {
    pub const fn solid(color: Color) -> Self {
        Self {
            color,
            image: None,
            tint: None,
        }
    }

    pub fn image(image: StickImage) -> Self {
        Self {
            color: Color::BLACK,
            image: Some(image),
            tint: None,
        }
    }

    /// Tinted flat color; ignores any image.
    pub fn resolved(&self) -> Color {
        self.tinted(self.color)
    }

    /// Tinted source pixel at `(col, row)` of a disc `diameter` pixels wide.
    pub fn pixel(&self, col: u32, row: u32, diameter: u32) -> Color {
        match &self.image {
            Some(image) => self.tinted(image.sample(col, row, diameter)),
            None => self.resolved(),
        }
    }

    fn tinted(&self, source: Color) -> Color {
        match &self.tint {
            Some(tint) => tint.apply(source),
            None => source,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StickAppearance {
    pub base: Paint,
    pub stick: Paint,
    pub border_width: i32,
    pub border_color: Color,
}

impl Default for StickAppearance {
    fn default() -> Self {
        Self {
            base: Paint::solid(Color::GRAY),
            stick: Paint::solid(Color::BLACK),
            border_width: 0,
            border_color: Color::GRAY,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TintModeSpec {
    Code(i32),
    Name(String),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AxisSpec {
    Bits(u32),
    Name(String),
}

/// Declarative widget attributes. Every field is optional; unset fields keep the widget
/// defaults. Call [`StickStyle::resolve`] once to obtain validated values.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StickStyle {
    pub enabled: Option<bool>,
    pub base_color: Option<String>,
    pub base_image: Option<PathBuf>,
    pub base_tint: Option<String>,
    pub base_tint_alpha: Option<u8>,
    pub base_tint_mode: Option<TintModeSpec>,
    pub stick_color: Option<String>,
    pub stick_image: Option<PathBuf>,
    pub stick_tint: Option<String>,
    pub stick_tint_alpha: Option<u8>,
    pub stick_tint_mode: Option<TintModeSpec>,
    pub joystick_scale: Option<f32>,
    pub stick_size_ratio: Option<f32>,
    pub border_width: Option<i32>,
    pub border_color: Option<String>,
    pub joystick_axis: Option<AxisSpec>,
    pub recenter_stick: Option<bool>,
    pub fixed_center: Option<bool>,
    pub notify_min_interval_ms: Option<u64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedStyle {
    pub enabled: bool,
    pub config: StickConfig,
    pub appearance: StickAppearance,
}

impl StickStyle {
    pub fn from_toml_str(raw: &str) -> Result<Self, StyleError> {
        Ok(toml::from_str(raw)?)
    }

    /// Resolves with image paths taken as given.
    pub fn resolve(&self) -> Result<ResolvedStyle, StyleError> {
        self.resolve_in(Path::new(""))
    }

    /// Resolves, reading relative image paths from `dir`.
    pub fn resolve_in(&self, dir: &Path) -> Result<ResolvedStyle, StyleError> {
        let defaults = StickConfig::default();
        let appearance_defaults = StickAppearance::default();

        let axes = match &self.joystick_axis {
            None => defaults.policy.axes,
            Some(AxisSpec::Bits(bits)) => StickAxes::from_persisted(*bits),
            Some(AxisSpec::Name(name)) => parse_axis_name(name)?,
        };

        let border_width = self.border_width.unwrap_or(appearance_defaults.border_width);
        if border_width < 0 {
            return Err(StyleError::NegativeBorder(border_width));
        }

        let config = StickConfig {
            scale: self.joystick_scale.unwrap_or(defaults.scale),
            stick_size_ratio: self.stick_size_ratio.unwrap_or(defaults.stick_size_ratio),
            policy: StickPolicy {
                axes,
                recenter_on_release: self
                    .recenter_stick
                    .unwrap_or(defaults.policy.recenter_on_release),
                fixed_center: self.fixed_center.unwrap_or(defaults.policy.fixed_center),
            },
            notify_min_interval_ms: self
                .notify_min_interval_ms
                .unwrap_or(defaults.notify_min_interval_ms),
        }
        .sanitized();

        let mut base = parse_source(
            ("base_color", "base_image"),
            self.base_color.as_deref(),
            self.base_image.as_deref(),
            dir,
        )?
        .unwrap_or(appearance_defaults.base);
        base.tint = parse_tint(
            ("base_tint", "base_tint_mode"),
            self.base_tint.as_deref(),
            self.base_tint_alpha,
            self.base_tint_mode.as_ref(),
        )?;
        let mut stick = parse_source(
            ("stick_color", "stick_image"),
            self.stick_color.as_deref(),
            self.stick_image.as_deref(),
            dir,
        )?
        .unwrap_or(appearance_defaults.stick);
        stick.tint = parse_tint(
            ("stick_tint", "stick_tint_mode"),
            self.stick_tint.as_deref(),
            self.stick_tint_alpha,
            self.stick_tint_mode.as_ref(),
        )?;

        let appearance = StickAppearance {
            base,
            stick,
            border_width,
            border_color: parse_color("border_color", self.border_color.as_deref())?
                .unwrap_or(appearance_defaults.border_color),
        };

        Ok(ResolvedStyle {
            enabled: self.enabled.unwrap_or(true),
            config,
            appearance,
        })
    }
}

fn parse_axis_name(name: &str) -> Result<StickAxes, StyleError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "horizontal" => Ok(StickAxes::HORIZONTAL),
        "vertical" => Ok(StickAxes::VERTICAL),
        "both" => Ok(StickAxes::BOTH),
        _ => Err(StyleError::UnknownAxis(name.to_string())),
    }
}

fn parse_color(field: &'static str, raw: Option<&str>) -> Result<Option<Color>, StyleError> {
    raw.map(|value| {
        value.parse().map_err(|_| StyleError::InvalidColor {
            field,
            value: value.to_string(),
        })
    })
    .transpose()
}

/// Untinted paint from either a color or an image file; `None` when neither is set.
fn parse_source(
    fields: (&'static str, &'static str),
    color: Option<&str>,
    image: Option<&Path>,
    dir: &Path,
) -> Result<Option<Paint>, StyleError> {
    match (color, image) {
        (Some(_), Some(_)) => Err(StyleError::ConflictingPaint { field: fields.1 }),
        (color, None) => Ok(parse_color(fields.0, color)?.map(Paint::solid)),
        (None, Some(path)) => {
            let image = load_image(fields.1, &dir.join(path))?;
            Ok(Some(Paint::image(image)))
        }
    }
}

fn load_image(field: &'static str, path: &Path) -> Result<StickImage, StyleError> {
    let bytes = fs::read(path).map_err(|source| StyleError::ImageRead {
        field,
        path: path.to_path_buf(),
        source,
    })?;
    decode_image(&bytes).map_err(|reason| StyleError::ImageDecode {
        field,
        path: path.to_path_buf(),
        reason,
    })
}

#[cfg(feature = "graphics")]
fn decode_image(bytes: &[u8]) -> Result<StickImage, String> {
    StickImage::decode(bytes)
}

#[cfg(not(feature = "graphics"))]
fn decode_image(_bytes: &[u8]) -> Result<StickImage, String> {
    Err("image paints need the `graphics` feature".to_string())
}

fn parse_tint(
    fields: (&'static str, &'static str),
    color: Option<&str>,
    alpha: Option<u8>,
    mode: Option<&TintModeSpec>,
) -> Result<Option<Tint>, StyleError> {
    let Some(color) = parse_color(fields.0, color)? else {
        return Ok(None);
    };
    let mode = match mode {
        // Android falls back to SRC_IN when a tint has no explicit mode.
        None => TintMode::SrcIn,
        Some(TintModeSpec::Code(code)) => {
            TintMode::from_persisted(*code).ok_or_else(|| StyleError::UnknownTintMode {
                field: fields.1,
                value: code.to_string(),
            })?
        }
        Some(TintModeSpec::Name(name)) => {
            TintMode::from_name(name).ok_or_else(|| StyleError::UnknownTintMode {
                field: fields.1,
                value: name.clone(),
            })?
        }
    };
    Ok(Some(Tint {
        color,
        alpha: alpha.unwrap_or(u8::MAX),
        mode,
    }))
}
