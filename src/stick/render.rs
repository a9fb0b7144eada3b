use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Circle, PrimitiveStyle},
};

use crate::config::STICK_SPRITE_CACHE_MAX;

use super::style::{Color, Paint, StickImage};
use super::StickWidget;

impl From<Color> for Rgb888 {
    fn from(color: Color) -> Self {
        Rgb888::new(color.r, color.g, color.b)
    }
}

impl StickImage {
    /// Decodes a PNG or BMP file. Alpha is dropped; the disc mask does the cropping.
    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        let rgb = ::image::load_from_memory(bytes)
            .map_err(|err| err.to_string())?
            .to_rgb8();
        let (width, height) = rgb.dimensions();
        let pixels = rgb.pixels().map(|p| Color::rgb(p[0], p[1], p[2])).collect();
        Self::from_pixels(width, height, pixels).ok_or_else(|| "image has no pixels".to_string())
    }
}

/// Circle-masked, tinted disc of `diameter` pixels. `None` pixels are transparent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StickSprite {
    pub diameter: u32,
    pixels: Vec<Option<Rgb888>>,
}

impl StickSprite {
    fn render(paint: &Paint, diameter: u32) -> Self {
        let d = i64::from(diameter);
        let mut pixels = Vec::with_capacity((diameter * diameter) as usize);
        for row in 0..diameter {
            for col in 0..diameter {
                let dx = 2 * i64::from(col) + 1 - d;
                let dy = 2 * i64::from(row) + 1 - d;
                let inside = dx * dx + dy * dy <= d * d;
                pixels.push(inside.then(|| Rgb888::from(paint.pixel(col, row, diameter))));
            }
        }
        Self { diameter, pixels }
    }

    pub fn pixel(&self, col: u32, row: u32) -> Option<Rgb888> {
        if col >= self.diameter || row >= self.diameter {
            return None;
        }
        self.pixels[(row * self.diameter + col) as usize]
    }

    fn draw_at<D>(&self, target: &mut D, top_left: Point) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let diameter = self.diameter as i32;
        target.draw_iter(self.pixels.iter().enumerate().filter_map(|(index, pixel)| {
            let index = index as i32;
            pixel.map(|color| {
                Pixel(
                    top_left + Point::new(index % diameter, index / diameter),
                    color,
                )
            })
        }))
    }
}

/// Scaled sprites keyed by paint (source color or image, plus tint) and size. Oldest
/// entries are evicted once the cache is full.
#[derive(Debug, Default)]
pub struct SpriteCache {
    entries: Vec<((Paint, u32), StickSprite)>,
    renders: u32,
}

impl SpriteCache {
    pub fn get(&mut self, paint: &Paint, diameter: u32) -> &StickSprite {
        let found = self
            .entries
            .iter()
            .position(|((p, d), _)| *d == diameter && p == paint);
        let index = match found {
            Some(index) => index,
            None => {
                if self.entries.len() >= STICK_SPRITE_CACHE_MAX {
                    self.entries.remove(0);
                }
                self.renders = self.renders.saturating_add(1);
                let sprite = StickSprite::render(paint, diameter);
                self.entries.push(((paint.clone(), diameter), sprite));
                self.entries.len() - 1
            }
        };
        &self.entries[index].1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of sprites rendered since creation, cache hits excluded.
    pub fn renders(&self) -> u32 {
        self.renders
    }
}

impl StickWidget {
    /// Draws base disc, optional border ring and stick disc. A degenerate stick draws nothing.
    pub fn draw<D>(&mut self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let layout = self.layout;
        if layout.radius <= 0 || layout.stick_radius <= 0 {
            return Ok(());
        }
        let center = Point::new(layout.center_x, layout.center_y);
        let position = self.geometry().position();

        let base_diameter = (layout.radius * 2) as u32;
        self.sprites
            .get(&self.appearance.base, base_diameter)
            .draw_at(target, center - Point::new(layout.radius, layout.radius))?;

        if self.appearance.border_width > 0 {
            Circle::with_center(center, base_diameter)
                .into_styled(PrimitiveStyle::with_stroke(
                    Rgb888::from(self.appearance.border_color),
                    self.appearance.border_width as u32,
                ))
                .draw(target)?;
        }

        let stick_diameter = (layout.stick_radius * 2) as u32;
        let stick_origin = center + Point::new(position.x, position.y)
            - Point::new(layout.stick_radius, layout.stick_radius);
        self.sprites
            .get(&self.appearance.stick, stick_diameter)
            .draw_at(target, stick_origin)
    }

    pub fn sprite_cache(&self) -> &SpriteCache {
        &self.sprites
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use super::*;
    use crate::stick::style::{
        StickAppearance, StickImage, StickStyle, StyleError, Tint, TintMode,
    };
    use crate::stick::{Padding, StickConfig, TouchAction};

    struct Framebuffer {
        width: u32,
        height: u32,
        pixels: Vec<Rgb888>,
    }

    impl Framebuffer {
        fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                pixels: vec![Rgb888::WHITE; (width * height) as usize],
            }
        }

        fn at(&self, x: u32, y: u32) -> Rgb888 {
            self.pixels[(y * self.width + x) as usize]
        }
    }

    impl OriginDimensions for Framebuffer {
        fn size(&self) -> Size {
            Size::new(self.width, self.height)
        }
    }

    impl DrawTarget for Framebuffer {
        type Color = Rgb888;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            for Pixel(point, color) in pixels {
                if point.x < 0 || point.y < 0 {
                    continue;
                }
                let (x, y) = (point.x as u32, point.y as u32);
                if x < self.width && y < self.height {
                    self.pixels[(y * self.width + x) as usize] = color;
                }
            }
            Ok(())
        }
    }

    /// Uncompressed 24-bit BMP; `pixels` are row-major, top row first.
    fn bmp24(width: u32, height: u32, pixels: &[Color]) -> Vec<u8> {
        let stride = (width * 3).div_ceil(4) * 4;
        let data_len = stride * height;
        let mut bmp = b"BM".to_vec();
        bmp.extend_from_slice(&(54 + data_len).to_le_bytes());
        bmp.extend_from_slice(&0u32.to_le_bytes());
        bmp.extend_from_slice(&54u32.to_le_bytes());
        bmp.extend_from_slice(&40u32.to_le_bytes());
        bmp.extend_from_slice(&(width as i32).to_le_bytes());
        bmp.extend_from_slice(&(height as i32).to_le_bytes());
        bmp.extend_from_slice(&1u16.to_le_bytes());
        bmp.extend_from_slice(&24u16.to_le_bytes());
        bmp.extend_from_slice(&0u32.to_le_bytes());
        bmp.extend_from_slice(&data_len.to_le_bytes());
        bmp.extend_from_slice(&2835i32.to_le_bytes());
        bmp.extend_from_slice(&2835i32.to_le_bytes());
        bmp.extend_from_slice(&0u32.to_le_bytes());
        bmp.extend_from_slice(&0u32.to_le_bytes());
        // Bottom-up rows, BGR, padded to four bytes.
        for row in (0..height).rev() {
            let start = bmp.len();
            for col in 0..width {
                let color = pixels[(row * width + col) as usize];
                bmp.extend_from_slice(&[color.b, color.g, color.r]);
            }
            bmp.resize(start + stride as usize, 0);
        }
        bmp
    }

    const RED: Color = Color::rgb(0xFF, 0, 0);
    const GREEN: Color = Color::rgb(0, 0xFF, 0);
    const BLUE: Color = Color::rgb(0, 0, 0xFF);

    fn quadrants() -> StickImage {
        let bytes = bmp24(2, 2, &[RED, GREEN, BLUE, Color::WHITE]);
        StickImage::decode(&bytes).unwrap()
    }

    fn widget(appearance: StickAppearance) -> StickWidget {
        let config = StickConfig {
            scale: 1.0,
            ..StickConfig::default()
        };
        let mut widget = StickWidget::new(config, appearance);
        widget.set_size(0, 100, 100, Padding::default());
        widget
    }

    #[test]
    fn sprite_is_masked_to_a_disc() {
        let sprite = StickSprite::render(&Paint::solid(Color::BLACK), 10);
        assert_eq!(sprite.pixel(5, 5), Some(Rgb888::BLACK));
        assert_eq!(sprite.pixel(0, 0), None);
        assert_eq!(sprite.pixel(9, 9), None);
        assert_eq!(sprite.pixel(0, 5), Some(Rgb888::BLACK));
        assert_eq!(sprite.pixel(10, 5), None);
    }

    #[test]
    fn cache_reuses_and_evicts() {
        let mut cache = SpriteCache::default();
        let paint = Paint::solid(Color::GRAY);
        cache.get(&paint, 20);
        cache.get(&paint, 20);
        assert_eq!(cache.renders(), 1);

        let tinted = Paint {
            tint: Some(Tint {
                color: Color::WHITE,
                alpha: 255,
                mode: TintMode::SrcIn,
            }),
            ..Paint::solid(Color::GRAY)
        };
        assert_eq!(cache.get(&tinted, 20).pixel(10, 10), Some(Rgb888::WHITE));
        assert_eq!(cache.renders(), 2);

        for diameter in 1..=STICK_SPRITE_CACHE_MAX as u32 {
            cache.get(&paint, diameter);
        }
        assert_eq!(cache.len(), STICK_SPRITE_CACHE_MAX);
    }

    #[test]
    fn stick_disc_follows_the_touch() {
        let mut widget = widget(StickAppearance::default());
        let mut fb = Framebuffer::new(100, 100);
        widget.draw(&mut fb).unwrap();
        assert_eq!(fb.at(50, 50), Rgb888::BLACK);
        assert_eq!(fb.at(50, 20), Rgb888::from(Color::GRAY));
        assert_eq!(fb.at(0, 0), Rgb888::WHITE);

        widget.on_touch(0, TouchAction::Down { x: 80.0, y: 50.0 });
        let mut fb = Framebuffer::new(100, 100);
        widget.draw(&mut fb).unwrap();
        assert_eq!(fb.at(80, 50), Rgb888::BLACK);
        assert_eq!(fb.at(50, 50), Rgb888::from(Color::GRAY));
        assert_eq!(widget.sprite_cache().renders(), 2);
    }

    #[test]
    fn border_ring_is_stroked() {
        let appearance = StickAppearance {
            border_width: 2,
            border_color: Color::rgb(0xFF, 0, 0),
            ..StickAppearance::default()
        };
        let mut widget = widget(appearance);
        let mut fb = Framebuffer::new(100, 100);
        widget.draw(&mut fb).unwrap();
        assert_eq!(widget.layout().radius, 49);
        assert_eq!(fb.at(50, 1), Rgb888::new(0xFF, 0, 0));
    }

    #[test]
    fn bmp_decodes_top_row_first() {
        let image = quadrants();
        assert_eq!((image.width(), image.height()), (2, 2));
        assert_eq!(image.sample(0, 0, 2), RED);
        assert_eq!(image.sample(1, 1, 2), Color::WHITE);
        assert!(StickImage::decode(b"BM not a bitmap").is_err());
    }

    #[test]
    fn image_sprite_is_stretched_masked_and_tinted() {
        let paint = Paint::image(quadrants());
        let sprite = StickSprite::render(&paint, 10);
        assert_eq!(sprite.pixel(2, 2), Some(Rgb888::from(RED)));
        assert_eq!(sprite.pixel(7, 2), Some(Rgb888::from(GREEN)));
        assert_eq!(sprite.pixel(2, 7), Some(Rgb888::from(BLUE)));
        assert_eq!(sprite.pixel(7, 7), Some(Rgb888::WHITE));
        assert_eq!(sprite.pixel(0, 0), None);

        let tinted = Paint {
            tint: Some(Tint {
                color: Color::BLACK,
                alpha: 255,
                mode: TintMode::SrcIn,
            }),
            ..paint.clone()
        };
        let mut cache = SpriteCache::default();
        assert_eq!(cache.get(&paint, 10), &sprite);
        assert_eq!(cache.get(&tinted, 10).pixel(7, 7), Some(Rgb888::BLACK));
        assert_eq!(cache.get(&paint, 10).pixel(7, 7), Some(Rgb888::WHITE));
        assert_eq!(cache.renders(), 2);
    }

    #[test]
    fn style_images_are_read_relative_to_the_layout_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("knob.bmp"),
            bmp24(2, 2, &[RED, GREEN, BLUE, Color::WHITE]),
        )
        .unwrap();

        let style = StickStyle::from_toml_str(
            r##"
            stick_image = "knob.bmp"
            stick_tint = "#000"
            stick_tint_alpha = 0
            stick_tint_mode = "src_over"
            "##,
        )
        .unwrap();
        let resolved = style.resolve_in(dir.path()).unwrap();
        let stick = &resolved.appearance.stick;
        assert_eq!(stick.image.as_ref(), Some(&quadrants()));
        assert_eq!(stick.pixel(0, 0, 4), RED);
        assert_eq!(resolved.appearance.base, StickAppearance::default().base);

        assert!(matches!(
            style.resolve(),
            Err(StyleError::ImageRead { field: "stick_image", .. })
        ));
        std::fs::write(dir.path().join("broken.bmp"), b"not a bitmap").unwrap();
        let broken = StickStyle {
            base_image: Some("broken.bmp".into()),
            ..StickStyle::default()
        };
        assert!(matches!(
            broken.resolve_in(dir.path()),
            Err(StyleError::ImageDecode { field: "base_image", .. })
        ));
    }

    #[test]
    fn image_base_is_drawn_under_the_stick() {
        let appearance = StickAppearance {
            base: Paint::image(quadrants()),
            ..StickAppearance::default()
        };
        let mut widget = widget(appearance);
        let mut fb = Framebuffer::new(100, 100);
        widget.draw(&mut fb).unwrap();
        assert_eq!(fb.at(25, 25), Rgb888::from(RED));
        assert_eq!(fb.at(75, 25), Rgb888::from(GREEN));
        assert_eq!(fb.at(25, 75), Rgb888::from(BLUE));
        assert_eq!(fb.at(50, 50), Rgb888::BLACK);
    }

    #[test]
    fn degenerate_layout_draws_nothing() {
        let mut widget = StickWidget::default();
        widget.set_size(0, 0, 0, Padding::default());
        let mut fb = Framebuffer::new(10, 10);
        widget.draw(&mut fb).unwrap();
        assert!(fb.pixels.iter().all(|p| *p == Rgb888::WHITE));
    }
}
