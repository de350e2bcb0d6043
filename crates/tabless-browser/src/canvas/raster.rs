use std::io::Cursor;

use base64::Engine as _;
use image::{imageops, ImageFormat, Pixel, Rgba, RgbaImage};

use crate::decode::DecodedImage;
use crate::error::{HostError, Result};

/// Pixels returned by `getImageData` and accepted by `putImageData`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    /// Unpremultiplied RGBA8, row-major, no padding.
    pub data: Vec<u8>,
}

impl ImageData {
    /// Transparent black pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }
}

/// CPU backing store of a canvas `2d` context.
#[derive(Debug)]
pub struct RasterSurface {
    pixels: RgbaImage,
    fill_style: [u8; 4],
    /// Set by every mutation; the bridge uploads the overlay when it is set.
    dirty: bool,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            fill_style: [0, 0, 0, 255],
            dirty: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Raw RGBA8 bytes, `4 * width` per row.
    pub fn as_rgba(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }

    /// Reallocates the buffer; contents and drawing state reset.
    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        self.pixels = RgbaImage::new(width, height);
        self.fill_style = [0, 0, 0, 255];
        self.dirty = true;
    }

    pub fn fill_style(&self) -> [u8; 4] {
        self.fill_style
    }

    /// `ctx.fillStyle = value`. Unparseable values are ignored, as in browsers.
    pub fn set_fill_style(&mut self, value: &str) {
        match parse_css_color(value) {
            Some(color) => self.fill_style = color,
            None => log::debug!("ignoring unsupported fillStyle {value:?}"),
        }
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let color = Rgba(self.fill_style);
        let Some((x0, y0, x1, y1)) = self.clip(x, y, w, h) else {
            return;
        };
        for py in y0..y1 {
            for px in x0..x1 {
                self.pixels.get_pixel_mut(px, py).blend(&color);
            }
        }
        self.dirty = true;
    }

    pub fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let Some((x0, y0, x1, y1)) = self.clip(x, y, w, h) else {
            return;
        };
        for py in y0..y1 {
            for px in x0..x1 {
                self.pixels.put_pixel(px, py, Rgba([0, 0, 0, 0]));
            }
        }
        self.dirty = true;
    }

    /// `ctx.drawImage(image, dx, dy)` with source-over blending.
    pub fn draw_image(&mut self, image: &DecodedImage, dx: i64, dy: i64) -> Result<()> {
        let top = RgbaImage::from_raw(image.width, image.height, image.pixels.clone()).ok_or_else(
            || HostError::UnsupportedImageSource("decoded image has inconsistent size".into()),
        )?;
        imageops::overlay(&mut self.pixels, &top, dx, dy);
        self.dirty = true;
        Ok(())
    }

    /// Copies a region out; pixels outside the canvas read as transparent black.
    pub fn get_image_data(&self, sx: i64, sy: i64, sw: u32, sh: u32) -> ImageData {
        let mut out = ImageData::new(sw, sh);
        for row in 0..sh {
            for col in 0..sw {
                let (x, y) = (sx + col as i64, sy + row as i64);
                if let Some(p) = self.get(x, y) {
                    let at = (row as usize * sw as usize + col as usize) * 4;
                    out.data[at..at + 4].copy_from_slice(&p);
                }
            }
        }
        out
    }

    /// Writes pixels verbatim (no blending), clipped to the canvas.
    pub fn put_image_data(&mut self, data: &ImageData, dx: i64, dy: i64) {
        for row in 0..data.height {
            for col in 0..data.width {
                let (x, y) = (dx + col as i64, dy + row as i64);
                if !self.contains(x, y) {
                    continue;
                }
                let at = (row as usize * data.width as usize + col as usize) * 4;
                let Some(src) = data.data.get(at..at + 4) else {
                    return;
                };
                self.pixels
                    .put_pixel(x as u32, y as u32, Rgba([src[0], src[1], src[2], src[3]]));
            }
        }
        self.dirty = true;
    }

    /// PNG encoding of the current contents.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.pixels.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// `canvas.toDataURL()`; a zero-area canvas yields `data:,` like browsers.
    pub fn to_data_url(&self) -> Result<String> {
        if self.width() == 0 || self.height() == 0 {
            return Ok("data:,".to_string());
        }
        let png = self.to_png()?;
        Ok(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png)
        ))
    }

    /// Returns whether the surface changed since the last call.
    pub(crate) fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width() as i64 && y < self.height() as i64
    }

    fn get(&self, x: i64, y: i64) -> Option<[u8; 4]> {
        self.contains(x, y).then(|| self.pixels.get_pixel(x as u32, y as u32).0)
    }

    /// Normalizes a rectangle (negative extents allowed) and clips it to the
    /// buffer. Returns half-open pixel bounds.
    fn clip(&self, x: f64, y: f64, w: f64, h: f64) -> Option<(u32, u32, u32, u32)> {
        if !(x.is_finite() && y.is_finite() && w.is_finite() && h.is_finite()) {
            return None;
        }
        let (l, r) = if w < 0.0 { (x + w, x) } else { (x, x + w) };
        let (t, b) = if h < 0.0 { (y + h, y) } else { (y, y + h) };

        let x0 = l.round().clamp(0.0, self.width() as f64) as u32;
        let x1 = r.round().clamp(0.0, self.width() as f64) as u32;
        let y0 = t.round().clamp(0.0, self.height() as f64) as u32;
        let y1 = b.round().clamp(0.0, self.height() as f64) as u32;
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }
}

/// Parses the CSS color forms demo code uses: `#rgb`, `#rgba`, `#rrggbb`,
/// `#rrggbbaa`, `rgb()`, `rgba()` and a few keywords.
pub fn parse_css_color(value: &str) -> Option<[u8; 4]> {
    let value = value.trim().to_ascii_lowercase();

    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }

    if let Some(args) = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let parts: Vec<&str> = args
            .split([',', ' ', '/'])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let channel = |s: &str| -> Option<u8> {
            match s.strip_suffix('%') {
                Some(pct) => Some((pct.parse::<f64>().ok()?.clamp(0.0, 100.0) * 2.55).round() as u8),
                None => Some(s.parse::<f64>().ok()?.round().clamp(0.0, 255.0) as u8),
            }
        };
        let alpha = match parts.get(3) {
            None => 255,
            Some(a) => match a.strip_suffix('%') {
                Some(pct) => (pct.parse::<f64>().ok()?.clamp(0.0, 100.0) * 2.55).round() as u8,
                None => (a.parse::<f64>().ok()?.clamp(0.0, 1.0) * 255.0).round() as u8,
            },
        };
        return Some([channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, alpha]);
    }

    match value.as_str() {
        "black" => Some([0, 0, 0, 255]),
        "white" => Some([255, 255, 255, 255]),
        "red" => Some([255, 0, 0, 255]),
        "green" => Some([0, 128, 0, 255]),
        "lime" => Some([0, 255, 0, 255]),
        "blue" => Some([0, 0, 255, 255]),
        "yellow" => Some([255, 255, 0, 255]),
        "gray" | "grey" => Some([128, 128, 128, 255]),
        "transparent" => Some([0, 0, 0, 0]),
        _ => None,
    }
}

fn parse_hex(hex: &str) -> Option<[u8; 4]> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some([nibble(0)?, nibble(1)?, nibble(2)?, 255]),
        4 => Some([nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?]),
        6 => Some([byte(0)?, byte(2)?, byte(4)?, 255]),
        8 => Some([byte(0)?, byte(2)?, byte(4)?, byte(6)?]),
        _ => None,
    }
}
