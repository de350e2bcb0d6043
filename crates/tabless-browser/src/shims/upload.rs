use std::borrow::Cow;

use crate::canvas::RasterSurface;
use crate::decode::DecodedImage;
use crate::error::{HostError, Result};

/// Caller-supplied pixel buffer, tightly packed.
#[derive(Debug, Clone, Copy)]
pub struct RawImage<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    /// 1 (luma), 3 (RGB) or 4 (RGBA).
    pub channels: u8,
}

/// Anything `copyExternalImageToTexture` accepts.
#[derive(Debug, Clone, Copy)]
pub enum ImageSource<'a> {
    Raw(RawImage<'a>),
    Decoded(&'a DecodedImage),
    Raster(&'a RasterSurface),
}

impl<'a> ImageSource<'a> {
    pub fn size(&self) -> (u32, u32) {
        match self {
            Self::Raw(raw) => (raw.width, raw.height),
            Self::Decoded(img) => (img.width, img.height),
            Self::Raster(surface) => (surface.width(), surface.height()),
        }
    }

    /// Tightly packed RGBA8 pixels, converting other channel layouts.
    pub fn to_rgba8(&self) -> Result<Cow<'a, [u8]>> {
        let (width, height) = self.size();
        let pixels = width as usize * height as usize;

        let checked = |data: &[u8], channels: usize| -> Result<()> {
            if data.len() < pixels * channels {
                return Err(HostError::UnsupportedImageSource(format!(
                    "{width}x{height}x{channels} source has only {} bytes",
                    data.len()
                )));
            }
            Ok(())
        };

        match *self {
            Self::Decoded(img) => {
                checked(&img.pixels, 4)?;
                Ok(Cow::Borrowed(&img.pixels[..pixels * 4]))
            }
            Self::Raster(surface) => Ok(Cow::Borrowed(surface.as_rgba())),
            Self::Raw(raw) => {
                let channels = raw.channels as usize;
                match channels {
                    4 => {
                        checked(raw.data, 4)?;
                        Ok(Cow::Borrowed(&raw.data[..pixels * 4]))
                    }
                    3 => {
                        checked(raw.data, 3)?;
                        let mut out = Vec::with_capacity(pixels * 4);
                        for rgb in raw.data[..pixels * 3].chunks_exact(3) {
                            out.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
                        }
                        Ok(Cow::Owned(out))
                    }
                    1 => {
                        checked(raw.data, 1)?;
                        let mut out = Vec::with_capacity(pixels * 4);
                        for &l in &raw.data[..pixels] {
                            out.extend_from_slice(&[l, l, l, 255]);
                        }
                        Ok(Cow::Owned(out))
                    }
                    n => Err(HostError::UnsupportedImageSource(format!(
                        "{n}-channel raw buffer"
                    ))),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw(data: &[u8], w: u32, h: u32, channels: u8) -> ImageSource<'_> {
        ImageSource::Raw(RawImage { data, width: w, height: h, channels })
    }

    #[test]
    fn rgb_gets_opaque_alpha() {
        let src = raw(&[1, 2, 3, 4, 5, 6], 2, 1, 3);
        assert_eq!(&*src.to_rgba8().unwrap(), &[1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn luma_is_replicated() {
        let src = raw(&[7, 9], 1, 2, 1);
        assert_eq!(&*src.to_rgba8().unwrap(), &[7, 7, 7, 255, 9, 9, 9, 255]);
    }

    #[test]
    fn rgba_is_borrowed() {
        let data = [1, 2, 3, 4];
        let rgba = raw(&data, 1, 1, 4).to_rgba8().unwrap();
        assert!(matches!(rgba, Cow::Borrowed(_)));
    }

    #[test]
    fn bad_channel_count_and_short_buffer_fail() {
        assert!(matches!(
            raw(&[0; 8], 1, 1, 2).to_rgba8(),
            Err(HostError::UnsupportedImageSource(_))
        ));
        assert!(matches!(
            raw(&[0; 3], 2, 1, 4).to_rgba8(),
            Err(HostError::UnsupportedImageSource(_))
        ));
    }

    #[test]
    fn raster_surface_is_rgba() {
        let surface = RasterSurface::new(2, 2);
        let src = ImageSource::Raster(&surface);
        assert_eq!(src.size(), (2, 2));
        assert_eq!(src.to_rgba8().unwrap().len(), 16);
    }
}
