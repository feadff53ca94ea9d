use crate::AssetError;
use image::imageops::FilterType;
use image::RgbaImage;
use std::borrow::Cow;
use std::path::Path;

/// A decoded RGBA8 image, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureImage {
    /// A 1x1 image of a single color.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: rgba.to_vec(),
        }
    }

    /// Decode the image at `path`. The format is taken from the file contents.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let img = image::open(path.as_ref())?;
        Ok(Self::from(img.to_rgba8()))
    }

    /// Decode `path`, or log a warning and return a solid `fallback` image.
    ///
    /// The flag is `false` when the fallback was used.
    pub fn load_or_solid(path: impl AsRef<Path>, fallback: [u8; 4]) -> (Self, bool) {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(texture) => {
                tracing::debug!(
                    "loaded texture {} ({}x{})",
                    path.display(),
                    texture.width,
                    texture.height
                );
                (texture, true)
            }
            Err(e) => {
                tracing::warn!("texture failed to load at {}: {e}", path.display());
                (Self::solid(fallback), false)
            }
        }
    }

    /// Bytes per row, as needed for GPU uploads.
    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }

    pub fn resized(&self, width: u32, height: u32) -> Self {
        if self.width == width && self.height == height {
            return self.clone();
        }
        let Some(source) = RgbaImage::from_raw(self.width, self.height, self.rgba.clone()) else {
            return Self::solid([0, 0, 0, 255]);
        };
        Self::from(image::imageops::resize(
            &source,
            width,
            height,
            FilterType::Triangle,
        ))
    }

    /// Shrink so that neither side exceeds `max`, keeping the aspect ratio.
    pub fn fit_within(&self, max: u32) -> Cow<'_, Self> {
        let max = max.max(1);
        let longest = self.width.max(self.height);
        if longest <= max {
            return Cow::Borrowed(self);
        }
        let scale = |side: u32| {
            let scaled = (side as u64 * max as u64 + longest as u64 / 2) / longest as u64;
            (scaled as u32).clamp(1, max)
        };
        Cow::Owned(self.resized(scale(self.width), scale(self.height)))
    }
}

impl From<RgbaImage> for TextureImage {
    fn from(img: RgbaImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            rgba: img.into_raw(),
        }
    }
}

/// Six square faces of equal size in +X, -X, +Y, -Y, +Z, -Z order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubemapImages {
    size: u32,
    faces: [TextureImage; 6],
}

impl CubemapImages {
    /// Build a cubemap, resizing every face to match the first one.
    ///
    /// The edge length is the larger side of the first face.
    pub fn from_faces(faces: [TextureImage; 6]) -> Self {
        let size = faces[0].width.max(faces[0].height).max(1);
        let faces = faces.map(|face| {
            if face.width != size || face.height != size {
                tracing::debug!(
                    "resizing cubemap face {}x{} to {size}x{size}",
                    face.width,
                    face.height
                );
            }
            face.resized(size, size)
        });
        Self { size, faces }
    }

    /// A cubemap whose faces are all `rgba`.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self::from_faces(std::array::from_fn(|_| TextureImage::solid(rgba)))
    }

    /// Face edge length in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn faces(&self) -> &[TextureImage; 6] {
        &self.faces
    }

    /// Shrink every face to at most `max` pixels per side.
    pub fn fit_within(&self, max: u32) -> Cow<'_, Self> {
        let max = max.max(1);
        if self.size <= max {
            return Cow::Borrowed(self);
        }
        Cow::Owned(Self {
            size: max,
            faces: self.faces.each_ref().map(|face| face.resized(max, max)),
        })
    }
}
