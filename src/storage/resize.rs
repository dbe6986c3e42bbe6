use std::io::Cursor;

use image::{imageops::FilterType, DynamicImage, ImageFormat};

use super::StorageError;

/// Target box and encoding for an uploaded picture
#[derive(Debug, Clone, Copy)]
pub struct ResizeSpec {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

pub const JOB_POSTING_IMAGE: ResizeSpec = ResizeSpec { width: 1080, height: 790, format: ImageFormat::Jpeg };
pub const PROJECT_MEMBER_IMAGE: ResizeSpec = ResizeSpec { width: 1080, height: 790, format: ImageFormat::Png };
pub const PROFILE_IMAGE: ResizeSpec = ResizeSpec { width: 110, height: 110, format: ImageFormat::Png };

impl ResizeSpec {
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// Stretch the image to exactly the target box, ignoring aspect ratio
pub fn fill_resize(bytes: &[u8], spec: ResizeSpec) -> Result<Vec<u8>, StorageError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| StorageError::InvalidImage(e.to_string()))?;
    let resized = decoded.resize_exact(spec.width, spec.height, FilterType::Triangle);

    // JPEG has no alpha channel
    let resized = match spec.format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
        _ => resized,
    };

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, spec.format)
        .map_err(|e| StorageError::InvalidImage(e.to_string()))?;
    Ok(out.into_inner())
}

/// `fill_resize` on the blocking pool
pub async fn fill_resize_blocking(bytes: Vec<u8>, spec: ResizeSpec) -> Result<Vec<u8>, StorageError> {
    tokio::task::spawn_blocking(move || fill_resize(&bytes, spec))
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn stretches_to_exact_box() {
        let out = fill_resize(&png(40, 10), PROFILE_IMAGE).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.dimensions(), (110, 110));
    }

    #[test]
    fn encodes_jpeg_from_rgba_input() {
        let out = fill_resize(&png(20, 20), JOB_POSTING_IMAGE).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        assert_eq!(image::load_from_memory(&out).unwrap().dimensions(), (1080, 790));
    }

    #[test]
    fn rejects_non_image_bytes() {
        let err = fill_resize(b"not an image", PROFILE_IMAGE).unwrap_err();
        assert!(matches!(err, StorageError::InvalidImage(_)));
    }

    #[tokio::test]
    async fn resizes_on_blocking_pool() {
        let out = fill_resize_blocking(png(5, 5), PROFILE_IMAGE).await.unwrap();
        assert!(!out.is_empty());
    }
}
