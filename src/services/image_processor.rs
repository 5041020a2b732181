use image::imageops::FilterType;

const THUMBNAIL_SIZE: u32 = 256;

#[derive(thiserror::Error, Debug)]
pub enum ImageProcessingError {
    #[error("Could not decode image: {0}")]
    Decode(image::ImageError),

    #[error("Could not encode thumbnail: {0}")]
    Encode(image::ImageError),
}

/// Produces a PNG thumbnail that fits in a 256x256 box, preserving aspect
/// ratio.
pub fn make_thumbnail(data: &[u8]) -> Result<Vec<u8>, ImageProcessingError> {
    let img = image::load_from_memory(data).map_err(ImageProcessingError::Decode)?;

    // resize() would upscale a small image to fill the box; leave those as-is
    let thumb = if img.width() <= THUMBNAIL_SIZE && img.height() <= THUMBNAIL_SIZE {
        img
    } else {
        img.resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3)
    };

    let mut png_data = Vec::new();
    thumb
        .write_to(
            &mut std::io::Cursor::new(&mut png_data),
            image::ImageFormat::Png,
        )
        .map_err(ImageProcessingError::Encode)?;

    Ok(png_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 80, 200]),
        ));
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_thumbnail_fits_box() {
        let data = sample_png(1024, 512);
        let thumb_bytes = make_thumbnail(&data).unwrap();

        let thumb = image::load_from_memory(&thumb_bytes).unwrap();
        assert!(thumb.width() <= THUMBNAIL_SIZE);
        assert!(thumb.height() <= THUMBNAIL_SIZE);
        // Aspect ratio preserved: 2:1 input stays 2:1
        assert_eq!(thumb.width(), thumb.height() * 2);
    }

    #[test]
    fn test_small_image_is_not_enlarged() {
        let data = sample_png(64, 64);
        let thumb_bytes = make_thumbnail(&data).unwrap();

        let thumb = image::load_from_memory(&thumb_bytes).unwrap();
        assert_eq!(thumb.width(), 64);
        assert_eq!(thumb.height(), 64);
    }

    #[test]
    fn test_garbage_input_fails_to_decode() {
        assert!(matches!(
            make_thumbnail(b"definitely not an image"),
            Err(ImageProcessingError::Decode(_))
        ));
    }
}
