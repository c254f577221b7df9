// src/ingest/crop.rs

use std::io::Cursor;

use async_trait::async_trait;
use image::ImageOutputFormat;

use super::{CropRect, ImageCropper, IngestionError};
use crate::utils::data_url::DataUrl;

/// Crops decoded raster images and re-encodes them as PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCropper;

#[async_trait]
impl ImageCropper for RasterCropper {
    async fn crop(&self, image: &DataUrl, rect: CropRect) -> Result<DataUrl, IngestionError> {
        let image = image.clone();
        tokio::task::spawn_blocking(move || crop_to_png(&image, rect))
            .await
            .map_err(IngestionError::image)?
    }
}

pub fn crop_to_png(image: &DataUrl, rect: CropRect) -> Result<DataUrl, IngestionError> {
    let decoded = image::load_from_memory(&image.bytes).map_err(IngestionError::image)?;

    let (x, y, width, height) = rect
        .clamp_to(decoded.width(), decoded.height())
        .ok_or_else(|| IngestionError::image("crop area lies outside the image"))?;

    let cropped = decoded.crop_imm(x, y, width, height);

    let mut buffer = Cursor::new(Vec::new());
    cropped
        .write_to(&mut buffer, ImageOutputFormat::Png)
        .map_err(IngestionError::image)?;

    Ok(DataUrl::new("image/png", buffer.into_inner()))
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

    use super::*;

    fn sample_png(width: u32, height: u32) -> DataUrl {
        let mut img = RgbImage::new(width, height);
        img.put_pixel(3, 2, Rgb([255, 0, 0]));

        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, ImageOutputFormat::Png)
            .unwrap();
        DataUrl::new("image/png", buffer.into_inner())
    }

    #[test]
    fn crops_to_requested_region() {
        let rect = CropRect { x: 3.0, y: 2.0, width: 4.0, height: 3.0 };
        let cropped = crop_to_png(&sample_png(10, 8), rect).unwrap();

        let decoded = image::load_from_memory(&cropped.bytes).unwrap();
        assert_eq!(cropped.mime, "image/png");
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.to_rgb8().get_pixel(0, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn oversized_rect_is_clamped() {
        let rect = CropRect { x: 5.0, y: 0.0, width: 100.0, height: 100.0 };
        let cropped = crop_to_png(&sample_png(10, 8), rect).unwrap();

        let decoded = image::load_from_memory(&cropped.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (5, 8));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let rect = CropRect { x: 0.0, y: 0.0, width: 1.0, height: 1.0 };
        let err = crop_to_png(&DataUrl::new("image/png", b"nope".to_vec()), rect).unwrap_err();
        assert!(matches!(err, IngestionError::Image { .. }));
    }
}
