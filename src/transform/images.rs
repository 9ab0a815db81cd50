// src/transform/images.rs

//! Raster recompression and AVIF/WEBP conversion.
//!
//! Decoding and encoding are CPU-bound, so every transform here fans out
//! over its inputs with rayon. They are only ever called from the blocking
//! pool.

use std::path::{Path, PathBuf};

use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::DynamicImage;
use rayon::prelude::*;
use tracing::debug;

use crate::errors::TransformError;
use crate::transform::{with_extension, Output, SourceFile, Transform};

fn image_error(path: &Path, err: impl std::fmt::Display) -> TransformError {
    TransformError::Image {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn decode(file: &SourceFile) -> Result<DynamicImage, TransformError> {
    let bytes = file.read()?;
    image::load_from_memory(&bytes).map_err(|e| image_error(&file.path, e))
}

/// Encoders below accept 8-bit RGB(A) only.
fn to_rgb_or_rgba(img: DynamicImage) -> DynamicImage {
    if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.into_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.into_rgb8())
    }
}

fn par_apply<F>(inputs: &[SourceFile], f: F) -> Result<Vec<Output>, TransformError>
where
    F: Fn(&SourceFile) -> Result<Output, TransformError> + Sync + Send,
{
    inputs.par_iter().map(f).collect()
}

/// Lossy JPEG re-encode at a fixed quality, best-effort PNG recompression.
/// The original bytes are kept whenever re-encoding would not shrink them.
#[derive(Debug, Clone)]
pub struct RasterOptimize {
    dest: PathBuf,
    jpeg_quality: u8,
}

impl RasterOptimize {
    pub fn new(dest: impl Into<PathBuf>, jpeg_quality: u8) -> Self {
        Self {
            dest: dest.into(),
            jpeg_quality,
        }
    }

    fn optimize(&self, file: &SourceFile) -> Result<Output, TransformError> {
        let original = file.read()?;
        let img = image::load_from_memory(&original).map_err(|e| image_error(&file.path, e))?;
        let mut encoded = Vec::new();

        let ext = Path::new(&file.rel)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "jpg" | "jpeg" => {
                let encoder = JpegEncoder::new_with_quality(&mut encoded, self.jpeg_quality);
                DynamicImage::ImageRgb8(img.into_rgb8())
                    .write_with_encoder(encoder)
                    .map_err(|e| image_error(&file.path, e))?;
            }
            "png" => {
                let encoder = PngEncoder::new_with_quality(
                    &mut encoded,
                    CompressionType::Best,
                    FilterType::Adaptive,
                );
                to_rgb_or_rgba(img)
                    .write_with_encoder(encoder)
                    .map_err(|e| image_error(&file.path, e))?;
            }
            other => {
                return Err(image_error(&file.path, format!("unsupported raster format '{other}'")));
            }
        }

        let bytes = if encoded.len() < original.len() {
            debug!(file = %file.rel, before = original.len(), after = encoded.len(), "recompressed");
            encoded
        } else {
            original
        };
        Ok(Output::new(self.dest.join(&file.rel), bytes))
    }
}

impl Transform for RasterOptimize {
    fn label(&self) -> &'static str {
        "optimize-images"
    }

    fn apply(&self, inputs: &[SourceFile]) -> Result<Vec<Output>, TransformError> {
        par_apply(inputs, |file| self.optimize(file))
    }
}

/// `<stem>.avif` sibling per raster image.
#[derive(Debug, Clone)]
pub struct Avif {
    dest: PathBuf,
    quality: u8,
    speed: u8,
}

impl Avif {
    pub fn new(dest: impl Into<PathBuf>, quality: u8, speed: u8) -> Self {
        Self {
            dest: dest.into(),
            quality,
            speed,
        }
    }

    fn encode(&self, file: &SourceFile) -> Result<Output, TransformError> {
        let img = to_rgb_or_rgba(decode(file)?);
        let mut bytes = Vec::new();
        let encoder = AvifEncoder::new_with_speed_quality(&mut bytes, self.speed, self.quality);
        img.write_with_encoder(encoder)
            .map_err(|e| image_error(&file.path, e))?;
        Ok(Output::new(with_extension(&self.dest, &file.rel, "avif"), bytes))
    }
}

impl Transform for Avif {
    fn label(&self) -> &'static str {
        "avif"
    }

    fn apply(&self, inputs: &[SourceFile]) -> Result<Vec<Output>, TransformError> {
        par_apply(inputs, |file| self.encode(file))
    }
}

/// Lossless `<stem>.webp` sibling per raster image.
#[derive(Debug, Clone)]
pub struct Webp {
    dest: PathBuf,
}

impl Webp {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self { dest: dest.into() }
    }

    fn encode(&self, file: &SourceFile) -> Result<Output, TransformError> {
        let img = to_rgb_or_rgba(decode(file)?);
        let mut bytes = Vec::new();
        img.write_with_encoder(WebPEncoder::new_lossless(&mut bytes))
            .map_err(|e| image_error(&file.path, e))?;
        Ok(Output::new(with_extension(&self.dest, &file.rel, "webp"), bytes))
    }
}

impl Transform for Webp {
    fn label(&self) -> &'static str {
        "webp"
    }

    fn apply(&self, inputs: &[SourceFile]) -> Result<Vec<Output>, TransformError> {
        par_apply(inputs, |file| self.encode(file))
    }
}
