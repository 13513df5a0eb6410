use std::io::Cursor;
use std::path::Path;

use crate::{
    errors::{BgBatchError, RemovalError, Result},
    imageops_ai::{mask, padding},
    traits::BackgroundRemover,
};
use image::{
    imageops, imageops::FilterType, DynamicImage, ImageBuffer, ImageFormat, Luma, Rgb, RgbImage,
    RgbaImage,
};
use ndarray::prelude::*;
use nshare::AsNdarray3;
use ort::value::TensorRef;
use ort::{
    execution_providers::{CUDAExecutionProvider, TensorRTExecutionProvider},
    session::{builder::SessionBuilder, Session},
};
use parking_lot::Mutex;

/// Segmentation model that predicts a foreground mask, used as a [`BackgroundRemover`].
pub struct Model {
    pub image_size: u32,
    output_format: ImageFormat,
    session: Mutex<Session>,
}

impl Model {
    pub fn new(model_path: &Path, device_id: i32, output_format: ImageFormat) -> Result<Self> {
        let mut session = SessionBuilder::new()
            .map_err(|e| model_error("session builder initialisation", e))?
            .with_execution_providers([
                TensorRTExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
            ])
            .map_err(|e| model_error("execution provider registration", e))?
            .with_memory_pattern(true)
            .map_err(|e| model_error("memory pattern setup", e))?
            .commit_from_file(model_path)
            .map_err(|e| model_error(format!("loading {}", model_path.display()), e))?;

        check_io_names(
            session.inputs.iter().map(|input| input.name.as_str()),
            session.outputs.iter().map(|output| output.name.as_str()),
        )?;

        let image_size = session
            .inputs
            .first()
            .and_then(|input| input.input_type.tensor_shape())
            .and_then(|shape| shape.get(2).copied())
            .and_then(|size| u32::try_from(size).ok())
            .filter(|&size| size > 0)
            .ok_or_else(|| BgBatchError::Model {
                operation: "reading the model input shape".to_string(),
                source: "expected a fixed square NCHW input".into(),
            })?;

        // ウォームアップ推論
        let data = Array4::<f32>::zeros((1, 3, image_size as usize, image_size as usize));
        let input = TensorRef::from_array_view(&data)
            .map_err(|e| model_error("warm-up tensor creation", e))?;
        session
            .run(ort::inputs!["img" => input])
            .map_err(|e| model_error("warm-up inference", e))?;

        Ok(Self {
            image_size,
            output_format,
            session: Mutex::new(session),
        })
    }

    pub fn predict(
        &self,
        tensor: ArrayView4<f32>,
    ) -> std::result::Result<Array4<f32>, RemovalError> {
        let mut binding = self.session.lock();
        let outputs = binding.run(
            ort::inputs!["img" => TensorRef::from_array_view(&tensor.as_standard_layout())?],
        )?;
        let mask = outputs.get("mask").ok_or_else(|| RemovalError::Model {
            operation: "reading the mask output".to_string(),
            source: "model has no `mask` output".into(),
        })?;
        Ok(mask
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix4>()?
            .to_owned())
    }

    fn segment(&self, image: &DynamicImage) -> std::result::Result<RgbaImage, RemovalError> {
        let rgb = image.to_rgb8();
        let (tensor, crop) = preprocess(&rgb, self.image_size)?;
        let prediction = self.predict(tensor.view())?;
        let (width, height) = rgb.dimensions();
        let mask = postprocess_mask(prediction.view(), self.image_size, crop, width, height)?;
        mask::apply(&rgb, &mask).map_err(|e| RemovalError::Model {
            operation: "mask application".to_string(),
            source: Box::new(e),
        })
    }
}

impl BackgroundRemover for Model {
    fn remove(&self, image: &[u8]) -> std::result::Result<Vec<u8>, RemovalError> {
        let decoded = image::load_from_memory(image).map_err(RemovalError::Decode)?;
        let cutout = self.segment(&decoded)?;
        encode(cutout, self.output_format)
    }
}

/// モデルが `img` 入力と `mask` 出力を持つことを確認
fn check_io_names<'a>(
    inputs: impl IntoIterator<Item = &'a str>,
    outputs: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    for (kind, expected, mut names) in [
        ("input", "img", inputs.into_iter().collect::<Vec<_>>()),
        ("output", "mask", outputs.into_iter().collect::<Vec<_>>()),
    ] {
        if !names.contains(&expected) {
            names.sort_unstable();
            return Err(BgBatchError::Model {
                operation: "checking the model signature".to_string(),
                source: format!("no `{expected}` {kind}, found {names:?}").into(),
            });
        }
    }
    Ok(())
}

fn model_error(operation: impl Into<String>, source: impl std::fmt::Display) -> BgBatchError {
    BgBatchError::Model {
        operation: operation.into(),
        source: source.to_string().into(),
    }
}

/// Letterbox `image` into an `image_size` square and build a `1×3×S×S` tensor in `[0, 1]`.
///
/// Also returns `[x, y, w, h]`, the region of the square the image occupies.
pub fn preprocess(
    image: &RgbImage,
    image_size: u32,
) -> std::result::Result<(Array4<f32>, [u32; 4]), RemovalError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || image_size == 0 {
        return Err(RemovalError::Rejected(format!(
            "cannot letterbox a {width}x{height} image into {image_size}x{image_size}"
        )));
    }

    let scale = image_size as f32 / width.max(height) as f32;
    let w = ((width as f32 * scale).round() as u32).clamp(1, image_size);
    let h = ((height as f32 * scale).round() as u32).clamp(1, image_size);
    let resized = imageops::resize(image, w, h, FilterType::Lanczos3);

    let (canvas, (x, y)) = padding::pad_center(&resized, image_size, image_size, Rgb([0, 0, 0]))
        .ok_or_else(|| {
            RemovalError::Rejected("resized image larger than model input".to_string())
        })?;

    let tensor = canvas
        .as_ndarray3()
        .slice_move(s![NewAxis, ..;-1, .., ..])
        .mapv(|v| f32::from(v) / 255.0);

    Ok((tensor, [x, y, w, h]))
}

/// Cut the letterbox region out of the predicted mask and scale it back to `width`×`height`.
pub fn postprocess_mask(
    mask: ArrayView4<f32>,
    image_size: u32,
    crop: [u32; 4],
    width: u32,
    height: u32,
) -> std::result::Result<ImageBuffer<Luma<f32>, Vec<f32>>, RemovalError> {
    let [x, y, w, h] = crop;
    let values = mask.iter().copied().collect::<Vec<f32>>();
    let mask = ImageBuffer::<Luma<f32>, _>::from_raw(image_size, image_size, values).ok_or_else(
        || RemovalError::Model {
            operation: "mask reshaping".to_string(),
            source: format!("expected a 1x1x{image_size}x{image_size} mask").into(),
        },
    )?;
    let mask = imageops::crop_imm(&mask, x, y, w, h).to_image();
    Ok(imageops::resize(&mask, width, height, FilterType::Lanczos3))
}

/// Encode the cut-out. Formats without an alpha channel get the RGB data only.
pub fn encode(
    image: RgbaImage,
    format: ImageFormat,
) -> std::result::Result<Vec<u8>, RemovalError> {
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(image).to_rgb8()),
        _ => DynamicImage::ImageRgba8(image),
    };

    let mut encoded = Cursor::new(Vec::new());
    image
        .write_to(&mut encoded, format)
        .map_err(RemovalError::Encode)?;
    Ok(encoded.into_inner())
}
