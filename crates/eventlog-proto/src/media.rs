//! Image and audio transcoding.
//!
//! Pixel arrays are converted to PNG at the highest compression level and
//! audio is always stored as 16-bit integer WAV, so what is written to the
//! log is lossless with respect to 8-bit pixels and 16-bit samples.

use std::io::Cursor;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use ndarray::{Array3, ArrayView3};

use crate::error::{EncodeError, EncodeResult};
use crate::schema::{Audio, Image};

/// MIME type of every encoded audio blob.
pub const AUDIO_CONTENT_TYPE: &str = "audio/wav";

/// Color layout of an image, by channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Grayscale = 1,
    GrayscaleAlpha = 2,
    Rgb = 3,
    Rgba = 4,
}

impl ColorSpace {
    /// Map a channel count to its color space.
    pub fn from_channels(channels: usize) -> Option<Self> {
        match channels {
            1 => Some(Self::Grayscale),
            2 => Some(Self::GrayscaleAlpha),
            3 => Some(Self::Rgb),
            4 => Some(Self::Rgba),
            _ => None,
        }
    }

    pub fn channels(self) -> usize {
        self as usize
    }

    fn png_color_type(self) -> ExtendedColorType {
        match self {
            Self::Grayscale => ExtendedColorType::L8,
            Self::GrayscaleAlpha => ExtendedColorType::La8,
            Self::Rgb => ExtendedColorType::Rgb8,
            Self::Rgba => ExtendedColorType::Rgba8,
        }
    }
}

/// An image to log.
///
/// Pixel arrays are channel-first, shaped `(channels, height, width)`.
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// An already-encoded image file, stored as-is
    Encoded {
        data: Vec<u8>,
        colorspace: ColorSpace,
        width: u32,
        height: u32,
    },
    /// 8-bit pixels, used as-is
    PixelsU8(Array3<u8>),
    /// Floating-point pixels in `[0, 1]`, scaled to 8 bits
    PixelsF32(Array3<f32>),
}

impl From<Array3<u8>> for ImageInput {
    fn from(pixels: Array3<u8>) -> Self {
        Self::PixelsU8(pixels)
    }
}

impl From<Array3<f32>> for ImageInput {
    fn from(pixels: Array3<f32>) -> Self {
        Self::PixelsF32(pixels)
    }
}

impl ImageInput {
    pub fn encode(self) -> EncodeResult<Image> {
        match self {
            Self::Encoded {
                data,
                colorspace,
                width,
                height,
            } => Ok(Image {
                height: dimension(height)?,
                width: dimension(width)?,
                colorspace: colorspace as i32,
                encoded_image_string: data,
            }),
            Self::PixelsU8(pixels) => encode_png(pixels.view()),
            Self::PixelsF32(pixels) => {
                let scaled = pixels.mapv(|v| (v.clamp(0.0, 1.0) * 255.0) as u8);
                encode_png(scaled.view())
            }
        }
    }
}

fn dimension(value: u32) -> EncodeResult<i32> {
    i32::try_from(value)
        .map_err(|_| EncodeError::InvalidImage(format!("dimension {} out of range", value)))
}

fn encode_png(pixels: ArrayView3<'_, u8>) -> EncodeResult<Image> {
    let (channels, height, width) = pixels.dim();
    let colorspace = ColorSpace::from_channels(channels).ok_or_else(|| {
        EncodeError::InvalidImage(format!("unsupported channel count {}", channels))
    })?;
    if height == 0 || width == 0 {
        return Err(EncodeError::InvalidImage(format!(
            "empty image {}x{}",
            width, height
        )));
    }
    let width = u32::try_from(width)
        .map_err(|_| EncodeError::InvalidImage(format!("width {} out of range", width)))?;
    let height = u32::try_from(height)
        .map_err(|_| EncodeError::InvalidImage(format!("height {} out of range", height)))?;

    // (C, H, W) -> interleaved (H, W, C)
    let interleaved: Vec<u8> = pixels.permuted_axes([1, 2, 0]).iter().copied().collect();

    let mut png = Vec::new();
    PngEncoder::new_with_quality(&mut png, CompressionType::Best, FilterType::Adaptive)
        .write_image(&interleaved, width, height, colorspace.png_color_type())?;

    Ok(Image {
        height: dimension(height)?,
        width: dimension(width)?,
        colorspace: colorspace as i32,
        encoded_image_string: png,
    })
}

/// Interleaved audio samples.
#[derive(Debug, Clone)]
pub enum AudioSamples {
    I16(Vec<i16>),
    /// Floating-point samples in `[-1, 1]`
    F32(Vec<f32>),
}

impl AudioSamples {
    fn len(&self) -> usize {
        match self {
            Self::I16(samples) => samples.len(),
            Self::F32(samples) => samples.len(),
        }
    }
}

impl From<Vec<i16>> for AudioSamples {
    fn from(samples: Vec<i16>) -> Self {
        Self::I16(samples)
    }
}

impl From<Vec<f32>> for AudioSamples {
    fn from(samples: Vec<f32>) -> Self {
        Self::F32(samples)
    }
}

/// A waveform to log.
#[derive(Debug, Clone)]
pub struct AudioInput {
    pub samples: AudioSamples,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioInput {
    pub fn new(samples: impl Into<AudioSamples>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
            channels,
        }
    }

    /// Mono waveform.
    pub fn mono(samples: impl Into<AudioSamples>, sample_rate: u32) -> Self {
        Self::new(samples, sample_rate, 1)
    }

    pub fn encode(self) -> EncodeResult<Audio> {
        if self.channels == 0 {
            return Err(EncodeError::InvalidAudio("zero channels".to_string()));
        }
        if self.sample_rate == 0 {
            return Err(EncodeError::InvalidAudio("zero sample rate".to_string()));
        }
        let total = self.samples.len();
        let channels = usize::from(self.channels);
        if total % channels != 0 {
            return Err(EncodeError::InvalidAudio(format!(
                "{} samples do not divide into {} channels",
                total, channels
            )));
        }

        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
            match &self.samples {
                AudioSamples::I16(samples) => {
                    for &sample in samples {
                        writer.write_sample(sample)?;
                    }
                }
                AudioSamples::F32(samples) => {
                    for &sample in samples {
                        let scaled = sample.clamp(-1.0, 1.0) * f32::from(i16::MAX);
                        writer.write_sample(scaled as i16)?;
                    }
                }
            }
            writer.finalize()?;
        }

        Ok(Audio {
            sample_rate: self.sample_rate as f32,
            num_channels: i64::from(self.channels),
            length_frames: (total / channels) as i64,
            encoded_audio_string: cursor.into_inner(),
            content_type: AUDIO_CONTENT_TYPE.to_string(),
        })
    }
}
