//! Typed payloads and their conversion into summary values.

use crate::error::EncodeResult;
use crate::histogram::HistogramInput;
use crate::media::{AudioInput, ImageInput};
use crate::schema::{value, PluginData, SummaryMetadata, Value};
use crate::tensor::TensorInput;

/// Plugin name attached to text summaries that carry no caller metadata.
pub const TEXT_PLUGIN_NAME: &str = "text";

/// Descriptive metadata for a data series.
///
/// All fields are optional. Metadata that sets nothing is not attached to the
/// value at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub plugin_name: Option<String>,
    pub plugin_content: Option<Vec<u8>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn plugin(mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.plugin_name = Some(name.into());
        self.plugin_content = Some(content.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.description.is_none()
            && self.plugin_name.is_none()
            && self.plugin_content.is_none()
    }

    pub fn into_summary_metadata(self) -> Option<SummaryMetadata> {
        if self.is_empty() {
            return None;
        }
        let plugin_data = if self.plugin_name.is_some() || self.plugin_content.is_some() {
            Some(PluginData {
                plugin_name: self.plugin_name.unwrap_or_default(),
                content: self.plugin_content.unwrap_or_default(),
            })
        } else {
            None
        };
        Some(SummaryMetadata {
            plugin_data,
            display_name: self.display_name.unwrap_or_default(),
            summary_description: self.description.unwrap_or_default(),
        })
    }
}

/// One observation to record under a tag.
#[derive(Debug, Clone)]
pub enum Payload {
    Scalar(f64),
    Image(ImageInput),
    Audio(AudioInput),
    Text(String),
    Tensor(TensorInput),
    Histogram(HistogramInput),
}

impl Payload {
    /// Encode into a summary value for the fully-qualified `tag`.
    ///
    /// Media transcoding happens here, so this is the expensive step and is
    /// meant to run before any logger lock is taken.
    pub fn into_value(self, tag: String, metadata: Option<Metadata>) -> EncodeResult<Value> {
        let mut metadata = metadata.and_then(Metadata::into_summary_metadata);
        let kind = match self {
            Self::Scalar(v) => value::Kind::SimpleValue(v as f32),
            Self::Image(image) => value::Kind::Image(image.encode()?),
            Self::Audio(audio) => value::Kind::Audio(audio.encode()?),
            Self::Text(text) => {
                if metadata.is_none() {
                    metadata = Metadata::new()
                        .plugin(TEXT_PLUGIN_NAME, Vec::<u8>::new())
                        .into_summary_metadata();
                }
                value::Kind::Tensor(TensorInput::text(text).encode()?)
            }
            Self::Tensor(tensor) => value::Kind::Tensor(tensor.encode()?),
            Self::Histogram(histogram) => value::Kind::Histo(histogram.encode()?),
        };
        Ok(Value {
            tag,
            metadata,
            kind: Some(kind),
        })
    }
}

impl From<f64> for Payload {
    fn from(v: f64) -> Self {
        Self::Scalar(v)
    }
}

impl From<ImageInput> for Payload {
    fn from(image: ImageInput) -> Self {
        Self::Image(image)
    }
}

impl From<AudioInput> for Payload {
    fn from(audio: AudioInput) -> Self {
        Self::Audio(audio)
    }
}

impl From<TensorInput> for Payload {
    fn from(tensor: TensorInput) -> Self {
        Self::Tensor(tensor)
    }
}

impl From<HistogramInput> for Payload {
    fn from(histogram: HistogramInput) -> Self {
        Self::Histogram(histogram)
    }
}
