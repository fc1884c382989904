//! N-dimensional tensor payloads.

use ndarray::{ArrayD, IxDyn};

use crate::error::{EncodeError, EncodeResult};
use crate::schema::{DataType, TensorDim, TensorProto, TensorShapeProto};

/// Element storage for a tensor payload.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    U8(ArrayD<u8>),
    Bool(ArrayD<bool>),
    Str(ArrayD<String>),
}

macro_rules! tensor_data_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<ArrayD<$ty>> for TensorData {
                fn from(array: ArrayD<$ty>) -> Self {
                    Self::$variant(array)
                }
            }
        )*
    };
}

tensor_data_from! {
    f32 => F32,
    f64 => F64,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    bool => Bool,
    String => Str,
}

impl TensorData {
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::F32(a) => a.shape(),
            Self::F64(a) => a.shape(),
            Self::I32(a) => a.shape(),
            Self::I64(a) => a.shape(),
            Self::U8(a) => a.shape(),
            Self::Bool(a) => a.shape(),
            Self::Str(a) => a.shape(),
        }
    }

    fn dtype(&self) -> DataType {
        match self {
            Self::F32(_) => DataType::DtFloat,
            Self::F64(_) => DataType::DtDouble,
            Self::I32(_) => DataType::DtInt32,
            Self::I64(_) => DataType::DtInt64,
            Self::U8(_) => DataType::DtUint8,
            Self::Bool(_) => DataType::DtBool,
            Self::Str(_) => DataType::DtString,
        }
    }
}

/// A tensor to log, optionally with one name per dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorInput {
    pub data: TensorData,
    pub dim_names: Option<Vec<String>>,
}

impl TensorInput {
    pub fn new(data: impl Into<TensorData>) -> Self {
        Self {
            data: data.into(),
            dim_names: None,
        }
    }

    /// Rank-0 string tensor.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(ArrayD::from_elem(IxDyn(&[]), text.into()))
    }

    pub fn with_dim_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dim_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn encode(self) -> EncodeResult<TensorProto> {
        let shape = self.data.shape().to_vec();
        let names = match self.dim_names {
            Some(names) if names.len() != shape.len() => {
                return Err(EncodeError::InvalidTensor(format!(
                    "{} dimension names for a rank {} tensor",
                    names.len(),
                    shape.len()
                )));
            }
            Some(names) => names,
            None => vec![String::new(); shape.len()],
        };
        let dim = shape
            .iter()
            .zip(names)
            .map(|(&size, name)| TensorDim {
                size: size as i64,
                name,
            })
            .collect();

        let dtype = self.data.dtype();
        let (tensor_content, string_val) = match self.data {
            TensorData::F32(a) => (pack(&a, f32::to_le_bytes), Vec::new()),
            TensorData::F64(a) => (pack(&a, f64::to_le_bytes), Vec::new()),
            TensorData::I32(a) => (pack(&a, i32::to_le_bytes), Vec::new()),
            TensorData::I64(a) => (pack(&a, i64::to_le_bytes), Vec::new()),
            TensorData::U8(a) => (pack(&a, |v| [v]), Vec::new()),
            TensorData::Bool(a) => (pack(&a, |v| [u8::from(v)]), Vec::new()),
            TensorData::Str(a) => (Vec::new(), a.iter().map(|s| s.as_bytes().to_vec()).collect()),
        };

        Ok(TensorProto {
            dtype: dtype as i32,
            tensor_shape: Some(TensorShapeProto { dim }),
            tensor_content,
            string_val,
        })
    }
}

/// Pack elements little-endian in logical (row-major) order.
fn pack<T: Copy, const N: usize>(array: &ArrayD<T>, to_le: impl Fn(T) -> [u8; N]) -> Vec<u8> {
    let mut out = Vec::with_capacity(array.len() * N);
    for &v in array.iter() {
        out.extend_from_slice(&to_le(v));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, Array2};

    #[test]
    fn test_text_is_scalar_string() {
        let proto = TensorInput::text("hello").encode().unwrap();
        assert_eq!(proto.dtype, DataType::DtString as i32);
        assert!(proto.tensor_shape.unwrap().dim.is_empty());
        assert_eq!(proto.string_val, vec![b"hello".to_vec()]);
        assert!(proto.tensor_content.is_empty());
    }

    #[test]
    fn test_row_major_packing() {
        let a = arr2(&[[1i32, 2], [3, 4]]).into_dyn();
        let proto = TensorInput::new(a).encode().unwrap();
        let expected: Vec<u8> = [1i32, 2, 3, 4]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        assert_eq!(proto.tensor_content, expected);
        let dims: Vec<i64> = proto.tensor_shape.unwrap().dim.iter().map(|d| d.size).collect();
        assert_eq!(dims, vec![2, 2]);
    }

    #[test]
    fn test_transposed_view_packs_logically() {
        let a = arr2(&[[1u8, 2], [3, 4]]).reversed_axes().into_dyn();
        let proto = TensorInput::new(a).encode().unwrap();
        assert_eq!(proto.tensor_content, vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_dim_names() {
        let a = Array2::<f32>::zeros((2, 3)).into_dyn();
        let proto = TensorInput::new(a)
            .with_dim_names(["batch", "feature"])
            .encode()
            .unwrap();
        let names: Vec<String> = proto
            .tensor_shape
            .unwrap()
            .dim
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["batch", "feature"]);
    }

    #[test]
    fn test_dim_name_count_mismatch() {
        let a = Array2::<f64>::zeros((2, 3)).into_dyn();
        let err = TensorInput::new(a)
            .with_dim_names(["only_one"])
            .encode()
            .unwrap_err();
        assert!(matches!(err, EncodeError::InvalidTensor(_)));
    }
}
