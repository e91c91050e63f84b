use bytes::{BufMut, Bytes, BytesMut};
use half::f16;
use smallvec::SmallVec;

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DType {
    F32,
    F16,
    I64,
    I32,
    U8,
}

impl DType {
    pub fn byte_size(self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F16 => 2,
            DType::I64 => 8,
            DType::I32 => 4,
            DType::U8 => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Planar image: batch, channel, height, width.
    Nchw,
    /// Anything that is not an image (score rows, flat vectors).
    Any,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shape(pub SmallVec<[usize; 6]>);

impl Shape {
    pub fn from_slice(d: &[usize]) -> Self {
        Self(d.iter().copied().collect())
    }
    pub fn dims(&self) -> &[usize] {
        &self.0
    }
    pub fn rank(&self) -> usize {
        self.0.len()
    }
    /// Element count. A rank-0 shape is a scalar; any zero extent makes it empty.
    pub fn numel(&self) -> usize {
        if self.0.is_empty() {
            return 1;
        }
        self.0.iter().product()
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, ")")
    }
}

#[derive(Clone, Debug)]
pub struct TensorDesc {
    pub dtype: DType,
    pub shape: Shape,
    pub layout: Layout,
}

/// A host-side tensor. Elements are stored little-endian.
#[derive(Clone, Debug)]
pub struct Tensor {
    pub desc: TensorDesc,
    pub bytes: Bytes,
}

impl Tensor {
    pub fn from_bytes(dtype: DType, shape: Shape, layout: Layout, bytes: Bytes) -> Result<Self> {
        let expected = shape.numel() * dtype.byte_size();
        if bytes.len() != expected {
            return Err(Error::shape(
                "tensor",
                format!(
                    "{} bytes do not fill shape {shape} of {dtype:?} ({expected} bytes)",
                    bytes.len()
                ),
            ));
        }
        Ok(Self {
            desc: TensorDesc {
                dtype,
                shape,
                layout,
            },
            bytes,
        })
    }

    pub fn from_f32(shape: Shape, layout: Layout, values: &[f32]) -> Result<Self> {
        let mut buf = BytesMut::with_capacity(values.len() * 4);
        for v in values {
            buf.put_f32_le(*v);
        }
        Self::from_bytes(DType::F32, shape, layout, buf.freeze())
    }

    pub fn shape(&self) -> &Shape {
        &self.desc.shape
    }

    pub fn dtype(&self) -> DType {
        self.desc.dtype
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Widens every element to `f32`.
    pub fn to_f32_vec(&self) -> Result<Vec<f32>> {
        let b = &self.bytes;
        let values = match self.desc.dtype {
            DType::F32 => b
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
            DType::I32 => b
                .chunks_exact(4)
                .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f32)
                .collect(),
            DType::I64 => b
                .chunks_exact(8)
                .map(|c| {
                    i64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32
                })
                .collect(),
            DType::U8 => b.iter().map(|v| f32::from(*v)).collect(),
            DType::F16 => b
                .chunks_exact(2)
                .map(|c| f16::from_le_bytes([c[0], c[1]]).to_f32())
                .collect(),
        };
        Ok(values)
    }

    /// Scores of the first batch row, treating dim 0 as the batch.
    pub fn first_row(&self) -> Result<Vec<f32>> {
        let batch = self.desc.shape.dims().first().copied().unwrap_or(1);
        if batch == 0 {
            return Err(Error::inference("output tensor has an empty batch"));
        }
        let mut values = self.to_f32_vec()?;
        values.truncate(values.len() / batch);
        Ok(values)
    }
}
