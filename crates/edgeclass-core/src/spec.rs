use crate::{DType, Error, Result, Shape};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IOName(pub String);

impl IOName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IOName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TensorSpec {
    pub name: IOName,
    pub dtype: DType,
    pub dims: Vec<Option<usize>>, // None = dynamic
}

/// Input geometry of an image network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Nchw {
    pub n: usize,
    pub c: usize,
    pub h: usize,
    pub w: usize,
}

impl TensorSpec {
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// The fully static shape of this slot. Dynamic or zero extents are refused.
    pub fn static_shape(&self) -> Result<Shape> {
        let mut dims = Vec::with_capacity(self.dims.len());
        for (axis, d) in self.dims.iter().enumerate() {
            match d {
                Some(d) if *d > 0 => dims.push(*d),
                Some(_) => {
                    return Err(Error::shape(&self.name.0, format!("axis {axis} has zero extent")))
                }
                None => return Err(Error::shape(&self.name.0, format!("axis {axis} is dynamic"))),
            }
        }
        Ok(Shape::from_slice(&dims))
    }

    pub fn nchw(&self) -> Result<Nchw> {
        let shape = self.static_shape()?;
        match *shape.dims() {
            [n, c, h, w] => Ok(Nchw { n, c, h, w }),
            _ => Err(Error::shape(
                &self.name.0,
                format!("expected a 4-d (n, c, h, w) input, found {shape}"),
            )),
        }
    }
}

/// Slots of a bound network: one image input, one score output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkSpec {
    pub input: TensorSpec,
    pub output: TensorSpec,
}

impl NetworkSpec {
    /// Builds the spec from every slot a backend reported.
    pub fn from_slots(
        device: &str,
        mut inputs: Vec<TensorSpec>,
        mut outputs: Vec<TensorSpec>,
    ) -> Result<Self> {
        if inputs.len() != 1 || outputs.len() != 1 {
            return Err(Error::DeviceBind {
                device: device.to_string(),
                reason: format!(
                    "expected exactly one input and one output, network has {} and {}",
                    inputs.len(),
                    outputs.len()
                ),
            });
        }
        Ok(Self {
            input: inputs.remove(0),
            output: outputs.remove(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(name: &str, dims: &[Option<usize>]) -> TensorSpec {
        TensorSpec {
            name: IOName(name.to_string()),
            dtype: DType::F32,
            dims: dims.to_vec(),
        }
    }

    #[test]
    fn nchw_from_static_dims() {
        let s = slot("data", &[Some(1), Some(3), Some(227), Some(227)]);
        assert_eq!(
            s.nchw().unwrap(),
            Nchw {
                n: 1,
                c: 3,
                h: 227,
                w: 227
            }
        );
    }

    #[test]
    fn dynamic_axis_is_refused() {
        let s = slot("data", &[None, Some(3), Some(224), Some(224)]);
        assert!(matches!(s.nchw(), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn non_image_input_is_refused() {
        let s = slot("tokens", &[Some(1), Some(128)]);
        assert!(matches!(s.nchw(), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn multi_output_networks_do_not_bind() {
        let err = NetworkSpec::from_slots(
            "CPU",
            vec![slot("data", &[Some(1)])],
            vec![slot("prob", &[Some(1)]), slot("aux", &[Some(1)])],
        )
        .unwrap_err();
        assert!(matches!(err, Error::DeviceBind { .. }));
    }
}
