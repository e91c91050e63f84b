use std::time::Duration;

use edgeclass_core::{
    Backend, CompletionStatus, DType, DeviceHandle, Error, ExecutableNetwork, IOName, Layout,
    NetworkDescriptor, NetworkSpec, PendingInference, Result, Shape, Tensor, TensorSpec,
};
use openvino::{
    CompiledModel, Core, DeviceType, ElementType, InferRequest, InferenceError, Shape as OvShape,
    Tensor as OvTensor,
};
use tracing::{debug, info};

/// Wait budget handed to the engine when the caller sets no timeout.
const WAIT_FOREVER_MS: i64 = i32::MAX as i64;

pub struct OpenvinoBackend;

impl OpenvinoBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OpenvinoBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// A device opened through its own OpenVINO core.
pub struct OpenvinoDevice {
    name: String,
    core: Option<Core>,
}

pub struct OpenvinoNetwork {
    spec: NetworkSpec,
    compiled: CompiledModel,
}

pub struct OpenvinoRequest {
    request: InferRequest,
}

impl Backend for OpenvinoBackend {
    type Device = OpenvinoDevice;
    type Network = OpenvinoNetwork;

    fn name(&self) -> &'static str {
        "openvino"
    }

    fn acquire(&self, device_name: &str) -> Result<Self::Device> {
        let unavailable = |reason: String| Error::DeviceUnavailable {
            device: device_name.to_string(),
            reason,
        };

        let core = Core::new().map_err(|e| unavailable(e.to_string()))?;
        let available = core
            .available_devices()
            .map_err(|e| unavailable(e.to_string()))?
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>();
        debug!(?available, "openvino devices");

        // MYRIAD.1.2-ma2480 and friends enumerate with a suffix.
        let found = available
            .iter()
            .any(|d| d == device_name || d.starts_with(&format!("{device_name}.")));
        if !found {
            return Err(unavailable(format!(
                "not among the available devices: {}",
                available.join(", ")
            )));
        }

        info!(device = device_name, "device acquired");
        Ok(OpenvinoDevice {
            name: device_name.to_string(),
            core: Some(core),
        })
    }

    fn bind(
        &self,
        descriptor: NetworkDescriptor,
        device: &mut Self::Device,
    ) -> Result<Self::Network> {
        let device_name = device.name.clone();
        let bind_err = |reason: String| Error::DeviceBind {
            device: device_name.clone(),
            reason,
        };
        let parse_err = |reason: String| Error::ModelParse {
            path: descriptor.artifact.topology.clone(),
            reason,
        };

        let core = device.core.as_mut().ok_or_else(|| Error::DeviceUnavailable {
            device: device_name.clone(),
            reason: "device was already released".to_string(),
        })?;

        let weights = weights_tensor(&descriptor.weights).map_err(parse_err)?;
        let model = core
            .read_model_from_buffer(&descriptor.topology, Some(&weights))
            .map_err(|e| parse_err(e.to_string()))?;
        let mut compiled = core
            .compile_model(&model, device_type(&device_name))
            .map_err(|e| bind_err(e.to_string()))?;

        let inputs = (0..model.get_inputs_len().map_err(|e| bind_err(e.to_string()))?)
            .map(|i| {
                model
                    .get_input_by_index(i)
                    .and_then(|node| node.get_name())
                    .map_err(|e| bind_err(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        let outputs = (0..model.get_outputs_len().map_err(|e| bind_err(e.to_string()))?)
            .map(|i| {
                model
                    .get_output_by_index(i)
                    .and_then(|node| node.get_name())
                    .map_err(|e| bind_err(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        // Slot shapes are read from the tensors a fresh request pre-allocates.
        let slots = compiled
            .create_infer_request()
            .map_err(|e| bind_err(e.to_string()))?;
        let inputs = inputs
            .iter()
            .map(|name| slot_spec(&slots, name).map_err(bind_err))
            .collect::<Result<Vec<_>>>()?;
        let outputs = outputs
            .iter()
            .map(|name| slot_spec(&slots, name).map_err(bind_err))
            .collect::<Result<Vec<_>>>()?;
        let spec = NetworkSpec::from_slots(&device_name, inputs, outputs)?;

        info!(
            device = %device_name,
            topology = %descriptor.artifact.topology.display(),
            "network compiled"
        );
        Ok(OpenvinoNetwork { spec, compiled })
    }
}

impl DeviceHandle for OpenvinoDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn release(&mut self) {
        self.core.take();
    }
}

impl ExecutableNetwork for OpenvinoNetwork {
    type Pending = OpenvinoRequest;

    fn spec(&self) -> &NetworkSpec {
        &self.spec
    }

    fn submit(&mut self, input: &IOName, tensor: Tensor) -> Result<Self::Pending> {
        let mut request = self
            .compiled
            .create_infer_request()
            .map_err(Error::inference)?;
        let value = tensor_to_ov(&tensor)?;
        request
            .set_tensor(input.as_str(), &value)
            .map_err(Error::inference)?;
        request.infer_async().map_err(Error::inference)?;
        Ok(OpenvinoRequest { request })
    }
}

impl PendingInference for OpenvinoRequest {
    fn wait(&mut self, timeout: Option<Duration>) -> CompletionStatus {
        let budget = timeout
            .map(|t| i64::try_from(t.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(WAIT_FOREVER_MS);
        loop {
            if let Some(status) = wait_outcome(self.request.wait(budget), timeout.is_some()) {
                return status;
            }
        }
    }

    fn output(&mut self, name: &IOName) -> Result<Tensor> {
        let value = self
            .request
            .get_tensor(name.as_str())
            .map_err(Error::inference)?;
        ov_to_tensor(&value)
    }
}

/// Maps one bounded engine wait to a final status. `None` means the wait
/// budget ran out on an unbounded wait and the caller should wait again.
fn wait_outcome(
    result: std::result::Result<(), InferenceError>,
    bounded: bool,
) -> Option<CompletionStatus> {
    match result {
        Ok(()) => Some(CompletionStatus::Succeeded),
        Err(InferenceError::ResultNotReady) if bounded => Some(CompletionStatus::TimedOut),
        Err(InferenceError::ResultNotReady) => None,
        Err(e) => Some(CompletionStatus::Failed {
            reason: e.to_string(),
        }),
    }
}

fn device_type(name: &str) -> DeviceType<'static> {
    DeviceType::from(name).to_owned()
}

fn weights_tensor(weights: &[u8]) -> std::result::Result<OvTensor, String> {
    let shape = OvShape::new(&[1, weights.len() as i64]).map_err(|e| e.to_string())?;
    let mut tensor = OvTensor::new(ElementType::U8, &shape).map_err(|e| e.to_string())?;
    tensor
        .get_raw_data_mut()
        .map_err(|e| e.to_string())?
        .copy_from_slice(weights);
    Ok(tensor)
}

fn slot_spec(request: &InferRequest, name: &str) -> std::result::Result<TensorSpec, String> {
    let tensor = request.get_tensor(name).map_err(|e| e.to_string())?;
    let element = tensor.get_element_type().map_err(|e| e.to_string())?;
    let dtype = ov_element_to_dtype(element).map_err(|e| format!("slot `{name}`: {e}"))?;
    let dims = tensor
        .get_shape()
        .map_err(|e| e.to_string())?
        .get_dimensions()
        .iter()
        .map(|d| if *d < 0 { None } else { Some(*d as usize) })
        .collect();
    Ok(TensorSpec {
        name: IOName(name.to_string()),
        dtype,
        dims,
    })
}

fn ov_element_to_dtype(ty: ElementType) -> Result<DType> {
    match ty {
        ElementType::F32 => Ok(DType::F32),
        ElementType::F16 => Ok(DType::F16),
        ElementType::I64 => Ok(DType::I64),
        ElementType::I32 => Ok(DType::I32),
        ElementType::U8 => Ok(DType::U8),
        other => Err(Error::inference(format!(
            "unsupported tensor element type: {other:?}"
        ))),
    }
}

fn dtype_to_ov_element(dtype: DType) -> ElementType {
    match dtype {
        DType::F32 => ElementType::F32,
        DType::F16 => ElementType::F16,
        DType::I64 => ElementType::I64,
        DType::I32 => ElementType::I32,
        DType::U8 => ElementType::U8,
    }
}

fn tensor_to_ov(tensor: &Tensor) -> Result<OvTensor> {
    let dims: Vec<i64> = tensor.shape().dims().iter().map(|d| *d as i64).collect();
    let shape = OvShape::new(&dims).map_err(Error::inference)?;
    let mut value =
        OvTensor::new(dtype_to_ov_element(tensor.dtype()), &shape).map_err(Error::inference)?;
    let buffer = value.get_raw_data_mut().map_err(Error::inference)?;
    if buffer.len() != tensor.byte_len() {
        return Err(Error::shape(
            "input",
            format!(
                "engine buffer holds {} bytes, tensor has {}",
                buffer.len(),
                tensor.byte_len()
            ),
        ));
    }
    buffer.copy_from_slice(&tensor.bytes);
    Ok(value)
}

fn ov_to_tensor(value: &OvTensor) -> Result<Tensor> {
    let dtype = ov_element_to_dtype(value.get_element_type().map_err(Error::inference)?)?;
    let dims: Vec<usize> = value
        .get_shape()
        .map_err(Error::inference)?
        .get_dimensions()
        .iter()
        .map(|d| *d as usize)
        .collect();
    let bytes = value.get_raw_data().map_err(Error::inference)?;
    Tensor::from_bytes(
        dtype,
        Shape::from_slice(&dims),
        Layout::Any,
        bytes::Bytes::copy_from_slice(bytes),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_device_names() {
        assert!(matches!(device_type("CPU"), DeviceType::CPU));
        assert!(matches!(device_type("GPU"), DeviceType::GPU));
        assert!(matches!(device_type("NPU"), DeviceType::NPU));
        assert!(matches!(device_type("MYRIAD"), DeviceType::Other(ref n) if n == "MYRIAD"));
    }

    #[test]
    fn element_types_round_trip() {
        for dtype in [DType::F32, DType::F16, DType::I64, DType::I32, DType::U8] {
            assert_eq!(ov_element_to_dtype(dtype_to_ov_element(dtype)).unwrap(), dtype);
        }
    }

    #[test]
    fn unbounded_wait_keeps_waiting_when_not_ready() {
        assert_eq!(wait_outcome(Err(InferenceError::ResultNotReady), false), None);
    }

    #[test]
    fn bounded_wait_times_out_when_not_ready() {
        assert_eq!(
            wait_outcome(Err(InferenceError::ResultNotReady), true),
            Some(CompletionStatus::TimedOut)
        );
    }

    #[test]
    fn completed_wait_succeeds() {
        assert_eq!(wait_outcome(Ok(()), false), Some(CompletionStatus::Succeeded));
        assert_eq!(wait_outcome(Ok(()), true), Some(CompletionStatus::Succeeded));
    }

    #[test]
    fn engine_errors_fail_the_request() {
        for bounded in [false, true] {
            assert!(matches!(
                wait_outcome(Err(InferenceError::GeneralError), bounded),
                Some(CompletionStatus::Failed { .. })
            ));
        }
    }
}
