use std::time::Instant;

use edgeclass_core::{load_network, Backend, CompletionStatus, Error, ExecutableNetwork, Result};
use tracing::{debug, info};

use crate::{load_image, prepare, submit, top_k, DeviceGuard, PipelineConfig, Prediction};

/// Runs one image through the network described by `config` and returns its
/// best `config.top_k` classes.
///
/// Stages run in order: acquire the device, load and bind the network,
/// prepare the input, submit, wait, rank. The network is dropped before the
/// device, and the device is released on every return path.
pub fn run<B: Backend>(backend: &B, config: &PipelineConfig) -> Result<Vec<Prediction>> {
    info!(backend = backend.name(), device = %config.device, "acquiring device");
    let mut device = DeviceGuard::new(backend.acquire(&config.device)?);

    let descriptor = load_network(&config.artifact)?;
    let mut network = backend.bind(descriptor, device.get_mut()?)?;
    let spec = network.spec().clone();
    info!(
        input = %spec.input.name,
        output = %spec.output.name,
        dims = ?spec.input.dims,
        "network bound"
    );

    let image = load_image(&config.image)?;
    let tensor = prepare(&image, &spec.input, config.channel_order)?;

    let started = Instant::now();
    let mut request = submit(&mut network, &spec.input.name, tensor)?;
    match request.wait(config.wait_timeout) {
        CompletionStatus::Succeeded => {}
        CompletionStatus::Failed { reason } => return Err(Error::InferenceFailure(reason)),
        CompletionStatus::TimedOut => {
            return Err(Error::inference(format!(
                "no result within {:?}",
                config.wait_timeout.unwrap_or_default()
            )))
        }
    }
    debug!(elapsed_us = started.elapsed().as_micros() as u64, "inference completed");

    let output = request.output(&spec.output.name)?;
    let row = output.first_row()?;
    let predictions = top_k(&row, config.top_k);

    drop(request);
    drop(network);
    device.release();
    Ok(predictions)
}
