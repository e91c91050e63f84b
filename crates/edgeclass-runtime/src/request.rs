use std::time::Duration;

use edgeclass_core::{
    CompletionStatus, Error, ExecutableNetwork, IOName, PendingInference, Result, Tensor,
};
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestState {
    Submitted,
    Completed,
    Failed,
}

/// A single inference in flight on the device.
///
/// Moves from `Submitted` to `Completed` or `Failed` exactly once. A timed
/// out wait leaves it `Submitted`.
pub struct InferenceRequest<P> {
    pending: P,
    input: IOName,
    state: RequestState,
    status: Option<CompletionStatus>,
}

/// Checks `tensor` against the network's input slot and starts the request.
/// Returns as soon as the device has accepted the work.
pub fn submit<N: ExecutableNetwork>(
    network: &mut N,
    input: &IOName,
    tensor: Tensor,
) -> Result<InferenceRequest<N::Pending>> {
    let slot = &network.spec().input;
    if &slot.name != input {
        return Err(Error::shape(
            input.as_str(),
            format!("network has no input slot named `{input}` (expected `{}`)", slot.name),
        ));
    }
    let expected = slot.static_shape()?;
    if tensor.shape() != &expected {
        return Err(Error::shape(
            input.as_str(),
            format!("tensor is {}, slot declares {expected}", tensor.shape()),
        ));
    }
    if tensor.dtype() != slot.dtype {
        warn!(
            slot = %input,
            tensor = ?tensor.dtype(),
            declared = ?slot.dtype,
            "input dtype differs from the slot"
        );
    }

    let pending = network.submit(input, tensor)?;
    debug!(slot = %input, "inference submitted");
    Ok(InferenceRequest {
        pending,
        input: input.clone(),
        state: RequestState::Submitted,
        status: None,
    })
}

impl<P: PendingInference> InferenceRequest<P> {
    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn input(&self) -> &IOName {
        &self.input
    }

    /// Blocks until the device finishes. Once finished, later calls return
    /// the same status without touching the device.
    pub fn wait(&mut self, timeout: Option<Duration>) -> CompletionStatus {
        if let Some(status) = &self.status {
            return status.clone();
        }
        let status = self.pending.wait(timeout);
        match &status {
            CompletionStatus::Succeeded => self.state = RequestState::Completed,
            CompletionStatus::Failed { reason } => {
                warn!(%reason, "inference request failed");
                self.state = RequestState::Failed;
            }
            CompletionStatus::TimedOut => {
                warn!(?timeout, "inference request timed out");
                return status;
            }
        }
        self.status = Some(status.clone());
        status
    }

    /// Reads an output slot. Only valid after a successful [`wait`](Self::wait).
    pub fn output(&mut self, name: &IOName) -> Result<Tensor> {
        if self.state != RequestState::Completed {
            return Err(Error::ResultNotReady(name.0.clone()));
        }
        self.pending.output(name)
    }
}
