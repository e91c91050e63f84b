use std::time::Duration;

use crate::{IOName, NetworkDescriptor, NetworkSpec, Result, Tensor};

/// An inference engine able to open devices and bind networks to them.
pub trait Backend {
    type Device: DeviceHandle;
    type Network: ExecutableNetwork;

    fn name(&self) -> &'static str;

    /// Opens the accelerator called `device_name`.
    fn acquire(&self, device_name: &str) -> Result<Self::Device>;

    /// Compiles `descriptor` for `device`. The descriptor is consumed.
    fn bind(&self, descriptor: NetworkDescriptor, device: &mut Self::Device)
        -> Result<Self::Network>;
}

pub trait DeviceHandle {
    fn name(&self) -> &str;

    /// Gives the device back to the engine. Called at most once per handle.
    fn release(&mut self);
}

pub trait ExecutableNetwork {
    type Pending: PendingInference;

    fn spec(&self) -> &NetworkSpec;

    /// Starts one inference on the device and returns without blocking.
    fn submit(&mut self, input: &IOName, tensor: Tensor) -> Result<Self::Pending>;
}

/// How an in-flight request ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompletionStatus {
    Succeeded,
    Failed { reason: String },
    TimedOut,
}

/// The engine's side of one in-flight request.
pub trait PendingInference {
    /// Blocks until the request completes. `None` waits without limit.
    fn wait(&mut self, timeout: Option<Duration>) -> CompletionStatus;

    /// Reads a completed output slot.
    fn output(&mut self, name: &IOName) -> Result<Tensor>;
}
