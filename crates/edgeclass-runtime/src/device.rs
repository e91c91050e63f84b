use edgeclass_core::{DeviceHandle, Error, Result};
use tracing::info;

/// Owns an acquired device and releases it exactly once, on
/// [`DeviceGuard::release`] or on drop, whichever comes first.
pub struct DeviceGuard<D: DeviceHandle> {
    device: Option<D>,
    name: String,
}

impl<D: DeviceHandle> DeviceGuard<D> {
    pub fn new(device: D) -> Self {
        let name = device.name().to_string();
        Self {
            device: Some(device),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_released(&self) -> bool {
        self.device.is_none()
    }

    pub fn get_mut(&mut self) -> Result<&mut D> {
        self.device.as_mut().ok_or_else(|| Error::DeviceUnavailable {
            device: self.name.clone(),
            reason: "device was already released".to_string(),
        })
    }

    /// Releases the device. Later calls do nothing.
    pub fn release(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.release();
            info!(device = %self.name, "device released");
        }
    }
}

impl<D: DeviceHandle> Drop for DeviceGuard<D> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    struct Counted(Rc<Cell<u32>>);

    impl DeviceHandle for Counted {
        fn name(&self) -> &str {
            "TEST"
        }
        fn release(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn release_is_idempotent() {
        let count = Rc::new(Cell::new(0));
        let mut guard = DeviceGuard::new(Counted(count.clone()));
        guard.release();
        guard.release();
        assert!(guard.is_released());
        drop(guard);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn drop_releases() {
        let count = Rc::new(Cell::new(0));
        {
            let _guard = DeviceGuard::new(Counted(count.clone()));
        }
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn released_device_cannot_be_borrowed() {
        let mut guard = DeviceGuard::new(Counted(Rc::new(Cell::new(0))));
        guard.release();
        assert!(matches!(
            guard.get_mut(),
            Err(Error::DeviceUnavailable { .. })
        ));
    }
}
