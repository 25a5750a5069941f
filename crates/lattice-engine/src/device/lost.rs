use std::sync::{Arc, OnceLock};

/// Records that a device was lost. Cloning shares the same state.
///
/// Filled by wgpu's device-lost callback (see [`DeviceLostFlag::watch`]); the
/// first reason wins.
#[derive(Debug, Clone, Default)]
pub struct DeviceLostFlag {
    reason: Arc<OnceLock<String>>,
}

impl DeviceLostFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the device-lost callback on `device` and returns the flag it feeds.
    ///
    /// wgpu keeps a single callback per device; a later `watch` replaces this one.
    pub fn watch(device: &wgpu::Device) -> Self {
        let flag = Self::new();
        let sink = flag.clone();
        device.set_device_lost_callback(move |reason, message| {
            sink.mark(format!("{reason:?}: {message}"));
        });
        flag
    }

    /// Marks the device as lost. Ignored if already marked.
    pub fn mark(&self, reason: impl Into<String>) {
        let _ = self.reason.set(reason.into());
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.get().map(String::as_str)
    }

    #[inline]
    pub fn is_lost(&self) -> bool {
        self.reason.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_alive() {
        let flag = DeviceLostFlag::new();
        assert!(!flag.is_lost());
        assert_eq!(flag.reason(), None);
    }

    #[test]
    fn first_reason_wins_across_clones() {
        let flag = DeviceLostFlag::new();
        let other = flag.clone();
        other.mark("Destroyed: gone");
        flag.mark("Unknown: later");
        assert!(flag.is_lost());
        assert_eq!(flag.reason(), Some("Destroyed: gone"));
    }
}
