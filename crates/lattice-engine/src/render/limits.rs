use crate::error::{RenderError, Result};

/// Rejects a buffer allocation the device would refuse.
pub(crate) fn check_buffer(limits: &wgpu::Limits, stage: &'static str, what: &str, size: u64) -> Result<()> {
    if size == 0 {
        return Err(RenderError::resource(stage, format!("{what}: zero-sized buffer")));
    }
    if size > limits.max_buffer_size {
        return Err(RenderError::resource(
            stage,
            format!("{what}: {size} bytes exceeds max_buffer_size ({})", limits.max_buffer_size),
        ));
    }
    Ok(())
}

/// Like [`check_buffer`], additionally bounded by the storage binding limit.
pub(crate) fn check_storage_binding(limits: &wgpu::Limits, stage: &'static str, what: &str, size: u64) -> Result<()> {
    check_buffer(limits, stage, what, size)?;
    let max = u64::from(limits.max_storage_buffer_binding_size);
    if size > max {
        return Err(RenderError::resource(
            stage,
            format!("{what}: {size} bytes exceeds max_storage_buffer_binding_size ({max})"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_rejected() {
        assert!(check_buffer(&wgpu::Limits::default(), "test", "buf", 0).is_err());
    }

    #[test]
    fn storage_limit_enforced() {
        let limits = wgpu::Limits { max_storage_buffer_binding_size: 1024, ..wgpu::Limits::default() };
        check_storage_binding(&limits, "test", "instances", 1024).unwrap();
        let err = check_storage_binding(&limits, "test", "instances", 1152).unwrap_err();
        assert!(err.to_string().contains("max_storage_buffer_binding_size"));
    }
}
