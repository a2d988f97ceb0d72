//! Error types shared by the viewer.
//!
//! Everything in [`ViewerError`] is fatal at startup except [`ViewerError::Decode`],
//! which texture loading downgrades to a logged warning and a placeholder.

use std::path::PathBuf;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, ViewerError>;

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("failed to create window: {0}")]
    WindowCreation(#[from] winit::error::OsError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("no suitable GPU adapter: {0}")]
    AdapterRequest(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("shader '{label}' failed to build: {message}")]
    ShaderBuild { label: String, message: String },

    #[error("resource creation failed: {0}")]
    ResourceCreation(String),

    #[error("failed to decode '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("GPU validation error during frame: {0}")]
    GpuValidation(String),
}

impl ViewerError {
    pub(crate) fn resource(message: impl Into<String>) -> Self {
        Self::ResourceCreation(message.into())
    }

    /// Returns true for the one error class that is not fatal.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_errors_carry_their_message() {
        let err = ViewerError::resource("shadow map 99999x99999 exceeds 8192");
        assert!(err.to_string().contains("99999x99999"));
        assert!(!err.is_decode());
    }

    #[test]
    fn shader_errors_name_the_shader() {
        let err = ViewerError::ShaderBuild {
            label: "Lighting Shader".into(),
            message: "unknown identifier".into(),
        };
        assert_eq!(
            err.to_string(),
            "shader 'Lighting Shader' failed to build: unknown identifier"
        );
    }
}
