// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

use crate::backend::TextureFormat;

/// Errors that can occur while batching and drawing paths.
///
/// Running out of room in the mask atlas, the instance texture or the vertex buffer is not an
/// error: the renderers flush and carry on.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RenderError {
    /// The batch configuration was rejected.
    #[error("Invalid batch configuration: {0}")]
    InvalidConfig(&'static str),
    /// The render backend failed. The frame should be abandoned.
    #[error("Render backend failed")]
    Backend(#[from] BackendError),
    /// A single request does not fit even into an empty batch.
    #[error("{what} needs {required}, but a batch holds at most {capacity}")]
    OverBudget {
        /// What ran over.
        what: &'static str,
        /// The amount the request needs.
        required: usize,
        /// The amount an empty batch provides.
        capacity: usize,
    },
}

/// Errors reported by a [`RenderBackend`](crate::RenderBackend).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackendError {
    /// The device ran out of memory while creating or writing a resource.
    #[error("Out of device memory")]
    OutOfMemory,
    /// The backend can't create textures of this format or layout.
    #[error("Texture format {0:?} is not supported")]
    UnsupportedFormat(TextureFormat),
    /// The device was lost.
    #[error("Device lost")]
    DeviceLost,
    /// A handle that doesn't belong to this backend was used.
    #[error("Unknown or mismatched resource handle")]
    InvalidResource,
}

pub(crate) type Result<T, E = RenderError> = core::result::Result<T, E>;
