// src/error.rs
//! Error handling for the whole crate.
//!
//! Only startup failures are fatal (no window, no surface, no adapter). Asset
//! failures are logged by the loader and never reach the caller as an `Err`.

use std::fmt;
use thiserror::Error;

/// Main error type, Send + Sync + 'static.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// I/O errors (asset files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding failures.
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),

    /// The window system refused to give us an event loop.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// The window itself could not be created.
    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    /// No drawing surface for the window (capability unavailable).
    #[error("surface creation failed: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    /// The adapter refused our device request.
    #[error("device request failed: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    /// Simple custom message.
    #[error("{0}")]
    Custom(String),

    /// Context chaining.
    #[error("{message}: {source}")]
    WithContext {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a custom error message.
    #[inline]
    pub fn custom<S: Into<String>>(msg: S) -> Self {
        Self::Custom(msg.into())
    }

    /// Create a formatted custom error (like `format!` but returns `Error`).
    #[inline]
    pub fn format(args: fmt::Arguments) -> Self {
        Self::Custom(fmt::format(args))
    }

    /// Wrap this error with a context message.
    #[inline]
    pub fn context<C: Into<String>>(self, context: C) -> Self {
        Self::WithContext {
            message: context.into(),
            source: Box::new(self),
        }
    }

    /// Quick static message.
    #[inline]
    pub fn msg(msg: &'static str) -> Self {
        Self::Custom(msg.into())
    }

}

/// Convenient `Result` alias, use `crate::Result<T>` everywhere.
pub type Result<T> = std::result::Result<T, Error>;
