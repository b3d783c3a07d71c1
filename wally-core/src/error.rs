use std::error::Error as StdError;

use thiserror::Error;

/// Failures raised by the synthesis and scanning pipeline.
///
/// Every variant is fatal to the operation that produced it: a failing scene aborts its own
/// synthesis or scan, and nothing is clamped or retried behind the caller's back.
#[derive(Debug, Error)]
pub enum WallyError {
    /// Tile, window, range or rectangle parameters that cannot describe a valid layout.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// The scaled cutout does not fit inside the background tile.
    #[error(
        "scaled cutout {}x{} does not fit background {}x{}",
        .asset.0, .asset.1, .background.0, .background.1
    )]
    OversizeAsset {
        asset: (u32, u32),
        background: (u32, u32),
    },
    /// No scenes or no cutouts were supplied.
    #[error("no {0} supplied")]
    EmptySource(&'static str),
    /// Opaque failure from the scoring function.
    #[error("classifier failed")]
    Classifier(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

impl WallyError {
    pub(crate) fn geometry(message: impl Into<String>) -> Self {
        Self::InvalidGeometry(message.into())
    }

    pub(crate) fn classifier(err: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self::Classifier(err.into())
    }
}

/// Result alias for core pipeline operations.
pub type Result<T, E = WallyError> = std::result::Result<T, E>;
