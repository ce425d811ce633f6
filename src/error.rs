//! Error types surfaced by the flow core.
//!
//! Only background construction and configuration loading can fail. Per-tick
//! effect and gate logic is infallible and never produces these.

use std::path::PathBuf;

use thiserror::Error;

use crate::flow::Phase;

pub type Result<T> = std::result::Result<T, FlowError>;

/// Failure reported by the asset import collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("asset not found: {path}")]
    NotFound { path: String },

    #[error("failed to import {path}: {reason}")]
    Invalid { path: String, reason: String },
}

#[derive(Debug, Error)]
pub enum FlowError {
    /// Background construction of the next context failed; the transition into
    /// `phase` is abandoned and the active context keeps rendering.
    #[error("construction of {phase:?} context failed")]
    Construction {
        phase: Phase,
        #[source]
        source: Box<FlowError>,
    },

    #[error(transparent)]
    AssetImport(#[from] ImportError),

    #[error("imported environment has no anchor named {name:?}")]
    MissingAnchor { name: String },

    #[error("model {model} contains no meshes")]
    MissingMesh { model: String },

    #[error("failed to read settings from {path}")]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings from {path}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl FlowError {
    /// Wrap a lower-level failure as a construction failure for `phase`
    pub fn construction(phase: Phase, source: FlowError) -> Self {
        FlowError::Construction {
            phase,
            source: Box::new(source),
        }
    }
}
