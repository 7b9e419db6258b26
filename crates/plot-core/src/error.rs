// File: crates/plot-core/src/error.rs
// Summary: Error taxonomy for configuration and host failures. Numeric degeneracy is never an error.

use thiserror::Error;

use crate::scale::ScaleKind;
use crate::solver::SolverError;

#[derive(Debug, Error)]
pub enum PlotError {
    /// Categorical ranges need categorical scales and numeric ranges need linear/log ones.
    #[error("{axis} range '{name}' ({range_kind}) is incompatible with a {scale:?} scale")]
    IncompatibleScale {
        axis: &'static str,
        name: String,
        range_kind: &'static str,
        scale: ScaleKind,
    },
    #[error("no {axis} range named '{name}'")]
    UnknownRange { axis: &'static str, name: String },
    #[error("failed to create {0} surface")]
    Surface(&'static str),
    #[error("gpu context is already leased")]
    GpuBusy,
    #[error("export failed: {0}")]
    Export(String),
    #[error("layout solver: {0}")]
    Layout(#[from] SolverError),
}

pub type Result<T> = std::result::Result<T, PlotError>;
