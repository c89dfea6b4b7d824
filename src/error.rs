// SPDX: CC0-1.0

use crate::{parse::ParseErr, session::ExpressionId, view::ViewError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlotError>;

#[derive(Debug, Error)]
pub enum PlotError {
    /// Submitted expression text was blank.
    #[error("expression is empty")]
    EmptyExpression,

    #[error("no expression with id {0}")]
    UnknownExpression(ExpressionId),

    /// Every id the session can hand out has been used.
    #[error("no expression ids left, start a new session")]
    IdsExhausted,

    #[error("invalid view: {0}")]
    View(#[from] ViewError),

    /// Only produced by strict sessions.
    #[error("parse error: {0}")]
    Parse(#[from] ParseErr),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
