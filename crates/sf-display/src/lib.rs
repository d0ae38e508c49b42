#![forbid(unsafe_code)]

//! Plain-text and markdown rendering of series and frames, driven by an
//! explicit [`DisplayConfig`].

mod config;
mod render;

use sf_frame::FrameError;
use thiserror::Error;

pub use config::{DisplayConfig, DisplayFormat};
pub use render::{render_frame, render_series};

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Frame(#[from] FrameError),
}
