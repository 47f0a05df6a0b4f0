use crate::model::FlagId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlagAtlasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid atlas dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid flag id {0:?}: expected eight hex digits")]
    InvalidFlagId(String),
    #[error("Flag {0} appears more than once")]
    DuplicateFlag(FlagId),
    #[error("Flag {0} has an empty image")]
    EmptyImage(FlagId),
    #[error("Atlas {width}x{height} is too small for {n_cells} cells")]
    CellTooSmall {
        width: u32,
        height: u32,
        n_cells: usize,
    },
    #[error("Render error: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, FlagAtlasError>;
