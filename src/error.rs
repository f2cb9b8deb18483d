use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("uninitialized value: {0}")]
    Uninitialized(String),

    #[error("unknown axis id: {0}")]
    UnknownAxis(usize),

    #[error("unknown trace id: {0}")]
    UnknownTrace(usize),
}
