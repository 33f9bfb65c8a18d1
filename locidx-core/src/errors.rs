use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegionError {
    #[error("Invalid interval: start ({start}) is greater than end ({end})")]
    InvalidInterval { start: u32, end: u32 },

    #[error("Coordinate out of range: {0}")]
    CoordinateOutOfRange(String),

    #[error("Error parsing region: {0}")]
    RegionParseError(String),
}
