use thiserror::Error;

/// The one error type crossing this crate's API boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathfinderError {
    #[error("y coordinate {y} is out of the [0,128) vertical bound")]
    OutOfBounds { y: i32 },
    #[error("chunk generation failed: {0}")]
    Generation(String),
    #[error("host-supplied chunk data has {actual} cells, expected {expected}")]
    MalformedInput { expected: usize, actual: usize },
    #[error("neighbor chunk {cx},{cz} was queried before being prefetched; this is a driver bug")]
    MissingNeighborChunk { cx: i32, cz: i32 },
}
