pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
	#[error("Embedding at index {index} has {actual} dimensions; expected {expected}.")]
	DimensionMismatch { index: usize, expected: usize, actual: usize },
	#[error("Invalid clustering parameter: {message}")]
	InvalidParameter { message: String },
}
