pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Projection failed: {message}")]
	Projection { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<rolodex_store::Error> for Error {
	fn from(err: rolodex_store::Error) -> Self {
		match err {
			rolodex_store::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			rolodex_store::Error::NotFound(message) => Self::NotFound { message },
			rolodex_store::Error::Conflict(message) => Self::Conflict { message },
			rolodex_store::Error::Projection(inner) =>
				Self::Projection { message: inner.to_string() },
			rolodex_store::Error::Storage(message) => Self::Storage { message },
		}
	}
}
