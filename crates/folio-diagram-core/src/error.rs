pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid viewer options: {message}")]
    InvalidOptions { message: String },
}
