pub type TrellisResult<T> = std::result::Result<T, TrellisError>;

/// Errors surfaced by template construction.
///
/// Most failure modes are deliberately silent: a missing source file parses
/// to an empty template, an unlocatable section falls back to the whole
/// file, a malformed inline argument list is dropped, and an unknown data
/// key substitutes as an empty string. Only loader failures that are not
/// plain "file absent" become errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TrellisError {
    /// The loader failed for a reason other than the source being absent.
    #[error("failed to load template '{path}'")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl TrellisError {
    /// Convenience for loaders that are not backed by `std::io`.
    pub fn load<P: Into<String>, M: std::fmt::Display>(path: P, message: M) -> Self {
        Self::Load {
            path: path.into(),
            source: std::io::Error::other(message.to_string()),
        }
    }
}
