//! Error types for transform assembly and WCS header handling.
//!
//! Per-point failures (a direction outside a projection's domain, a
//! pixel off the map) are not errors; they surface as NaN "no data"
//! coordinates. Errors here are structural: a chain that cannot be
//! built or inverted, or a header that cannot be understood.

use thiserror::Error;

pub type WcsResult<T> = Result<T, WcsError>;

#[derive(Debug, Error)]
pub enum WcsError {
    #[error("transform is not invertible: {message}")]
    NotInvertible { message: String },

    #[error("incompatible dimensions: chain produces {expected}, next transform consumes {actual}")]
    IncompatibleDimensions { expected: usize, actual: usize },

    #[error("unsupported projection: {name}")]
    UnsupportedProjection { name: String },

    #[error("unknown coordinate system: {name}")]
    UnknownCoordinateSystem { name: String },

    #[error("missing required keyword: {keyword}")]
    MissingKeyword { keyword: String },

    #[error("invalid value for keyword {keyword}: {message}")]
    InvalidKeyword { keyword: String, message: String },

    #[error("invalid geometry: {message}")]
    InvalidGeometry { message: String },

    #[error("iteration failed to converge: {message}")]
    ConvergenceFailure { message: String },
}

impl WcsError {
    pub fn not_invertible(message: impl Into<String>) -> Self {
        Self::NotInvertible {
            message: message.into(),
        }
    }

    pub fn incompatible_dimensions(expected: usize, actual: usize) -> Self {
        Self::IncompatibleDimensions { expected, actual }
    }

    pub fn unsupported_projection(name: impl Into<String>) -> Self {
        Self::UnsupportedProjection { name: name.into() }
    }

    pub fn unknown_coordinate_system(name: impl Into<String>) -> Self {
        Self::UnknownCoordinateSystem { name: name.into() }
    }

    pub fn missing_keyword(keyword: impl Into<String>) -> Self {
        Self::MissingKeyword {
            keyword: keyword.into(),
        }
    }

    pub fn invalid_keyword(keyword: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidKeyword {
            keyword: keyword.into(),
            message: message.into(),
        }
    }

    pub fn invalid_geometry(message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            message: message.into(),
        }
    }

    pub fn convergence_failure(message: impl Into<String>) -> Self {
        Self::ConvergenceFailure {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let e = WcsError::missing_keyword("CRVAL1");
        assert_eq!(e.to_string(), "missing required keyword: CRVAL1");

        let e = WcsError::incompatible_dimensions(2, 3);
        assert!(e.to_string().contains("produces 2"));
        assert!(e.to_string().contains("consumes 3"));
    }
}
