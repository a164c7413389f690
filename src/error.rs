/// Errors returned by the transforms, the surrogate and the optimization loop.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when spherical coordinates fall outside their valid ranges
    /// (negative radius, interior angle outside `[0, π]`, final angle
    /// outside `[0, 2π]`).
    #[error("domain error: {0}")]
    Domain(String),

    /// Returned when a NaN or infinity shows up in a transform, a surrogate
    /// prediction, or an acquisition gradient.
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Returned when the inference engine cannot produce parameter samples.
    #[error("fit error: {0}")]
    Fit(String),

    /// Returned when the objective function fails or yields a non-finite value.
    #[error("objective error: {0}")]
    Objective(String),

    /// Returned when a point has the wrong number of coordinates.
    #[error("dimension mismatch: expected {expected} coordinates but got {got}")]
    DimensionMismatch {
        /// The expected number of coordinates.
        expected: usize,
        /// The actual number of coordinates.
        got: usize,
    },

    /// Returned when an axis order is not a permutation of `0..d`.
    #[error("invalid axis order: {0:?} is not a permutation")]
    InvalidAxisOrder(Vec<usize>),

    /// Returned when a search or cube radius is not positive and finite.
    #[error("invalid radius: {0} must be positive and finite")]
    InvalidRadius(f64),

    /// Returned when a configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// Returned when an acquisition surface is built without parameter samples.
    #[error("acquisition requires at least one parameter sample")]
    EmptySamples,

    /// Returned when a model is bound to an empty dataset.
    #[error("no observations available")]
    NoObservations,
}

/// A convenience alias for `core::result::Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Re-labels any error raised while fitting the surrogate as [`Error::Fit`].
    pub(crate) fn into_fit(self) -> Self {
        match self {
            Error::Fit(msg) => Error::Fit(msg),
            other => Error::Fit(other.to_string()),
        }
    }
}
