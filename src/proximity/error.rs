use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProximityError {
    #[error("Invalid argument '{name}': {value} ({reason})")]
    InvalidArgument {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

impl ProximityError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        ProximityError::InvalidArgument {
            name,
            value,
            reason,
        }
    }
}
