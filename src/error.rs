use crate::engine::ImpactError;

/// Application-level error: a message plus the process exit code it maps
/// to (2 = usage/input, 3 = data, 4 = network/internal).
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Bad CLI usage or invalid user-supplied input.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// Unusable input/reference data.
    pub fn data(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    /// Network or internal failure.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<ImpactError> for AppError {
    fn from(err: ImpactError) -> Self {
        match err {
            ImpactError::UnknownZone { .. } | ImpactError::InvalidParameter { .. } => {
                Self::usage(err.to_string())
            }
            ImpactError::Registry { .. } => Self::data(err.to_string()),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_exit_codes() {
        let err: AppError = ImpactError::UnknownZone {
            zone: "ZZZ".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("ZZZ"));

        let err: AppError = ImpactError::Registry {
            detail: "bad json".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), 3);
    }
}
