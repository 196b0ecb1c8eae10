/// All error types that can occur when talking to LD382 controllers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A network socket operation failed.
    #[error("socket {action} error: {err:?}")]
    Socket { action: String, err: std::io::Error },

    /// Connecting to a controller failed (lookup, refusal, unreachable host).
    #[error("connection to {host}:{port} failed: {err:?}")]
    Connect {
        host: String,
        port: u16,
        err: std::io::Error,
    },

    /// A numeric argument to an operation is outside `0..=255`.
    #[error("{field} must be between 0 and 255, got {value}")]
    OutOfRange { field: &'static str, value: i64 },

    /// A numeric argument could not be parsed at all.
    #[error("invalid {field}: {input:?}")]
    InvalidNumber { field: &'static str, input: String },

    /// Failed to parse a [`crate::Color`] from a string.
    #[error("invalid color string {0:?}; expected r,g,b with each component 0-255")]
    InvalidColorString(String),

    /// No built-in program has the given name.
    #[error("unknown program {0:?}")]
    UnknownProgram(String),

    /// A discovery reply did not have the `ip,mac,model` shape.
    #[error("invalid discovery reply {0:?}")]
    InvalidReply(String),
}

impl Error {
    /// Create a new socket error
    pub fn socket(action: &str, err: std::io::Error) -> Self {
        Error::Socket {
            action: action.to_string(),
            err,
        }
    }

    /// Create a new connect error
    pub fn connect(host: &str, port: u16, err: std::io::Error) -> Self {
        Error::Connect {
            host: host.to_string(),
            port,
            err,
        }
    }

    /// Create a new out of range error
    pub fn out_of_range(field: &'static str, value: i64) -> Self {
        Error::OutOfRange { field, value }
    }

    /// Whether this error is a caller contract violation rather than an I/O
    /// failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::OutOfRange { .. }
                | Error::InvalidNumber { .. }
                | Error::InvalidColorString(_)
                | Error::UnknownProgram(_)
        )
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors() {
        assert!(Error::out_of_range("white level", 256).is_validation());
        assert!(Error::InvalidColorString("red".into()).is_validation());

        let refused = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        let err = Error::connect("10.0.0.5", 5577, refused);
        assert!(!err.is_validation());
        assert!(err.to_string().starts_with("connection to 10.0.0.5:5577 failed"));
    }

    #[test]
    fn test_out_of_range_message() {
        assert_eq!(
            Error::out_of_range("speed", -1).to_string(),
            "speed must be between 0 and 255, got -1"
        );
    }
}
