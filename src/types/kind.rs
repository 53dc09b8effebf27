use serde::Serialize;

/// Coarse classification every crate error reduces to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    IoFailure,
    Unexpected,
}

/// How a transport layer should answer for a given [`ErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseClass {
    /// 4xx, malformed or missing input.
    ClientError,
    /// 404.
    NotFound,
    /// 5xx, details withheld from the caller.
    ServerError,
}

impl ErrorKind {
    pub fn response_class(self) -> ResponseClass {
        match self {
            ErrorKind::InvalidInput => ResponseClass::ClientError,
            ErrorKind::NotFound => ResponseClass::NotFound,
            ErrorKind::IoFailure | ErrorKind::Unexpected => ResponseClass::ServerError,
        }
    }

    /// Classify a raw I/O error.
    pub fn from_io(err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            std::io::ErrorKind::InvalidInput => ErrorKind::InvalidInput,
            _ => ErrorKind::IoFailure,
        }
    }
}

impl ResponseClass {
    pub fn status_code(self) -> u16 {
        match self {
            ResponseClass::ClientError => 400,
            ResponseClass::NotFound => 404,
            ResponseClass::ServerError => 500,
        }
    }
}
