use std::fmt::{Display, Formatter};
use std::io;

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Ok,
    Corruption(String),
    NotFound,
    IoError(String),
    Closed(String),
}

impl Status {
    pub fn is_corruption(&self) -> bool {
        matches!(self, Status::Corruption(_))
    }

    pub fn is_io_error(&self) -> bool {
        matches!(self, Status::IoError(_))
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Ok => write!(f, "ok"),
            Status::Corruption(message) => write!(f, "corruption: {}", message),
            Status::NotFound => write!(f, "not found"),
            Status::IoError(message) => write!(f, "io error: {}", message),
            Status::Closed(what) => write!(f, "{} already closed", what),
        }
    }
}

impl std::error::Error for Status {}

impl From<io::Error> for Status {
    fn from(e: io::Error) -> Self {
        Status::IoError(e.to_string())
    }
}

pub trait Corrupting<T>: Sized {
    fn corrupted(message: T) -> Status;
}

impl Corrupting<String> for Status {
    fn corrupted(message: String) -> Status {
        Status::Corruption(message)
    }
}

impl Corrupting<&str> for Status {
    fn corrupted(message: &str) -> Status {
        Status::Corruption(String::from(message))
    }
}

#[inline]
pub fn from_io_result<T>(rs: io::Result<T>) -> crate::Result<T> {
    match rs {
        Ok(v) => Ok(v),
        Err(e) => Err(Status::IoError(e.to_string()))
    }
}
