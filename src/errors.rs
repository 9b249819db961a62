//! The error type used throughout the crate, and its mapping to
//! HTTP status codes at the dispatch boundary.

use std::error::Error;
use std::fmt;
use std::io;

use http::StatusCode;

use crate::fs::FsError;

/// Internal error type, turned into a HTTP response at the top
/// of the dispatcher.
#[derive(Debug)]
pub enum DavError {
    /// While parsing the XML request body.
    XmlReadError,
    /// The XML was valid, but did not have the expected shape.
    XmlParseError,
    InvalidPath,
    IllegalPath,
    UnknownDavMethod,
    /// Plain status code response.
    Status(StatusCode),
    /// Status code response, and the connection must be closed.
    StatusClose(StatusCode),
    FsError(FsError),
    IoError(io::Error),
}

pub type DavResult<T> = Result<T, DavError>;

impl DavError {
    /// The status code of the error response.
    pub fn statuscode(&self) -> StatusCode {
        match self {
            DavError::XmlReadError => StatusCode::BAD_REQUEST,
            DavError::XmlParseError => StatusCode::BAD_REQUEST,
            DavError::InvalidPath => StatusCode::BAD_REQUEST,
            DavError::IllegalPath => StatusCode::BAD_REQUEST,
            DavError::UnknownDavMethod => StatusCode::METHOD_NOT_ALLOWED,
            DavError::Status(c) => *c,
            DavError::StatusClose(c) => *c,
            DavError::FsError(e) => e.statuscode(),
            DavError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the connection should be closed after this error.
    /// Set when we refused to process the request body.
    pub fn must_close(&self) -> bool {
        !matches!(self, DavError::Status(_) | DavError::FsError(_))
    }
}

impl fmt::Display for DavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DavError::FsError(e) => write!(f, "{e:?}"),
            DavError::IoError(e) => write!(f, "{e}"),
            _ => write!(f, "{self:?}"),
        }
    }
}

impl Error for DavError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DavError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StatusCode> for DavError {
    fn from(c: StatusCode) -> Self {
        DavError::Status(c)
    }
}

impl From<FsError> for DavError {
    fn from(e: FsError) -> Self {
        DavError::FsError(e)
    }
}

impl From<io::Error> for DavError {
    fn from(e: io::Error) -> Self {
        DavError::IoError(e)
    }
}

impl From<xmltree::ParseError> for DavError {
    fn from(_: xmltree::ParseError) -> Self {
        DavError::XmlReadError
    }
}

impl From<xml::writer::Error> for DavError {
    fn from(e: xml::writer::Error) -> Self {
        match e {
            xml::writer::Error::Io(e) => DavError::IoError(e),
            _ => DavError::XmlParseError,
        }
    }
}
