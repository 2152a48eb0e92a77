use std::fmt;

use once_cell::sync::Lazy;

pub const NOT_FOUND_BODY: &str = "Static file not found";
pub const SERVER_ERROR_BODY: &str = "Server error";

// The two fixed failure responses never change, serialize them once
static NOT_FOUND: Lazy<Vec<u8>> =
    Lazy::new(|| Response::new(StatusCode::NotFound, NOT_FOUND_BODY).to_bytes());
static SERVER_ERROR: Lazy<Vec<u8>> = Lazy::new(|| {
    Response::new(StatusCode::InternalServerError, SERVER_ERROR_BODY).to_bytes()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    NotFound,
    InternalServerError,
}

impl StatusCode {
    pub fn code(self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

/// A response that is always sent with `Connection: close`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(StatusCode::Ok, body)
    }

    /// Serializes the response into its exact wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let head = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status,
            self.body.len()
        );

        let mut out = Vec::with_capacity(head.len() + self.body.len());
        out.extend_from_slice(head.as_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}

/// Fixed failure response for `status`. Anything but 404 is a server error.
pub fn failure(status: StatusCode) -> Vec<u8> {
    match status {
        StatusCode::NotFound => not_found(),
        _ => server_error(),
    }
}

pub fn not_found() -> Vec<u8> {
    NOT_FOUND.clone()
}

pub fn server_error() -> Vec<u8> {
    SERVER_ERROR.clone()
}
