//! Request and connection parameters handed to the collaborator.

use core::time::Duration;
use heapless::{String, Vec};

use crate::network::error::Error;

pub const MAX_HEADERS: usize = 16;
pub const MAX_HEADER_NAME_LEN: usize = 64;
pub const MAX_HEADER_VALUE_LEN: usize = 256;
pub const MAX_HOST_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String<MAX_HEADER_NAME_LEN>,
    pub value: String<MAX_HEADER_VALUE_LEN>,
}

impl Header {
    /// Builds a header, failing if either side exceeds its capacity.
    pub fn new(name: &str, value: &str) -> Result<Self, Error> {
        Ok(Self {
            name: String::try_from(name).map_err(|_| Error::InvalidConfig)?,
            value: String::try_from(value).map_err(|_| Error::InvalidConfig)?,
        })
    }
}

/// A single request/response exchange to issue on an established connection.
#[derive(Debug, Clone)]
pub struct Request<'a> {
    pub method: Method,
    pub path: &'a str,
    pub headers: Vec<Header, MAX_HEADERS>,
    pub body: Option<&'a [u8]>,
}

impl<'a> Request<'a> {
    /// A GET for `path` carrying the `Host` header.
    pub fn get(path: &'a str, host: &str) -> Result<Self, Error> {
        let mut headers = Vec::new();
        headers
            .push(Header::new("Host", host)?)
            .map_err(|_| Error::InvalidConfig)?;
        Ok(Self {
            method: Method::Get,
            path,
            headers,
            body: None,
        })
    }

    /// A POST of `body` to `path` carrying the `Host` header.
    pub fn post(path: &'a str, host: &str, body: &'a [u8]) -> Result<Self, Error> {
        Ok(Self {
            method: Method::Post,
            body: Some(body),
            ..Self::get(path, host)?
        })
    }

    /// Appends a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, Error> {
        self.headers
            .push(Header::new(name, value)?)
            .map_err(|_| Error::InvalidConfig)?;
        Ok(self)
    }

    /// Looks up a header value, ignoring ASCII case in the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|header| header.name.eq_ignore_ascii_case(name))
            .map(|header| header.value.as_str())
    }
}

/// Security-layer settings for a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityOptions {
    /// Name sent for server name indication, if any.
    pub server_name: Option<String<MAX_HOST_LEN>>,
    /// Whether the collaborator should validate the peer's certificate chain.
    pub verify_peer: bool,
}

impl Default for SecurityOptions {
    fn default() -> Self {
        Self {
            server_name: None,
            verify_peer: true,
        }
    }
}

/// Parameters of one asynchronous connect attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub host: String<MAX_HOST_LEN>,
    pub port: u16,
    /// Socket-level connect timeout enforced by the collaborator.
    pub connect_timeout: Duration,
    /// `None` connects without a security layer.
    pub security: Option<SecurityOptions>,
}

impl ConnectOptions {
    pub fn new(host: &str, port: u16, connect_timeout: Duration) -> Result<Self, Error> {
        Ok(Self {
            host: String::try_from(host).map_err(|_| Error::InvalidConfig)?,
            port,
            connect_timeout,
            security: None,
        })
    }

    pub fn with_security(mut self, security: SecurityOptions) -> Self {
        self.security = Some(security);
        self
    }
}
