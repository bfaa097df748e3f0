use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransportError};
use crate::traits::LinkStream;

/// Where the panel's serial line can be reached.
///
/// Written as `tcp://host:port` or `unix:///path/to/socket`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Endpoint {
    /// A serial-over-TCP bridge.
    Tcp(String),
    /// A Unix domain socket bridge.
    Unix(PathBuf),
}

impl Endpoint {
    /// Open a stream to this endpoint.
    ///
    /// `timeout` bounds the TCP connect; Unix sockets connect immediately.
    pub fn connect(&self, timeout: Option<Duration>) -> Result<LinkStream> {
        match self {
            Endpoint::Tcp(addr) => crate::tcp::connect(addr, timeout),
            #[cfg(unix)]
            Endpoint::Unix(path) => crate::uds::connect(path),
            #[cfg(not(unix))]
            Endpoint::Unix(_) => Err(TransportError::Unsupported(self.to_string())),
        }
    }
}

impl FromStr for Endpoint {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason| TransportError::InvalidEndpoint {
            input: s.to_string(),
            reason,
        };

        if let Some(addr) = s.strip_prefix("tcp://") {
            let (host, port) = addr.rsplit_once(':').ok_or_else(|| invalid("missing port"))?;
            if host.is_empty() {
                return Err(invalid("missing host"));
            }
            port.parse::<u16>().map_err(|_| invalid("invalid port"))?;
            Ok(Endpoint::Tcp(addr.to_string()))
        } else if let Some(path) = s.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(invalid("missing socket path"));
            }
            Ok(Endpoint::Unix(PathBuf::from(path)))
        } else {
            Err(invalid("expected tcp:// or unix:// scheme"))
        }
    }
}

impl TryFrom<String> for Endpoint {
    type Error = TransportError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Endpoint> for String {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.to_string()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp(addr) => write!(f, "tcp://{addr}"),
            Endpoint::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}
