use std::time::Duration;

use nxlink_frame::FrameConfig;
use nxlink_transport::Endpoint;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How long the worker waits for a reply, and the reader for a taker.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Configuration for a running link.
///
/// Durations are (de)serialized as integer milliseconds; every field is
/// optional in serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Per-cycle wait for an inbound message after transmitting.
    #[serde(rename = "reply_timeout_ms", with = "millis")]
    pub reply_timeout: Duration,
    /// How long a decoded frame waits at the rendezvous before it is dropped.
    #[serde(rename = "handoff_timeout_ms", with = "millis")]
    pub handoff_timeout: Duration,
    /// Read timeout on the stream. `None` blocks until bytes arrive.
    #[serde(rename = "read_timeout_ms", with = "opt_millis")]
    pub read_timeout: Option<Duration>,
    /// Write timeout on the stream.
    #[serde(rename = "write_timeout_ms", with = "opt_millis")]
    pub write_timeout: Option<Duration>,
    /// Prefix for the reader and worker thread names.
    pub thread_name: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            reply_timeout: DEFAULT_TIMEOUT,
            handoff_timeout: DEFAULT_TIMEOUT,
            read_timeout: None,
            write_timeout: None,
            thread_name: "nxlink".to_string(),
        }
    }
}

impl LinkConfig {
    /// Stream timeouts for the frame reader and writer.
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
        }
    }
}

/// Where the panel lives plus how to drive the link to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// `tcp://host:port` or `unix:///path`.
    pub endpoint: Endpoint,
    /// Bound on establishing a TCP connection.
    #[serde(
        rename = "connect_timeout_ms",
        with = "opt_millis",
        default = "default_connect_timeout"
    )]
    pub connect_timeout: Option<Duration>,
    #[serde(default)]
    pub link: LinkConfig,
}

fn default_connect_timeout() -> Option<Duration> {
    Some(Duration::from_secs(5))
}

impl BridgeConfig {
    /// Bridge configuration with default link settings.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            connect_timeout: default_connect_timeout(),
            link: LinkConfig::default(),
        }
    }

    /// Parse a JSON bridge configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer
                .serialize_some(&u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|value| value.map(Duration::from_millis))
    }
}
