//! Connect to a panel bridge, request its configuration and status, and log
//! every message the panel sends until the link drops.
//!
//! Run with:
//!   cargo run -p nxlink --example panel-monitor --features logging -- tcp://192.168.1.40:4001
//!
//! The argument may also be `unix:///path/to/socket` or a path to a JSON
//! bridge configuration file. Set `NXLINK_LOG_FORMAT=json` and
//! `NXLINK_LOG_LEVEL=debug` to change the log output.

use std::sync::Arc;
use std::time::Duration;

use nxlink::frame::types::{
    INTERFACE_CONFIGURATION_REQUEST, PARTITION_STATUS_REQUEST, SYSTEM_STATUS_REQUEST,
};
use nxlink::link::{connect_with_listeners, MessageListener};
use nxlink::logging::{init_logging, LogFormat, LogLevel};
use nxlink::{BridgeConfig, LinkSender, Message};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let format = std::env::var("NXLINK_LOG_FORMAT")
        .ok()
        .map(|value| value.parse::<LogFormat>())
        .transpose()?
        .unwrap_or_default();
    let level = std::env::var("NXLINK_LOG_LEVEL")
        .ok()
        .map(|value| value.parse::<LogLevel>())
        .transpose()?
        .unwrap_or_default();
    init_logging(format, level);

    let target = std::env::args()
        .nth(1)
        .ok_or("usage: panel-monitor <tcp://host:port | unix:///path | config.json>")?;
    let config = if target.ends_with(".json") {
        BridgeConfig::from_json_str(&std::fs::read_to_string(&target)?)?
    } else {
        BridgeConfig::new(target.parse()?)
    };

    let printer: Arc<dyn MessageListener> = Arc::new(|_: &LinkSender, message: &Message| {
        tracing::info!(message = %message, "panel");
    });
    let mut link = connect_with_listeners(&config, &[printer])?;

    link.send(Message::new(INTERFACE_CONFIGURATION_REQUEST, &[]));
    link.send(Message::new(SYSTEM_STATUS_REQUEST, &[]));
    link.send(Message::new(PARTITION_STATUS_REQUEST, &[0x00]));

    while link.is_running() {
        std::thread::sleep(Duration::from_millis(500));
    }

    link.stop()?;
    Ok(())
}
