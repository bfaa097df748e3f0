use std::sync::Arc;

use tracing::info;

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::link::Link;
use crate::listener::MessageListener;

/// Open the configured endpoint and start a link on it.
pub fn connect(config: &BridgeConfig) -> Result<Link> {
    connect_with_listeners(config, &[])
}

/// Open the configured endpoint and start a link with `listeners` already
/// subscribed, so no message arriving right after connect is missed.
pub fn connect_with_listeners(
    config: &BridgeConfig,
    listeners: &[Arc<dyn MessageListener>],
) -> Result<Link> {
    let stream = config.endpoint.connect(config.connect_timeout)?;
    info!(endpoint = %config.endpoint, "connected to panel bridge");

    let mut link = Link::new(config.link.clone());
    for listener in listeners {
        link.on_message(Arc::clone(listener));
    }
    link.start(stream)?;
    Ok(link)
}
