use std::sync::Arc;

use shared::{domain::SlideId, protocol::ControlMessage};
use tracing::{debug, warn};

use crate::{error::HostSessionError, transport::SlideChannelTransport};

/// One side effect of a navigation transition on the live channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelCommand {
    Unsubscribe(SlideId),
    Subscribe(SlideId),
}

/// Transition table for the channel invariant: the set of open
/// subscriptions is exactly `{cur}`, or empty when there is no current
/// slide. Unsubscribing the old channel always precedes subscribing the
/// new one; staying on the same slide emits nothing.
pub fn transition_commands(
    old_cur: Option<SlideId>,
    new_cur: Option<SlideId>,
) -> Vec<ChannelCommand> {
    if old_cur == new_cur {
        return Vec::new();
    }
    let mut commands = Vec::with_capacity(2);
    if let Some(old) = old_cur {
        commands.push(ChannelCommand::Unsubscribe(old));
    }
    if let Some(new) = new_cur {
        commands.push(ChannelCommand::Subscribe(new));
    }
    commands
}

/// Applies channel commands against the transport, opening the underlying
/// connection lazily on the first subscribe. `desired` survives a failed
/// subscribe so the next navigation event or an external reconnect signal
/// retries it.
pub struct SubscriptionManager {
    transport: Arc<dyn SlideChannelTransport>,
    desired: Option<SlideId>,
    active: Option<SlideId>,
}

impl SubscriptionManager {
    pub fn new(transport: Arc<dyn SlideChannelTransport>) -> Self {
        Self {
            transport,
            desired: None,
            active: None,
        }
    }

    pub fn active(&self) -> Option<SlideId> {
        self.active
    }

    /// Moves the single live subscription to `new_cur`.
    pub async fn switch_to(&mut self, new_cur: Option<SlideId>) -> Result<(), HostSessionError> {
        self.desired = new_cur;
        self.reconcile().await
    }

    /// The connection was lost; forget the server-side subscription so the
    /// next reconcile re-issues it.
    pub fn mark_disconnected(&mut self) {
        self.active = None;
    }

    async fn reconcile(&mut self) -> Result<(), HostSessionError> {
        for command in transition_commands(self.active, self.desired) {
            match command {
                ChannelCommand::Unsubscribe(slide_id) => {
                    // Fire and forget: the old channel is being abandoned
                    // either way, a lost frame only delays server cleanup.
                    if let Err(err) = self
                        .transport
                        .send(ControlMessage::Unsubscribe { slide_id })
                        .await
                    {
                        warn!(slide_id = slide_id.0, "unsubscribe frame not delivered: {err}");
                    }
                    self.active = None;
                }
                ChannelCommand::Subscribe(slide_id) => {
                    self.transport
                        .ensure_open()
                        .await
                        .map_err(|source| HostSessionError::ConnectionUnavailable { source })?;
                    self.transport
                        .send(ControlMessage::Subscribe { slide_id })
                        .await
                        .map_err(|source| HostSessionError::ConnectionUnavailable { source })?;
                    self.active = Some(slide_id);
                    debug!(slide_id = slide_id.0, "live channel subscribed");
                }
            }
        }
        Ok(())
    }

    /// Releases the live subscription and the connection. Safe to call
    /// more than once.
    pub async fn shutdown(&mut self) {
        if let Some(slide_id) = self.active.take() {
            if let Err(err) = self
                .transport
                .send(ControlMessage::Unsubscribe { slide_id })
                .await
            {
                debug!(slide_id = slide_id.0, "unsubscribe on shutdown not delivered: {err}");
            }
        }
        self.desired = None;
        self.transport.close().await;
    }
}

#[cfg(test)]
#[path = "tests/subscription_tests.rs"]
mod tests;
