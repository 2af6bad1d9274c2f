use std::sync::Arc;

use shared::{
    domain::{PresentationId, SlideId, UserId},
    protocol::{ChannelEvent, PresentationSlides},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

pub mod directory;
pub mod error;
pub mod navigation;
pub mod projection;
pub mod sequence;
pub mod subscription;
pub mod tally;
pub mod transport;

pub use directory::{HttpSlideDirectory, MissingSlideDirectory, SlideDirectory};
pub use error::HostSessionError;
pub use navigation::{NavigationState, Navigator};
pub use projection::{build_projection, ChartProjection, ColorAssignment};
pub use sequence::SlideSequence;
pub use subscription::{transition_commands, ChannelCommand, SubscriptionManager};
pub use tally::{AggregateTally, ChoiceTally, Vote};
pub use transport::{MissingTransport, SlideChannelTransport, SocketTransport};

/// The signed-in user driving this view. Passed in at construction instead
/// of read from ambient storage, so the host guard is explicit and
/// testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostIdentity {
    pub user_id: UserId,
}

/// What the rendering collaborator asked for through its navigate
/// callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationRequest {
    Forward,
    Back,
    Jump(SlideId),
}

/// Notifications fanned out to the rendering collaborator.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    SlideChanged { state: NavigationState },
    TallyUpdated { projection: ChartProjection },
    Error(String),
}

/// Live host session for one presentation: navigation over the deck, a
/// single live channel subscription tracking the current slide, and the
/// vote tally for that slide.
pub struct HostSession {
    directory: Arc<dyn SlideDirectory>,
    transport: Arc<dyn SlideChannelTransport>,
    identity: HostIdentity,
    inner: Mutex<HostSessionState>,
    events: broadcast::Sender<SessionEvent>,
}

struct HostSessionState {
    presentation: Option<PresentationSlides>,
    navigator: Option<Navigator>,
    subscriptions: SubscriptionManager,
    tally: Option<AggregateTally>,
    colors: Option<ColorAssignment>,
    pump_task: Option<JoinHandle<()>>,
}

impl HostSession {
    pub fn new(identity: HostIdentity) -> Arc<Self> {
        Self::new_with_dependencies(
            identity,
            Arc::new(MissingSlideDirectory),
            Arc::new(MissingTransport),
        )
    }

    pub fn new_with_dependencies(
        identity: HostIdentity,
        directory: Arc<dyn SlideDirectory>,
        transport: Arc<dyn SlideChannelTransport>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            directory,
            transport: Arc::clone(&transport),
            identity,
            inner: Mutex::new(HostSessionState {
                presentation: None,
                navigator: None,
                subscriptions: SubscriptionManager::new(transport),
                tally: None,
                colors: None,
                pump_task: None,
            }),
            events,
        })
    }

    /// Loads the presentation, enforces the host guard, and puts the
    /// first slide on air.
    pub async fn start(
        self: &Arc<Self>,
        presentation_id: PresentationId,
    ) -> Result<(), HostSessionError> {
        let presentation = self
            .directory
            .fetch_slide_sequence(presentation_id)
            .await
            .map_err(|source| HostSessionError::Directory { source })?;

        if presentation.host_id != self.identity.user_id {
            return Err(HostSessionError::UnauthorizedAccess {
                presentation_id,
                user_id: self.identity.user_id,
            });
        }

        let sequence = SlideSequence::from_slide_ids(&presentation.slide_ids)?;
        let navigator = Navigator::new(sequence);

        {
            let mut inner = self.inner.lock().await;
            if let Some(task) = inner.pump_task.take() {
                task.abort();
            }
            inner.presentation = Some(presentation);
            inner.navigator = Some(navigator);
            inner.tally = None;
            inner.colors = None;
            inner.pump_task = Some(self.spawn_channel_pump());
        }

        info!(presentation_id = presentation_id.0, "host session started");
        self.apply_navigation_change().await
    }

    /// Moves one slide forward. Returns `false` for the guarded no-op at
    /// the end of the deck.
    pub async fn advance(&self) -> Result<bool, HostSessionError> {
        self.shift(true).await
    }

    /// Moves one slide back. Returns `false` for the guarded no-op at the
    /// start of the deck.
    pub async fn retreat(&self) -> Result<bool, HostSessionError> {
        self.shift(false).await
    }

    async fn shift(&self, forward: bool) -> Result<bool, HostSessionError> {
        let moved = {
            let mut inner = self.inner.lock().await;
            let navigator = inner
                .navigator
                .as_mut()
                .ok_or(HostSessionError::NotStarted)?;
            if forward {
                navigator.advance()
            } else {
                navigator.retreat()
            }
        };
        if !moved {
            return Ok(false);
        }
        self.apply_navigation_change().await?;
        Ok(true)
    }

    /// Puts `slide_id` on air directly. Staying on the current slide is a
    /// no-op with no subscription churn.
    pub async fn jump(&self, slide_id: SlideId) -> Result<(), HostSessionError> {
        let changed = {
            let mut inner = self.inner.lock().await;
            let navigator = inner
                .navigator
                .as_mut()
                .ok_or(HostSessionError::NotStarted)?;
            let before = navigator.current();
            navigator.jump(slide_id)?;
            before != navigator.current()
        };
        if changed {
            self.apply_navigation_change().await?;
        }
        Ok(())
    }

    /// Single entry point for the rendering collaborator's navigate
    /// callback.
    pub async fn navigate(&self, request: NavigationRequest) -> Result<(), HostSessionError> {
        match request {
            NavigationRequest::Forward => self.advance().await.map(|_| ()),
            NavigationRequest::Back => self.retreat().await.map(|_| ()),
            NavigationRequest::Jump(slide_id) => self.jump(slide_id).await,
        }
    }

    /// External reconnect signal from the transport's owner: re-issues
    /// the subscribe for the current slide and rebuilds its tally from a
    /// fresh detail fetch, which also recovers votes recorded server-side
    /// during the disconnect window.
    pub async fn resync(&self) -> Result<(), HostSessionError> {
        {
            let mut inner = self.inner.lock().await;
            if inner.navigator.is_none() {
                return Err(HostSessionError::NotStarted);
            }
            inner.subscriptions.mark_disconnected();
        }
        self.apply_navigation_change().await
    }

    /// Render-ready view of the live tally; the empty projection while
    /// slide data is loading.
    pub async fn projection(&self) -> ChartProjection {
        let inner = self.inner.lock().await;
        match (inner.tally.as_ref(), inner.colors.as_ref()) {
            (Some(tally), Some(colors)) => build_projection(tally, colors),
            _ => ChartProjection::empty(),
        }
    }

    pub async fn navigation(&self) -> Option<NavigationState> {
        let inner = self.inner.lock().await;
        inner.navigator.as_ref().map(Navigator::state)
    }

    pub async fn presentation(&self) -> Option<PresentationSlides> {
        self.inner.lock().await.presentation.clone()
    }

    /// Releases the live subscription and the connection. The session can
    /// be started again afterwards.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(task) = inner.pump_task.take() {
            task.abort();
        }
        inner.subscriptions.shutdown().await;
        inner.tally = None;
        inner.colors = None;
        inner.navigator = None;
        inner.presentation = None;
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Runs the subscription transition for the navigator's current
    /// slide, fetches its detail once, and rebuilds the tally and color
    /// assignment.
    async fn apply_navigation_change(&self) -> Result<(), HostSessionError> {
        let (state, new_cur) = {
            let mut inner = self.inner.lock().await;
            let (state, new_cur) = {
                let navigator = inner
                    .navigator
                    .as_ref()
                    .ok_or(HostSessionError::NotStarted)?;
                (navigator.state(), navigator.current())
            };
            // Switching cur discards the previous slide's tally before any
            // event for the new channel can arrive.
            inner.tally = None;
            inner.colors = None;
            inner.subscriptions.switch_to(new_cur).await?;
            (state, new_cur)
        };

        let _ = self.events.send(SessionEvent::SlideChanged { state });

        let Some(slide_id) = new_cur else {
            return Ok(());
        };

        let detail = match self.directory.fetch_slide_detail(slide_id).await {
            Ok(detail) => detail,
            Err(err) => {
                warn!(slide_id = slide_id.0, "slide detail fetch failed: {err}");
                let _ = self.events.send(SessionEvent::Error(format!(
                    "failed to fetch slide {}: {err}",
                    slide_id.0
                )));
                return Ok(());
            }
        };

        let projection = {
            let mut inner = self.inner.lock().await;
            // Navigation may have moved on while the fetch was in flight.
            if inner.navigator.as_ref().and_then(Navigator::current) != Some(slide_id) {
                return Ok(());
            }
            let tally = AggregateTally::from_detail(&detail);
            let colors = ColorAssignment::generate(&tally);
            let projection = build_projection(&tally, &colors);
            inner.tally = Some(tally);
            inner.colors = Some(colors);
            projection
        };

        let _ = self.events.send(SessionEvent::TallyUpdated { projection });
        Ok(())
    }

    fn spawn_channel_pump(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.transport.subscribe_events();
        let session = Arc::clone(self);
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                session.handle_channel_event(event).await;
            }
        })
    }

    async fn handle_channel_event(&self, event: ChannelEvent) {
        match event {
            ChannelEvent::ChoicesSubmitted {
                slide_id,
                voter_id,
                choice_ids,
            } => {
                let projection = {
                    let mut inner = self.inner.lock().await;
                    let state = &mut *inner;
                    let Some(tally) = state.tally.as_mut() else {
                        debug!(slide_id = slide_id.0, "vote event before tally ready dropped");
                        return;
                    };
                    if tally.slide_id != slide_id {
                        // In-flight event for a channel we already left.
                        debug!(
                            slide_id = slide_id.0,
                            live_slide_id = tally.slide_id.0,
                            "stray vote event dropped"
                        );
                        return;
                    }
                    if tally.apply(voter_id, &choice_ids) == 0 {
                        return;
                    }
                    let Some(colors) = state.colors.as_ref() else {
                        return;
                    };
                    build_projection(tally, colors)
                };
                let _ = self.events.send(SessionEvent::TallyUpdated { projection });
            }
            ChannelEvent::Error(err) => {
                let _ = self
                    .events
                    .send(SessionEvent::Error(format!("live channel error: {err}")));
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
