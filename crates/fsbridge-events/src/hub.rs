//! Shared event channel with named listeners.

use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use crate::error::{EventChannelError, EventChannelResult};
use crate::payloads::TransferEvent;
use crate::topics::EventName;

/// Callback invoked for every event emitted under the name it was registered for.
pub type Listener = Arc<dyn Fn(&TransferEvent) + Send + Sync>;

/// Handle to one listener registration, used to remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    /// Wrap a raw token value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw token value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Display for SubscriptionToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "sub-{}", self.0)
    }
}

/// Named-event fan-out shared by every job of a kind.
pub trait EventChannel: Send + Sync {
    /// Register `listener` for events emitted under `name`.
    fn add_listener(&self, name: EventName, listener: Listener) -> SubscriptionToken;

    /// Remove a registration created by [`EventChannel::add_listener`].
    ///
    /// # Errors
    ///
    /// Returns [`EventChannelError::UnknownSubscription`] when the token is not
    /// registered (already removed or never issued by this channel).
    fn remove_listener(&self, token: SubscriptionToken) -> EventChannelResult<()>;
}

struct Registration {
    token: SubscriptionToken,
    name: EventName,
    listener: Listener,
}

struct HubInner {
    next_token: AtomicU64,
    listeners: RwLock<Vec<Registration>>,
}

/// In-process event channel used by host executors to report transfer events.
///
/// Listeners run synchronously inside [`EventHub::emit`] in registration
/// order, so a single emitter observes per-job ordering end to end.
#[derive(Clone)]
pub struct EventHub {
    inner: Arc<HubInner>,
}

impl EventHub {
    /// Construct an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HubInner {
                next_token: AtomicU64::new(1),
                listeners: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Emit an event, dispatching it to matching listeners before returning.
    ///
    /// Returns the number of listeners that received it.
    pub fn emit(&self, event: TransferEvent) -> usize {
        let name = event.name();

        // Snapshot so listeners may (un)register from inside a callback.
        let matching: Vec<Listener> = self
            .inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|registration| registration.name == name)
            .map(|registration| Arc::clone(&registration.listener))
            .collect();

        trace!(
            event = %name,
            job_id = %event.job_handle(),
            listeners = matching.len(),
            "dispatching event"
        );
        for listener in &matching {
            listener(&event);
        }
        matching.len()
    }

    /// Number of live listener registrations across all names.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventChannel for EventHub {
    fn add_listener(&self, name: EventName, listener: Listener) -> SubscriptionToken {
        let token = SubscriptionToken(self.inner.next_token.fetch_add(1, Ordering::Relaxed));
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Registration {
                token,
                name,
                listener,
            });
        token
    }

    fn remove_listener(&self, token: SubscriptionToken) -> EventChannelResult<()> {
        let mut listeners = self
            .inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let position = listeners
            .iter()
            .position(|registration| registration.token == token)
            .ok_or(EventChannelError::UnknownSubscription { token })?;
        let _ = listeners.remove(position);
        Ok(())
    }
}
