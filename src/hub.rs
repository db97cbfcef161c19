//! Event hub
//!
//! The hub is a registry of listeners keyed by capability: nonce created, error, and nonces
//! updated. Each capability is an independent channel.
//!
//! - Raising an event with at least one listener registered delivers it to each of them.
//! - Raising an event with no listeners buffers it. Only the most recent event is kept.
//! - Registering a listener while an event is buffered delivers that event to the new
//!   listener and clears the buffer.
//!
//! Listeners are invoked outside the registry lock, so a listener may register or remove
//! listeners (including itself) while being called. A removal does not cancel a delivery
//! that has already taken its snapshot of listeners.
//!
//! A panicking listener is logged and skipped; the remaining listeners still receive the
//! event and the hub keeps delivering later events.
//!
//! Ordering is only guaranteed between events raised from one thread. A buffered event
//! replayed by `add_*_listener` is delivered on the registering thread, so a raise running
//! concurrently on another thread may reach the new listener before the replay does.

use crate::types::PaymentMethodNonce;
use crate::BraintreeError;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Kind of event a listener is interested in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    NonceCreated,
    Error,
    NoncesUpdated,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::NonceCreated => "nonce-created",
            Capability::Error => "error",
            Capability::NoncesUpdated => "nonces-updated",
        };
        f.write_str(name)
    }
}

/// Handle returned when a listener is registered, used to remove it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId {
    capability: Capability,
    id: u64,
}

impl ListenerId {
    pub fn capability(&self) -> Capability {
        self.capability
    }
}

/// A terminal event raised on the hub
#[derive(Debug, Clone)]
pub enum HubEvent {
    NonceCreated(PaymentMethodNonce),
    Error(Arc<BraintreeError>),
    NoncesUpdated(Vec<PaymentMethodNonce>),
}

impl HubEvent {
    pub fn capability(&self) -> Capability {
        match self {
            HubEvent::NonceCreated(_) => Capability::NonceCreated,
            HubEvent::Error(_) => Capability::Error,
            HubEvent::NoncesUpdated(_) => Capability::NoncesUpdated,
        }
    }
}

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Channel<T> {
    handlers: Vec<(u64, Handler<T>)>,
    buffered: Option<T>,
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
            buffered: None,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Call one listener, containing any panic it raises
fn deliver<T>(handler: &Handler<T>, capability: Capability, event: &T) -> bool {
    match catch_unwind(AssertUnwindSafe(|| handler(event))) {
        Ok(()) => true,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!("A {} listener panicked: {}", capability, message);
            false
        }
    }
}

fn register<T>(channel: &Mutex<Channel<T>>, capability: Capability, id: u64, handler: Handler<T>) {
    let buffered = {
        let mut channel = lock(channel);
        channel.handlers.push((id, handler.clone()));
        channel.buffered.take()
    };

    if let Some(event) = buffered {
        deliver(&handler, capability, &event);
    }
}

fn raise<T>(channel: &Mutex<Channel<T>>, capability: Capability, event: T) -> bool {
    let handlers: Vec<Handler<T>> = {
        let mut channel = lock(channel);
        if channel.handlers.is_empty() {
            if channel.buffered.replace(event).is_some() {
                tracing::debug!("Replacing buffered {} event", capability);
            } else {
                tracing::debug!("No {} listeners, buffering event", capability);
            }
            return false;
        }
        channel.handlers.iter().map(|(_, h)| h.clone()).collect()
    };

    for handler in &handlers {
        deliver(handler, capability, &event);
    }
    true
}

fn unregister<T>(channel: &Mutex<Channel<T>>, id: u64) -> bool {
    let mut channel = lock(channel);
    let before = channel.handlers.len();
    channel.handlers.retain(|(handler_id, _)| *handler_id != id);
    channel.handlers.len() != before
}

/// Per-capability listener registry with single-event buffering
#[derive(Default)]
pub struct EventHub {
    next_id: AtomicU64,
    nonce_created: Mutex<Channel<PaymentMethodNonce>>,
    error: Mutex<Channel<Arc<BraintreeError>>>,
    nonces_updated: Mutex<Channel<Vec<PaymentMethodNonce>>>,
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("nonce_created", &self.listener_count(Capability::NonceCreated))
            .field("error", &self.listener_count(Capability::Error))
            .field("nonces_updated", &self.listener_count(Capability::NoncesUpdated))
            .finish()
    }
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self, capability: Capability) -> ListenerId {
        ListenerId {
            capability,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Register a listener for created nonces
    pub fn add_nonce_created_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&PaymentMethodNonce) + Send + Sync + 'static,
    {
        let id = self.next_id(Capability::NonceCreated);
        register(
            &self.nonce_created,
            Capability::NonceCreated,
            id.id,
            Arc::new(listener),
        );
        id
    }

    /// Register a listener for errors
    pub fn add_error_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&BraintreeError) + Send + Sync + 'static,
    {
        let id = self.next_id(Capability::Error);
        register(
            &self.error,
            Capability::Error,
            id.id,
            Arc::new(move |error: &Arc<BraintreeError>| listener(error.as_ref())),
        );
        id
    }

    /// Register a listener for payment method lists
    pub fn add_nonces_updated_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&[PaymentMethodNonce]) + Send + Sync + 'static,
    {
        let id = self.next_id(Capability::NoncesUpdated);
        register(
            &self.nonces_updated,
            Capability::NoncesUpdated,
            id.id,
            Arc::new(move |nonces: &Vec<PaymentMethodNonce>| listener(nonces.as_slice())),
        );
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        match id.capability {
            Capability::NonceCreated => unregister(&self.nonce_created, id.id),
            Capability::Error => unregister(&self.error, id.id),
            Capability::NoncesUpdated => unregister(&self.nonces_updated, id.id),
        }
    }

    /// Raise a created nonce. Returns false if it was buffered instead of delivered.
    pub fn raise_nonce_created(&self, nonce: PaymentMethodNonce) -> bool {
        raise(&self.nonce_created, Capability::NonceCreated, nonce)
    }

    /// Raise an error. Returns false if it was buffered instead of delivered.
    pub fn raise_error(&self, error: impl Into<Arc<BraintreeError>>) -> bool {
        raise(&self.error, Capability::Error, error.into())
    }

    /// Raise a payment method list. Returns false if it was buffered instead of delivered.
    pub fn raise_nonces_updated(&self, nonces: Vec<PaymentMethodNonce>) -> bool {
        raise(&self.nonces_updated, Capability::NoncesUpdated, nonces)
    }

    /// Raise any event on its capability's channel
    pub fn dispatch(&self, event: HubEvent) -> bool {
        match event {
            HubEvent::NonceCreated(nonce) => self.raise_nonce_created(nonce),
            HubEvent::Error(error) => self.raise_error(error),
            HubEvent::NoncesUpdated(nonces) => self.raise_nonces_updated(nonces),
        }
    }

    pub fn listener_count(&self, capability: Capability) -> usize {
        match capability {
            Capability::NonceCreated => lock(&self.nonce_created).handlers.len(),
            Capability::Error => lock(&self.error).handlers.len(),
            Capability::NoncesUpdated => lock(&self.nonces_updated).handlers.len(),
        }
    }

    /// Whether an event is waiting for the next listener of `capability`
    pub fn has_buffered(&self, capability: Capability) -> bool {
        match capability {
            Capability::NonceCreated => lock(&self.nonce_created).buffered.is_some(),
            Capability::Error => lock(&self.error).buffered.is_some(),
            Capability::NoncesUpdated => lock(&self.nonces_updated).buffered.is_some(),
        }
    }
}
