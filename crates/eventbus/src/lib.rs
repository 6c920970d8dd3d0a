//! # skein-eventbus
//!
//! The named-channel, schema-typed publish/subscribe bus tasks use to
//! stream progress to the outside world (spec §4.2). Each channel retains
//! its last emitted payload as "channel state" (so a late subscriber, or a
//! resumed workflow, can replay where things left off), and delivery to
//! subscribers is synchronous and in subscription order — there is no
//! queue, no backpressure, and no cross-thread hop, matching the spec's
//! single-threaded execution-context contract. Listeners must therefore be
//! non-blocking.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A schema-typed handle onto one channel of an [`EventBus`].
pub struct ChannelKey<T> {
    name: &'static str,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> ChannelKey<T> {
    /// Create a new channel key named `name`.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: std::marker::PhantomData,
        }
    }

    /// The channel's string name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ChannelKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for ChannelKey<T> {}

type Listener = Arc<dyn Fn(&Value) + Send + Sync>;
type AllListener = Arc<dyn Fn(&str, &Value) + Send + Sync>;

/// Named-channel event bus with per-channel retained state.
#[derive(Default)]
pub struct EventBus {
    state: RwLock<HashMap<String, Value>>,
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
    all_listeners: RwLock<Vec<AllListener>>,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one channel. `cb` is invoked synchronously, in
    /// subscription order relative to other `on` calls on the same
    /// channel, each time [`EventBus::emit`] or [`EventBus::update`] is
    /// called on that channel.
    pub fn on<T, F>(&self, key: ChannelKey<T>, cb: F)
    where
        T: DeserializeOwned,
        F: Fn(T) + Send + Sync + 'static,
    {
        let wrapped: Listener = Arc::new(move |value: &Value| {
            if let Ok(typed) = serde_json::from_value(value.clone()) {
                cb(typed);
            }
        });
        self.listeners
            .write()
            .entry(key.name().to_string())
            .or_default()
            .push(wrapped);
    }

    /// Subscribe to every channel. `cb` receives the channel name and the
    /// raw JSON payload, since a single callback cannot be generic over
    /// every channel's payload type.
    pub fn on_all<F>(&self, cb: F)
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        self.all_listeners.write().push(Arc::new(cb));
    }

    /// Emit `payload` on `channel`: retains it as the channel's state, then
    /// synchronously notifies subscribers.
    pub fn emit<T: Serialize>(&self, key: ChannelKey<T>, payload: T) {
        let Ok(json) = serde_json::to_value(payload) else {
            return;
        };
        self.publish(key.name(), json);
    }

    /// Functional update of a channel's retained state: `v' = f(v)`, then
    /// notify subscribers with the new value exactly as [`EventBus::emit`]
    /// would.
    pub fn update<T, F>(&self, key: ChannelKey<T>, f: F)
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(Option<T>) -> T,
    {
        let current = self.get_state(key);
        self.emit(key, f(current));
    }

    fn publish(&self, channel: &str, json: Value) {
        self.state.write().insert(channel.to_string(), json.clone());

        let per_channel = self.listeners.read().get(channel).cloned().unwrap_or_default();
        for listener in per_channel {
            listener(&json);
        }

        let all = self.all_listeners.read().clone();
        for listener in all {
            listener(channel, &json);
        }
    }

    /// Fetch the current retained state of `key`, if any and deserializable.
    #[must_use]
    pub fn get_state<T: DeserializeOwned>(&self, key: ChannelKey<T>) -> Option<T> {
        self.state
            .read()
            .get(key.name())
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// Snapshot every channel's retained state as a JSON object.
    #[must_use]
    pub fn get_all_state(&self) -> Map<String, Value> {
        self.state.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Restore retained channel state from a previous [`EventBus::get_all_state`]
    /// snapshot. Does **not** notify subscribers — this is a silent resume,
    /// not a replay.
    pub fn set_all_state(&self, snapshot: Map<String, Value>) {
        let mut state = self.state.write();
        state.clear();
        for (k, v) in snapshot {
            state.insert(k, v);
        }
    }
}
