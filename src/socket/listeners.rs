use crate::logger::*;
use dashmap::DashMap;
use serde_json::Value;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

pub type EventCallback = Arc<dyn Fn(&Value) + Send + Sync>;
pub type OpenCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone)]
enum ListenerKey {
    Event(String, u64),
    Open(u64),
}

/// Handle to one registration. Dropping it leaves the callback registered.
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<ListenerRegistry>,
    key: ListenerKey,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.key);
        }
    }
}

#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    events: DashMap<String, Vec<(u64, EventCallback)>>,
    opens: Mutex<Vec<(u64, OpenCallback)>>,
}

impl ListenerRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscribe(self: &Arc<Self>, event: String, callback: EventCallback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.events
            .entry(event.clone())
            .or_default()
            .push((id, callback));
        Subscription {
            registry: Arc::downgrade(self),
            key: ListenerKey::Event(event, id),
        }
    }

    pub fn on_open(self: &Arc<Self>, callback: OpenCallback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut opens) = self.opens.lock() {
            opens.push((id, callback));
        }
        Subscription {
            registry: Arc::downgrade(self),
            key: ListenerKey::Open(id),
        }
    }

    fn remove(&self, key: &ListenerKey) {
        match key {
            ListenerKey::Event(event, id) => {
                if let Some(mut callbacks) = self.events.get_mut(event) {
                    callbacks.retain(|(existing, _)| existing != id);
                }
                self.events.remove_if(event, |_, callbacks| callbacks.is_empty());
            }
            ListenerKey::Open(id) => {
                if let Ok(mut opens) = self.opens.lock() {
                    opens.retain(|(existing, _)| existing != id);
                }
            }
        }
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.events.get(event).map(|c| c.len()).unwrap_or(0)
    }

    /// Runs every callback registered for `event`, in registration order.
    pub fn dispatch(&self, event: &str, payload: &Value) {
        // snapshot first so callbacks may (un)subscribe without deadlocking
        let callbacks: Vec<EventCallback> = match self.events.get(event) {
            Some(entry) => entry.iter().map(|(_, cb)| cb.clone()).collect(),
            None => {
                trace!("no listeners for {}", event);
                return;
            }
        };

        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(payload))).is_err() {
                error!("listener for {} panicked", event);
            }
        }
    }

    pub fn notify_open(&self) {
        let callbacks: Vec<OpenCallback> = match self.opens.lock() {
            Ok(opens) => opens.iter().map(|(_, cb)| cb.clone()).collect(),
            Err(_) => return,
        };

        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                error!("open callback panicked");
            }
        }
    }
}
