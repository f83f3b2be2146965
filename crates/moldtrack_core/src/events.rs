//! In-process change notifications.
//!
//! # Responsibility
//! - Carry search, selection, reload and asset-change notifications from
//!   services to whatever front end is attached.
//!
//! # Invariants
//! - Listeners run synchronously, in registration order.
//! - Listener ids are never reused within one bus.

use crate::model::asset::AssetKey;
use log::debug;
use serde::Serialize;
use std::fmt::{Debug, Formatter};

/// Kind of state change recorded against an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Location,
    Status,
    Shipment,
    Comment,
    Teflon,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::Status => "status",
            Self::Shipment => "shipment",
            Self::Comment => "comment",
            Self::Teflon => "teflon",
        }
    }
}

/// Notification emitted by services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InventoryEvent {
    /// A search completed; `results` keeps result order.
    SearchUpdated {
        query: String,
        results: Vec<AssetKey>,
    },
    SelectionChanged {
        selected: Option<AssetKey>,
    },
    CatalogReloaded {
        molds: usize,
        cutters: usize,
    },
    AssetChanged {
        key: AssetKey,
        change: ChangeKind,
    },
}

impl InventoryEvent {
    /// Stable event name, matching the `key=value` log vocabulary.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SearchUpdated { .. } => "search_updated",
            Self::SelectionChanged { .. } => "selection_changed",
            Self::CatalogReloaded { .. } => "catalog_reloaded",
            Self::AssetChanged { .. } => "asset_changed",
        }
    }
}

pub type ListenerId = u64;

type Listener = Box<dyn FnMut(&InventoryEvent)>;

/// Synchronous listener registry.
#[derive(Default)]
pub struct EventBus {
    next_id: ListenerId,
    listeners: Vec<(ListenerId, Listener)>,
}

impl Debug for EventBus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&InventoryEvent) + 'static) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener; returns `false` for unknown ids.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: &InventoryEvent) {
        debug!(
            "event=bus_emit module=events name={} listeners={}",
            event.name(),
            self.listeners.len()
        );
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBus, InventoryEvent};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn listeners_run_in_order_and_can_unsubscribe() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let first = {
            let seen = Rc::clone(&seen);
            bus.subscribe(move |event| seen.borrow_mut().push(format!("a:{}", event.name())))
        };
        {
            let seen = Rc::clone(&seen);
            bus.subscribe(move |event| seen.borrow_mut().push(format!("b:{}", event.name())));
        }

        bus.emit(&InventoryEvent::SelectionChanged { selected: None });
        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        bus.emit(&InventoryEvent::CatalogReloaded {
            molds: 0,
            cutters: 0,
        });

        assert_eq!(
            *seen.borrow(),
            vec![
                "a:selection_changed".to_string(),
                "b:selection_changed".to_string(),
                "b:catalog_reloaded".to_string(),
            ]
        );
    }
}
