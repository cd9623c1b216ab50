use crate::errors::Rejection;
use crate::requests::{ActorId, ChannelKey, GameId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use xidach_engine::cards::Card;

// A subscriber whose buffer fills up is dropped, never awaited.
const EVENT_CHANNEL_BUFFER: usize = 256;

pub type EventSender = mpsc::Sender<TableEvent>;
pub type EventReceiver = mpsc::Receiver<TableEvent>;

pub struct EventSubscription {
    bus: EventBus,
    channel: ChannelKey,
    subscriber_id: usize,
    pub receiver: EventReceiver,
}

impl EventSubscription {
    pub fn receiver(&mut self) -> &mut EventReceiver {
        &mut self.receiver
    }

    /// Everything delivered so far, without waiting.
    pub fn drain(&mut self) -> Vec<TableEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.channel, self.subscriber_id);
    }
}

/// Fan-out of view updates to whatever renders each channel.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

#[derive(Debug, Default)]
struct EventBusInner {
    subscribers: RwLock<HashMap<ChannelKey, Vec<(usize, EventSender)>>>,
    next_id: AtomicUsize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, channel: ChannelKey) -> EventSubscription {
        let (subscriber_id, receiver) = self.subscribe_raw(channel);
        EventSubscription {
            bus: self.clone(),
            channel,
            subscriber_id,
            receiver,
        }
    }

    fn subscribe_raw(&self, channel: ChannelKey) -> (usize, EventReceiver) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_BUFFER);
        let id = self.inner.next_id.fetch_add(1, Ordering::AcqRel);
        match self.inner.subscribers.write() {
            Ok(mut guard) => guard.entry(channel).or_default().push((id, tx)),
            Err(poisoned) => poisoned.into_inner().entry(channel).or_default().push((id, tx)),
        }

        tracing::info!(channel, subscriber_id = id, "transport subscribed to table events");

        (id, rx)
    }

    pub fn broadcast(&self, channel: ChannelKey, event: TableEvent) {
        tracing::debug!(channel, event = event.kind(), "broadcasting table event");

        let subscribers = match self.inner.subscribers.read() {
            Ok(guard) => guard.get(&channel).cloned(),
            Err(poisoned) => poisoned.into_inner().get(&channel).cloned(),
        };

        let Some(list) = subscribers else {
            tracing::trace!(channel, "no subscribers for channel");
            return;
        };

        let mut failed = Vec::new();
        for (id, sender) in list {
            if let Err(e) = sender.try_send(event.clone()) {
                tracing::warn!(
                    channel,
                    subscriber_id = id,
                    error = %e,
                    "failed to deliver table event, dropping subscriber"
                );
                failed.push(id);
            }
        }
        if !failed.is_empty() {
            self.remove_subscribers(channel, &failed);
        }
    }

    pub fn broadcast_all(&self, channel: ChannelKey, events: &[TableEvent]) {
        for event in events {
            self.broadcast(channel, event.clone());
        }
    }

    pub fn unsubscribe(&self, channel: ChannelKey, subscriber_id: usize) {
        self.remove_subscribers(channel, &[subscriber_id]);
    }

    pub fn subscriber_count(&self) -> usize {
        match self.inner.subscribers.read() {
            Ok(guard) => guard.values().map(|list| list.len()).sum(),
            Err(poisoned) => poisoned.into_inner().values().map(|list| list.len()).sum(),
        }
    }

    fn remove_subscribers(&self, channel: ChannelKey, ids: &[usize]) {
        let mut guard = match self.inner.subscribers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(list) = guard.get_mut(&channel) {
            list.retain(|(id, _)| !ids.contains(id));
            if list.is_empty() {
                guard.remove(&channel);
            }
        }
    }
}

/// Buttons the transport should offer next to a private hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferedAction {
    Draw,
    Hit,
    Stand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementKind {
    /// Dealer's opening cards, shown when players start drawing.
    DealerReveal,
    /// Dealer opened with Xì Bàng or Xì Dách; no one gets to play.
    DealerInstantWin,
    /// Final hands and the winner.
    Results,
}

/// View updates produced by the table for the transport to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableEvent {
    LobbyView {
        channel: ChannelKey,
        participant_count: usize,
        vote_count: usize,
        joinable: bool,
        startable: bool,
    },
    /// Only `actor` should see this.
    PrivateHandView {
        channel: ChannelKey,
        actor: ActorId,
        game_id: GameId,
        cards: Vec<Card>,
        score: u32,
        offered_actions: Vec<OfferedAction>,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    PublicAnnouncement {
        channel: ChannelKey,
        kind: AnnouncementKind,
        text: String,
    },
    /// Only `actor` should see this.
    ActionRejected {
        channel: ChannelKey,
        actor: ActorId,
        rejection: Rejection,
    },
}

impl TableEvent {
    pub fn channel(&self) -> ChannelKey {
        match self {
            TableEvent::LobbyView { channel, .. }
            | TableEvent::PrivateHandView { channel, .. }
            | TableEvent::PublicAnnouncement { channel, .. }
            | TableEvent::ActionRejected { channel, .. } => *channel,
        }
    }

    /// The single actor an event is addressed to, or `None` for public events.
    pub fn recipient(&self) -> Option<ActorId> {
        match self {
            TableEvent::PrivateHandView { actor, .. } | TableEvent::ActionRejected { actor, .. } => {
                Some(*actor)
            }
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TableEvent::LobbyView { .. } => "lobby_view",
            TableEvent::PrivateHandView { .. } => "private_hand_view",
            TableEvent::PublicAnnouncement { .. } => "public_announcement",
            TableEvent::ActionRejected { .. } => "action_rejected",
        }
    }

    pub fn is_announcement(&self, wanted: AnnouncementKind) -> bool {
        matches!(self, TableEvent::PublicAnnouncement { kind, .. } if *kind == wanted)
    }
}
