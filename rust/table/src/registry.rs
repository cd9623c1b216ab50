use crate::errors::{ActionError, IntoRejection};
use crate::events::{EventBus, TableEvent};
use crate::requests::{ActorId, ChannelKey, TableAction, TableRequest};
use crate::session::Session;
use crate::settings::TableSettings;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use xidach_engine::deck::{RandomSource, SeededShuffle};

/// Builds the shuffle source for each new table.
pub type ShuffleFactory = Arc<dyn Fn() -> Box<dyn RandomSource> + Send + Sync>;

/// Owns every table, one per channel, and is the only way in for the
/// chat transport.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<ChannelKey, Arc<Session>>>,
    event_bus: EventBus,
    settings: TableSettings,
    shuffle_factory: ShuffleFactory,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("settings", &self.settings)
            .field("sessions", &self.session_count())
            .finish()
    }
}

impl SessionRegistry {
    /// Tables shuffle with ChaCha20. A configured seed makes the n-th table
    /// created by this registry use `seed + n`, so a whole run can be
    /// replayed; without one each table draws a fresh seed.
    pub fn new(settings: TableSettings) -> Self {
        let factory: ShuffleFactory = match settings.seed {
            Some(base) => {
                let games = AtomicU64::new(0);
                Arc::new(move || {
                    let seed = base.wrapping_add(games.fetch_add(1, Ordering::Relaxed));
                    tracing::info!(seed, "seeded shuffle");
                    Box::new(SeededShuffle::new(seed)) as Box<dyn RandomSource>
                })
            }
            None => Arc::new(|| {
                let shuffle = SeededShuffle::from_entropy();
                tracing::info!(seed = shuffle.seed(), "random shuffle");
                Box::new(shuffle) as Box<dyn RandomSource>
            }),
        };
        Self::with_shuffle(settings, factory)
    }

    pub fn with_shuffle(settings: TableSettings, shuffle_factory: ShuffleFactory) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            event_bus: EventBus::new(),
            settings,
            shuffle_factory,
        }
    }

    pub fn settings(&self) -> &TableSettings {
        &self.settings
    }

    pub fn event_bus(&self) -> EventBus {
        self.event_bus.clone()
    }

    /// Open a fresh lobby in `channel`, discarding whatever table was there.
    pub fn new_game(&self, channel: ChannelKey) -> Result<Arc<Session>, ActionError> {
        let session = Arc::new(Session::new(
            channel,
            self.settings.max_participants,
            (self.shuffle_factory)(),
        ));

        let replaced = {
            let mut guard = self
                .sessions
                .write()
                .map_err(|_| ActionError::StoragePoisoned)?;
            guard.insert(channel, Arc::clone(&session)).is_some()
        };

        tracing::info!(channel, replaced, "session created");
        Ok(session)
    }

    pub fn lookup(&self, channel: ChannelKey) -> Option<Arc<Session>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&channel)
            .cloned()
    }

    pub fn session_count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn active_channels(&self) -> Vec<ChannelKey> {
        let mut channels: Vec<_> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        channels.sort_unstable();
        channels
    }

    /// Apply one request and publish what it produced.
    ///
    /// On success the events go to the channel's subscribers. On failure
    /// the caller alone gets an `ActionRejected`, and the error is returned
    /// as well. Publishing happens after the session lock is released.
    pub fn handle(&self, request: TableRequest) -> Result<Vec<TableEvent>, ActionError> {
        let TableRequest {
            channel,
            caller,
            action,
        } = request;
        tracing::debug!(channel, actor = caller, action = action.name(), "handling request");

        match self.dispatch(channel, caller, action) {
            Ok(events) => {
                self.event_bus.broadcast_all(channel, &events);
                Ok(events)
            }
            Err(err) => {
                let rejection = err.clone().into_logged_rejection(channel);
                self.event_bus.broadcast(
                    channel,
                    TableEvent::ActionRejected {
                        channel,
                        actor: caller,
                        rejection,
                    },
                );
                Err(err)
            }
        }
    }

    fn dispatch(
        &self,
        channel: ChannelKey,
        caller: ActorId,
        action: TableAction,
    ) -> Result<Vec<TableEvent>, ActionError> {
        match action {
            TableAction::NewGame => Ok(vec![self.new_game(channel)?.lobby_view()?]),
            TableAction::Join => self.session(channel)?.join(caller),
            TableAction::StartVote => self.session(channel)?.vote_start(caller),
            TableAction::Draw { actor, game_id } => {
                self.session(channel)?.draw(caller, actor, game_id)
            }
            TableAction::Hit { actor, game_id } => {
                self.session(channel)?.hit(caller, actor, game_id)
            }
            TableAction::Stand { actor, game_id } => {
                self.session(channel)?.stand(caller, actor, game_id)
            }
        }
    }

    fn session(&self, channel: ChannelKey) -> Result<Arc<Session>, ActionError> {
        self.lookup(channel)
            .ok_or(ActionError::SessionNotFound(channel))
    }
}
