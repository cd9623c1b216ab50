use crate::announce;
use crate::errors::ActionError;
use crate::events::{AnnouncementKind, OfferedAction, TableEvent};
use crate::requests::{ActorId, ChannelKey, GameId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use xidach_engine::cards::Card;
use xidach_engine::dealer::play_dealer_turn;
use xidach_engine::deck::{Deck, RandomSource};
use xidach_engine::hand::{Decision, Hand};
use xidach_engine::resolver::{resolve, Seat, Settlement};
use xidach_engine::scoring::{SpecialHand, FIVE_CARD_HAND};

/// Cards each player receives on their first draw, and the dealer at the deal.
const OPENING_CARDS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Lobby,
    Voting,
    Dealing,
    PlayerTurns,
    DealerTurn,
    Settlement,
    Closed,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Lobby => "lobby",
            SessionState::Voting => "voting",
            SessionState::Dealing => "dealing",
            SessionState::PlayerTurns => "player_turns",
            SessionState::DealerTurn => "dealer_turn",
            SessionState::Settlement => "settlement",
            SessionState::Closed => "closed",
        }
    }

    fn accepts_players(self) -> bool {
        matches!(self, SessionState::Lobby | SessionState::Voting)
    }
}

/// One game table bound to a chat channel.
///
/// All mutable state, the deck and the shuffle source included, sits behind
/// a single mutex. Each action validates and mutates a copy of the game and
/// commits it only on success, so a rejected action never leaves a trace.
/// The returned events are meant to be published after the call returns,
/// i.e. outside the lock.
pub struct Session {
    channel: ChannelKey,
    max_participants: usize,
    table: Mutex<Table>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("channel", &self.channel)
            .field("max_participants", &self.max_participants)
            .finish()
    }
}

struct Table {
    shuffle: Box<dyn RandomSource>,
    game: Game,
}

#[derive(Debug, Clone)]
struct Game {
    state: SessionState,
    participants: Vec<ActorId>,
    votes: Vec<ActorId>,
    hands: HashMap<ActorId, Hand>,
    decisions: HashMap<ActorId, Decision>,
    dealer: Hand,
    dealer_decision: Decision,
    game_id: Option<GameId>,
    deck: Deck,
    settlement: Option<Settlement>,
    settled_game: Option<GameId>,
    dealer_turns: u32,
}

/// Read-only copy of a session, safe to hold after the lock is released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub channel: ChannelKey,
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<GameId>,
    pub participants: Vec<ActorId>,
    pub votes: Vec<ActorId>,
    pub hands: Vec<HandSnapshot>,
    pub dealer: HandSnapshot,
    pub deck_remaining: Vec<Card>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<Settlement>,
    pub dealer_turns: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandSnapshot {
    pub seat: Seat,
    pub cards: Vec<Card>,
    pub score: u32,
    pub decision: Decision,
}

impl SessionSnapshot {
    pub fn hand(&self, actor: ActorId) -> Option<&HandSnapshot> {
        self.hands.iter().find(|h| h.seat == Seat::Player(actor))
    }

    /// Every card currently dealt, players first, then the dealer.
    pub fn dealt_cards(&self) -> impl Iterator<Item = &Card> {
        self.hands
            .iter()
            .flat_map(|h| h.cards.iter())
            .chain(self.dealer.cards.iter())
    }
}

impl Session {
    pub fn new(
        channel: ChannelKey,
        max_participants: usize,
        shuffle: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            channel,
            max_participants,
            table: Mutex::new(Table {
                shuffle,
                game: Game::new(),
            }),
        }
    }

    pub fn channel(&self) -> ChannelKey {
        self.channel
    }

    pub fn lobby_view(&self) -> Result<TableEvent, ActionError> {
        let table = self.table.lock().map_err(|_| ActionError::StoragePoisoned)?;
        Ok(table.game.lobby_view(self.channel, self.max_participants))
    }

    pub fn join(&self, actor: ActorId) -> Result<Vec<TableEvent>, ActionError> {
        let (channel, max) = (self.channel, self.max_participants);
        self.transact(|game, _| game.join(channel, max, actor))
    }

    pub fn vote_start(&self, actor: ActorId) -> Result<Vec<TableEvent>, ActionError> {
        let (channel, max) = (self.channel, self.max_participants);
        self.transact(|game, shuffle| game.vote_start(channel, max, actor, shuffle))
    }

    pub fn draw(
        &self,
        caller: ActorId,
        actor: ActorId,
        game_id: GameId,
    ) -> Result<Vec<TableEvent>, ActionError> {
        let channel = self.channel;
        self.transact(|game, _| game.draw(channel, caller, actor, game_id))
    }

    pub fn hit(
        &self,
        caller: ActorId,
        actor: ActorId,
        game_id: GameId,
    ) -> Result<Vec<TableEvent>, ActionError> {
        let channel = self.channel;
        self.transact(|game, _| game.hit(channel, caller, actor, game_id))
    }

    pub fn stand(
        &self,
        caller: ActorId,
        actor: ActorId,
        game_id: GameId,
    ) -> Result<Vec<TableEvent>, ActionError> {
        let channel = self.channel;
        self.transact(|game, _| game.stand(channel, caller, actor, game_id))
    }

    pub fn state(&self) -> Result<SessionState, ActionError> {
        let table = self.table.lock().map_err(|_| ActionError::StoragePoisoned)?;
        Ok(table.game.state)
    }

    pub fn game_id(&self) -> Result<Option<GameId>, ActionError> {
        let table = self.table.lock().map_err(|_| ActionError::StoragePoisoned)?;
        Ok(table.game.game_id)
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot, ActionError> {
        let table = self.table.lock().map_err(|_| ActionError::StoragePoisoned)?;
        Ok(table.game.snapshot(self.channel))
    }

    fn transact<F>(&self, op: F) -> Result<Vec<TableEvent>, ActionError>
    where
        F: FnOnce(&mut Game, &mut dyn RandomSource) -> Result<Vec<TableEvent>, ActionError>,
    {
        let mut table = self.table.lock().map_err(|_| ActionError::StoragePoisoned)?;
        let Table { shuffle, game } = &mut *table;
        let mut next = game.clone();
        let events = op(&mut next, shuffle.as_mut())?;
        *game = next;
        Ok(events)
    }
}

impl Game {
    fn new() -> Self {
        Self {
            state: SessionState::Lobby,
            participants: Vec::new(),
            votes: Vec::new(),
            hands: HashMap::new(),
            decisions: HashMap::new(),
            dealer: Hand::new(),
            dealer_decision: Decision::Pending,
            game_id: None,
            deck: Deck::new(),
            settlement: None,
            settled_game: None,
            dealer_turns: 0,
        }
    }

    fn lobby_view(&self, channel: ChannelKey, max: usize) -> TableEvent {
        let open = self.state.accepts_players();
        TableEvent::LobbyView {
            channel,
            participant_count: self.participants.len(),
            vote_count: self.votes.len(),
            joinable: open && self.participants.len() < max,
            startable: open && !self.participants.is_empty(),
        }
    }

    fn join(
        &mut self,
        channel: ChannelKey,
        max: usize,
        actor: ActorId,
    ) -> Result<Vec<TableEvent>, ActionError> {
        if !self.state.accepts_players() {
            return Err(ActionError::WrongPhase(self.state.as_str()));
        }
        if !self.participants.contains(&actor) {
            if self.participants.len() >= max {
                return Err(ActionError::LobbyFull { max });
            }
            self.participants.push(actor);
            self.state = SessionState::Voting;
            tracing::debug!(
                channel,
                actor,
                participants = self.participants.len(),
                "player joined"
            );
        }
        Ok(vec![self.lobby_view(channel, max)])
    }

    fn vote_start(
        &mut self,
        channel: ChannelKey,
        max: usize,
        actor: ActorId,
        shuffle: &mut dyn RandomSource,
    ) -> Result<Vec<TableEvent>, ActionError> {
        if !self.participants.contains(&actor) {
            return Err(ActionError::NotParticipant);
        }
        if !self.state.accepts_players() {
            return Err(ActionError::WrongPhase(self.state.as_str()));
        }
        if !self.votes.contains(&actor) {
            self.votes.push(actor);
        }
        tracing::debug!(
            channel,
            actor,
            votes = self.votes.len(),
            participants = self.participants.len(),
            "start vote recorded"
        );

        if self.votes.len() < self.participants.len() {
            return Ok(vec![self.lobby_view(channel, max)]);
        }

        self.state = SessionState::Dealing;
        let mut events = vec![self.lobby_view(channel, max)];
        events.extend(self.deal(channel, shuffle)?);
        Ok(events)
    }

    fn deal(
        &mut self,
        channel: ChannelKey,
        shuffle: &mut dyn RandomSource,
    ) -> Result<Vec<TableEvent>, ActionError> {
        let game_id = GameId::new();
        self.game_id = Some(game_id);
        self.deck = Deck::new();
        self.deck.shuffle(shuffle);
        self.hands = self
            .participants
            .iter()
            .map(|&actor| (actor, Hand::new()))
            .collect();
        self.decisions = self
            .participants
            .iter()
            .map(|&actor| (actor, Decision::Pending))
            .collect();
        self.dealer = Hand::new();
        self.dealer.draw_from(&mut self.deck, OPENING_CARDS)?;
        self.dealer_decision = Decision::Pending;
        self.settlement = None;

        tracing::info!(
            channel,
            game_id = %game_id,
            participants = self.participants.len(),
            "game dealt"
        );

        if let Some(special) = self.dealer.special() {
            self.dealer_decision = Decision::Stood;
            tracing::info!(channel, game_id = %game_id, hand = %special, "dealer opened with a special hand");
            let mut events = vec![TableEvent::PublicAnnouncement {
                channel,
                kind: AnnouncementKind::DealerInstantWin,
                text: announce::dealer_instant_win(special),
            }];
            events.extend(self.dealer_turn_and_settle(channel, game_id)?);
            return Ok(events);
        }

        self.state = SessionState::PlayerTurns;
        let mut events: Vec<TableEvent> = self
            .participants
            .iter()
            .map(|&actor| TableEvent::PrivateHandView {
                channel,
                actor,
                game_id,
                cards: Vec::new(),
                score: 0,
                offered_actions: vec![OfferedAction::Draw],
                note: Some("Press Draw to get your cards.".to_string()),
            })
            .collect();
        events.push(TableEvent::PublicAnnouncement {
            channel,
            kind: AnnouncementKind::DealerReveal,
            text: announce::dealer_reveal(self.dealer.cards(), self.dealer.score()),
        });
        Ok(events)
    }

    /// Checks shared by draw, hit and stand, in the order they are reported.
    fn check_hand_action(
        &self,
        caller: ActorId,
        actor: ActorId,
        game_id: GameId,
    ) -> Result<GameId, ActionError> {
        let current = self
            .game_id
            .filter(|current| *current == game_id)
            .ok_or(ActionError::GameIdMismatch)?;
        if caller != actor {
            return Err(ActionError::ActorMismatch);
        }
        if !self.participants.contains(&actor) {
            return Err(ActionError::NotParticipant);
        }
        if self.state != SessionState::PlayerTurns {
            return Err(ActionError::WrongPhase(self.state.as_str()));
        }
        Ok(current)
    }

    fn draw(
        &mut self,
        channel: ChannelKey,
        caller: ActorId,
        actor: ActorId,
        game_id: GameId,
    ) -> Result<Vec<TableEvent>, ActionError> {
        let game_id = self.check_hand_action(caller, actor, game_id)?;
        let mut note = None;

        let hand = self.hands.entry(actor).or_default();
        if hand.is_empty() {
            if self.deck.remaining() < OPENING_CARDS {
                return Err(ActionError::DeckExhausted);
            }
            hand.draw_from(&mut self.deck, OPENING_CARDS)?;
            tracing::debug!(channel, game_id = %game_id, actor, score = hand.score(), "opening cards drawn");

            if let Some(special) = hand.special() {
                self.decisions.insert(actor, Decision::Stood);
                note = Some(announce::player_instant_win(special));
                tracing::info!(channel, game_id = %game_id, actor, hand = %special, "player opened with a special hand");
            }
        }

        let mut events = vec![self.hand_view(channel, game_id, actor, note)];
        events.extend(self.finish_if_all_stood(channel, game_id)?);
        Ok(events)
    }

    fn hit(
        &mut self,
        channel: ChannelKey,
        caller: ActorId,
        actor: ActorId,
        game_id: GameId,
    ) -> Result<Vec<TableEvent>, ActionError> {
        let game_id = self.check_hand_action(caller, actor, game_id)?;
        self.check_open_hand(actor)?;

        let hand = self.hands.entry(actor).or_default();
        if hand.len() >= FIVE_CARD_HAND {
            return Err(ActionError::HandFull);
        }
        hand.push(self.deck.draw()?);
        tracing::debug!(channel, game_id = %game_id, actor, cards = hand.len(), score = hand.score(), "hit");

        let mut note = None;
        if hand.special() == Some(SpecialHand::FiveCard) {
            self.decisions.insert(actor, Decision::Stood);
            note = Some(announce::player_instant_win(SpecialHand::FiveCard));
            tracing::info!(channel, game_id = %game_id, actor, "player reached Ngũ Linh");
        }

        let mut events = vec![self.hand_view(channel, game_id, actor, note)];
        events.extend(self.finish_if_all_stood(channel, game_id)?);
        Ok(events)
    }

    fn stand(
        &mut self,
        channel: ChannelKey,
        caller: ActorId,
        actor: ActorId,
        game_id: GameId,
    ) -> Result<Vec<TableEvent>, ActionError> {
        let game_id = self.check_hand_action(caller, actor, game_id)?;
        self.check_open_hand(actor)?;

        self.decisions.insert(actor, Decision::Stood);
        tracing::debug!(channel, game_id = %game_id, actor, "stood");

        let note = Some("You stood. Wait for the results.".to_string());
        let mut events = vec![self.hand_view(channel, game_id, actor, note)];
        events.extend(self.finish_if_all_stood(channel, game_id)?);
        Ok(events)
    }

    fn check_open_hand(&self, actor: ActorId) -> Result<(), ActionError> {
        if self.hands.get(&actor).is_none_or(Hand::is_empty) {
            return Err(ActionError::HandNotReady);
        }
        if self.decision(actor) == Decision::Stood {
            return Err(ActionError::AlreadyStood);
        }
        Ok(())
    }

    fn decision(&self, actor: ActorId) -> Decision {
        self.decisions.get(&actor).copied().unwrap_or_default()
    }

    /// Moves to the dealer's turn once every participant stood. The state
    /// check makes this run at most once per game, whichever action gets
    /// here last.
    fn finish_if_all_stood(
        &mut self,
        channel: ChannelKey,
        game_id: GameId,
    ) -> Result<Vec<TableEvent>, ActionError> {
        if self.state != SessionState::PlayerTurns {
            return Ok(Vec::new());
        }
        let all_stood = self
            .participants
            .iter()
            .all(|actor| self.decision(*actor) == Decision::Stood);
        if !all_stood {
            return Ok(Vec::new());
        }
        self.dealer_turn_and_settle(channel, game_id)
    }

    fn dealer_turn_and_settle(
        &mut self,
        channel: ChannelKey,
        game_id: GameId,
    ) -> Result<Vec<TableEvent>, ActionError> {
        if self.settled_game == Some(game_id) {
            return Ok(Vec::new());
        }
        self.settled_game = Some(game_id);
        self.state = SessionState::DealerTurn;
        self.dealer_turns += 1;
        let drawn = play_dealer_turn(&mut self.dealer, &mut self.deck)?;
        self.dealer_decision = Decision::Stood;
        tracing::info!(
            channel,
            game_id = %game_id,
            drawn,
            score = self.dealer.score(),
            "dealer turn finished"
        );

        let mut events = Vec::new();
        if drawn > 0 && self.dealer.special() == Some(SpecialHand::FiveCard) {
            events.push(TableEvent::PublicAnnouncement {
                channel,
                kind: AnnouncementKind::DealerInstantWin,
                text: announce::dealer_instant_win(SpecialHand::FiveCard),
            });
        }

        self.state = SessionState::Settlement;
        let empty = Hand::new();
        let settlement = resolve(
            self.participants
                .iter()
                .map(|actor| (Seat::Player(*actor), self.hands.get(actor).unwrap_or(&empty)))
                .chain(std::iter::once((Seat::Dealer, &self.dealer))),
        );
        tracing::info!(
            channel,
            game_id = %game_id,
            winner = ?settlement.winner,
            winning_score = ?settlement.winning_score,
            "game settled"
        );

        events.push(TableEvent::PublicAnnouncement {
            channel,
            kind: AnnouncementKind::Results,
            text: announce::results(game_id, &settlement),
        });
        self.settlement = Some(settlement);
        self.state = SessionState::Closed;
        Ok(events)
    }

    fn hand_view(
        &self,
        channel: ChannelKey,
        game_id: GameId,
        actor: ActorId,
        note: Option<String>,
    ) -> TableEvent {
        let (cards, score) = self
            .hands
            .get(&actor)
            .map(|hand| (hand.cards().to_vec(), hand.score()))
            .unwrap_or_default();
        let offered_actions = if self.decision(actor) == Decision::Stood {
            Vec::new()
        } else if cards.len() >= FIVE_CARD_HAND {
            vec![OfferedAction::Stand]
        } else {
            vec![OfferedAction::Hit, OfferedAction::Stand]
        };
        TableEvent::PrivateHandView {
            channel,
            actor,
            game_id,
            cards,
            score,
            offered_actions,
            note,
        }
    }

    fn snapshot(&self, channel: ChannelKey) -> SessionSnapshot {
        let hands = self
            .participants
            .iter()
            .map(|actor| {
                let hand = self.hands.get(actor).cloned().unwrap_or_default();
                HandSnapshot {
                    seat: Seat::Player(*actor),
                    score: hand.score(),
                    cards: hand.cards().to_vec(),
                    decision: self.decision(*actor),
                }
            })
            .collect();
        SessionSnapshot {
            channel,
            state: self.state,
            game_id: self.game_id,
            participants: self.participants.clone(),
            votes: self.votes.clone(),
            hands,
            dealer: HandSnapshot {
                seat: Seat::Dealer,
                cards: self.dealer.cards().to_vec(),
                score: self.dealer.score(),
                decision: self.dealer_decision,
            },
            deck_remaining: if self.game_id.is_some() {
                self.deck.remaining_cards().to_vec()
            } else {
                Vec::new()
            },
            settlement: self.settlement.clone(),
            dealer_turns: self.dealer_turns,
        }
    }
}
