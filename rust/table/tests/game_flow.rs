/// End-to-end games driven through the registry with stacked decks
use std::sync::Arc;
use xidach_engine::cards::{Card, Rank, Suit};
use xidach_engine::deck::{PresetOrder, RandomSource};
use xidach_engine::resolver::Seat;
use xidach_table::{
    ActorId, AnnouncementKind, GameId, OfferedAction, SessionRegistry, SessionState, TableAction,
    TableEvent, TableRequest, TableSettings,
};

const CHANNEL: u64 = 77;

fn card(rank: Rank, suit: Suit) -> Card {
    Card::new(rank, suit)
}

fn stacked_registry(top: Vec<Card>) -> SessionRegistry {
    SessionRegistry::with_shuffle(
        TableSettings::default(),
        Arc::new(move || Box::new(PresetOrder::new(top.clone())) as Box<dyn RandomSource>),
    )
}

fn send(registry: &SessionRegistry, caller: ActorId, action: TableAction) -> Vec<TableEvent> {
    registry
        .handle(TableRequest::new(CHANNEL, caller, action))
        .expect("request accepted")
}

/// Opens a table, seats `players` and collects every start vote. Returns the
/// events produced by the final vote.
fn seat_and_start(registry: &SessionRegistry, players: &[ActorId]) -> Vec<TableEvent> {
    send(registry, players[0], TableAction::NewGame);
    for &p in players {
        send(registry, p, TableAction::Join);
    }
    let mut last = Vec::new();
    for &p in players {
        last = send(registry, p, TableAction::StartVote);
    }
    last
}

fn current_game(registry: &SessionRegistry) -> GameId {
    registry
        .lookup(CHANNEL)
        .expect("table exists")
        .game_id()
        .expect("lock")
        .expect("game dealt")
}

fn announcement(events: &[TableEvent], kind: AnnouncementKind) -> Option<&str> {
    events.iter().find_map(|event| match event {
        TableEvent::PublicAnnouncement { kind: k, text, .. } if *k == kind => Some(text.as_str()),
        _ => None,
    })
}

#[test]
fn dealer_natural_ends_the_game_before_anyone_plays() {
    let registry = stacked_registry(vec![
        card(Rank::Ace, Suit::Spades),
        card(Rank::King, Suit::Spades),
    ]);
    let mut sub = registry.event_bus().subscribe(CHANNEL);

    let events = seat_and_start(&registry, &[1, 2]);

    assert_eq!(
        announcement(&events, AnnouncementKind::DealerInstantWin),
        Some("Dealer (bot) wins immediately with Xì Dách!")
    );
    assert!(announcement(&events, AnnouncementKind::Results).is_some());
    assert!(announcement(&events, AnnouncementKind::DealerReveal).is_none());
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, TableEvent::PrivateHandView { .. }))
    );

    let snapshot = registry.lookup(CHANNEL).unwrap().snapshot().unwrap();
    assert_eq!(snapshot.state, SessionState::Closed);
    let settlement = snapshot.settlement.expect("settled");
    assert_eq!(settlement.winner, Some(Seat::Dealer));
    assert_eq!(settlement.winning_score, Some(21));

    // the subscriber saw the same results once
    let published = sub.drain();
    let results = published
        .iter()
        .filter(|e| e.is_announcement(AnnouncementKind::Results))
        .count();
    assert_eq!(results, 1);
}

#[test]
fn player_nineteen_beats_dealer_fifteen() {
    let registry = stacked_registry(vec![
        card(Rank::Seven, Suit::Clubs),
        card(Rank::Eight, Suit::Clubs),
        card(Rank::Nine, Suit::Spades),
        card(Rank::Nine, Suit::Hearts),
        card(Rank::Ace, Suit::Diamonds),
    ]);

    let events = seat_and_start(&registry, &[1]);
    assert_eq!(
        announcement(&events, AnnouncementKind::DealerReveal),
        Some("Dealer (bot): 7♣, 8♣ (total: 15)")
    );
    let opening = events
        .iter()
        .find(|e| e.recipient() == Some(1))
        .expect("private view for the player");
    match opening {
        TableEvent::PrivateHandView {
            cards,
            offered_actions,
            ..
        } => {
            assert!(cards.is_empty());
            assert_eq!(offered_actions, &vec![OfferedAction::Draw]);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    let game_id = current_game(&registry);
    send(&registry, 1, TableAction::Draw { actor: 1, game_id });
    let hit = send(&registry, 1, TableAction::Hit { actor: 1, game_id });
    match &hit[0] {
        TableEvent::PrivateHandView { score, cards, .. } => {
            assert_eq!(cards.len(), 3);
            assert_eq!(*score, 19);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    let stand = send(&registry, 1, TableAction::Stand { actor: 1, game_id });
    let results = announcement(&stand, AnnouncementKind::Results).expect("results");
    assert!(results.ends_with("Winner: <@1> with 19!"), "{results}");

    let snapshot = registry.lookup(CHANNEL).unwrap().snapshot().unwrap();
    assert_eq!(snapshot.dealer.cards.len(), 2, "dealer stands on 15");
    let settlement = snapshot.settlement.unwrap();
    assert_eq!(settlement.winner, Some(Seat::Player(1)));
    assert_eq!(settlement.winning_score, Some(19));
}

#[test]
fn player_on_fifteen_is_excluded_and_busted_dealer_leaves_no_winner() {
    let registry = stacked_registry(vec![
        card(Rank::Ten, Suit::Clubs),
        card(Rank::Two, Suit::Clubs),
        card(Rank::Ten, Suit::Spades),
        card(Rank::Five, Suit::Spades),
        card(Rank::King, Suit::Diamonds),
    ]);
    seat_and_start(&registry, &[1]);
    let game_id = current_game(&registry);

    send(&registry, 1, TableAction::Draw { actor: 1, game_id });
    let stand = send(&registry, 1, TableAction::Stand { actor: 1, game_id });

    let results = announcement(&stand, AnnouncementKind::Results).expect("results");
    assert!(results.contains("<@1>: 10♠, 5♠ (total: 15) - below 16, not counted"));
    assert!(results.contains("Dealer (bot): 10♣, 2♣, K♦ (total: 22)"));

    let settlement = registry
        .lookup(CHANNEL)
        .unwrap()
        .snapshot()
        .unwrap()
        .settlement
        .unwrap();
    assert_eq!(settlement.winner, None);
    assert_eq!(settlement.winning_score, None);
}

#[test]
fn dealer_five_card_hand_is_announced_even_below_the_floor() {
    let registry = stacked_registry(vec![
        card(Rank::Two, Suit::Clubs),
        card(Rank::Three, Suit::Clubs),
        card(Rank::Ten, Suit::Spades),
        card(Rank::Five, Suit::Spades),
        card(Rank::Two, Suit::Diamonds),
        card(Rank::Two, Suit::Hearts),
        card(Rank::Three, Suit::Diamonds),
    ]);
    seat_and_start(&registry, &[1]);
    let game_id = current_game(&registry);

    send(&registry, 1, TableAction::Draw { actor: 1, game_id });
    let stand = send(&registry, 1, TableAction::Stand { actor: 1, game_id });

    assert_eq!(
        announcement(&stand, AnnouncementKind::DealerInstantWin),
        Some("Dealer (bot) wins immediately with Ngũ Linh!")
    );
    let snapshot = registry.lookup(CHANNEL).unwrap().snapshot().unwrap();
    assert_eq!(snapshot.dealer.cards.len(), 5);
    assert_eq!(snapshot.dealer.score, 12);
    // 12 is under the dealer's floor, so the settlement has no winner
    assert_eq!(snapshot.settlement.unwrap().winner, None);
    assert!(
        announcement(&stand, AnnouncementKind::Results)
            .unwrap()
            .contains("nobody wins")
    );
}

#[test]
fn five_card_player_wins_over_dealer() {
    let registry = stacked_registry(vec![
        card(Rank::King, Suit::Diamonds),
        card(Rank::Nine, Suit::Diamonds),
        card(Rank::Two, Suit::Clubs),
        card(Rank::Three, Suit::Clubs),
        card(Rank::Four, Suit::Clubs),
        card(Rank::Five, Suit::Clubs),
        card(Rank::Six, Suit::Clubs),
    ]);
    seat_and_start(&registry, &[1]);
    let game_id = current_game(&registry);

    send(&registry, 1, TableAction::Draw { actor: 1, game_id });
    send(&registry, 1, TableAction::Hit { actor: 1, game_id });
    send(&registry, 1, TableAction::Hit { actor: 1, game_id });
    // the fifth card stands the hand and, as the only player, settles the game
    let last = send(&registry, 1, TableAction::Hit { actor: 1, game_id });

    assert!(last.iter().any(|e| matches!(
        e,
        TableEvent::PrivateHandView { note: Some(note), .. } if note.contains("Ngũ Linh")
    )));
    let results = announcement(&last, AnnouncementKind::Results).expect("results");
    assert!(results.contains("[Ngũ Linh]"));
    assert!(results.ends_with("Winner: <@1> with 20!"));
}

#[test]
fn earlier_seat_keeps_a_tie() {
    let registry = stacked_registry(vec![
        card(Rank::Ten, Suit::Clubs),
        card(Rank::Six, Suit::Clubs),
        card(Rank::Ten, Suit::Spades),
        card(Rank::Eight, Suit::Spades),
        card(Rank::Ten, Suit::Hearts),
        card(Rank::Eight, Suit::Hearts),
    ]);
    seat_and_start(&registry, &[5, 3]);
    let game_id = current_game(&registry);

    send(&registry, 5, TableAction::Draw { actor: 5, game_id });
    send(&registry, 3, TableAction::Draw { actor: 3, game_id });
    send(&registry, 3, TableAction::Stand { actor: 3, game_id });
    let last = send(&registry, 5, TableAction::Stand { actor: 5, game_id });

    let results = announcement(&last, AnnouncementKind::Results).expect("results");
    assert!(results.ends_with("Winner: <@5> with 18!"), "{results}");
}

#[test]
fn new_game_after_close_starts_over() {
    let registry = stacked_registry(vec![
        card(Rank::Ace, Suit::Spades),
        card(Rank::Ace, Suit::Hearts),
    ]);
    seat_and_start(&registry, &[1]);
    let first = current_game(&registry);
    assert_eq!(
        registry.lookup(CHANNEL).unwrap().state().unwrap(),
        SessionState::Closed
    );

    seat_and_start(&registry, &[1]);
    let second = current_game(&registry);
    assert_ne!(first, second);
}
