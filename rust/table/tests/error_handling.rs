/// Rejected actions: error kinds, the published rejection, and untouched state
use std::sync::Arc;
use xidach_engine::cards::{Card, Rank, Suit};
use xidach_engine::deck::{PresetOrder, RandomSource};
use xidach_table::{
    ActionError, ErrorSeverity, GameId, IntoRejection, SessionRegistry, TableAction, TableEvent,
    TableRequest, TableSettings, init_test_logging,
};

const CHANNEL: u64 = 5;

fn registry(max_participants: usize) -> SessionRegistry {
    let top = vec![
        Card::new(Rank::Seven, Suit::Clubs),
        Card::new(Rank::Eight, Suit::Clubs),
    ];
    SessionRegistry::with_shuffle(
        TableSettings {
            max_participants,
            ..Default::default()
        },
        Arc::new(move || Box::new(PresetOrder::new(top.clone())) as Box<dyn RandomSource>),
    )
}

fn send(
    registry: &SessionRegistry,
    caller: u64,
    action: TableAction,
) -> Result<Vec<TableEvent>, ActionError> {
    registry.handle(TableRequest::new(CHANNEL, caller, action))
}

fn dealt_table(players: &[u64]) -> (SessionRegistry, GameId) {
    let registry = registry(5);
    send(&registry, players[0], TableAction::NewGame).unwrap();
    for &p in players {
        send(&registry, p, TableAction::Join).unwrap();
    }
    for &p in players {
        send(&registry, p, TableAction::StartVote).unwrap();
    }
    let game_id = registry
        .lookup(CHANNEL)
        .unwrap()
        .game_id()
        .unwrap()
        .expect("dealt");
    (registry, game_id)
}

#[test]
fn lobby_full_uses_configured_limit() {
    let registry = registry(2);
    send(&registry, 1, TableAction::NewGame).unwrap();
    send(&registry, 1, TableAction::Join).unwrap();
    send(&registry, 2, TableAction::Join).unwrap();

    let err = send(&registry, 3, TableAction::Join).unwrap_err();
    assert_eq!(err, ActionError::LobbyFull { max: 2 });
    assert_eq!(err.to_rejection().error, "lobby_full");

    let view = registry.lookup(CHANNEL).unwrap().lobby_view().unwrap();
    assert_eq!(
        view,
        TableEvent::LobbyView {
            channel: CHANNEL,
            participant_count: 2,
            vote_count: 0,
            joinable: false,
            startable: true,
        }
    );
}

#[test]
fn outsiders_cannot_vote_or_play() {
    let (registry, game_id) = dealt_table(&[1, 2]);
    assert_eq!(
        send(&registry, 9, TableAction::StartVote),
        Err(ActionError::NotParticipant)
    );
    assert_eq!(
        send(&registry, 9, TableAction::Draw { actor: 9, game_id }),
        Err(ActionError::NotParticipant)
    );
}

#[test]
fn pressing_another_players_button_is_rejected() {
    let (registry, game_id) = dealt_table(&[1, 2]);
    send(&registry, 1, TableAction::Draw { actor: 1, game_id }).unwrap();
    let before = registry.lookup(CHANNEL).unwrap().snapshot().unwrap();

    assert_eq!(
        send(&registry, 2, TableAction::Hit { actor: 1, game_id }),
        Err(ActionError::ActorMismatch)
    );
    assert_eq!(
        send(&registry, 2, TableAction::Stand { actor: 1, game_id }),
        Err(ActionError::ActorMismatch)
    );
    assert_eq!(registry.lookup(CHANNEL).unwrap().snapshot().unwrap(), before);
}

#[test]
fn hit_and_stand_need_a_drawn_hand() {
    let (registry, game_id) = dealt_table(&[1]);
    assert_eq!(
        send(&registry, 1, TableAction::Hit { actor: 1, game_id }),
        Err(ActionError::HandNotReady)
    );
    assert_eq!(
        send(&registry, 1, TableAction::Stand { actor: 1, game_id }),
        Err(ActionError::HandNotReady)
    );
}

#[test]
fn standing_twice_is_rejected() {
    let (registry, game_id) = dealt_table(&[1, 2]);
    send(&registry, 1, TableAction::Draw { actor: 1, game_id }).unwrap();
    send(&registry, 1, TableAction::Stand { actor: 1, game_id }).unwrap();
    assert_eq!(
        send(&registry, 1, TableAction::Stand { actor: 1, game_id }),
        Err(ActionError::AlreadyStood)
    );
    assert_eq!(
        send(&registry, 1, TableAction::Hit { actor: 1, game_id }),
        Err(ActionError::AlreadyStood)
    );
}

#[test]
fn stale_game_id_changes_nothing() {
    let (registry, game_id) = dealt_table(&[1]);
    send(&registry, 1, TableAction::Draw { actor: 1, game_id }).unwrap();
    let before = registry.lookup(CHANNEL).unwrap().snapshot().unwrap();

    let stale = GameId::new();
    for action in [
        TableAction::Draw { actor: 1, game_id: stale },
        TableAction::Hit { actor: 1, game_id: stale },
        TableAction::Stand { actor: 1, game_id: stale },
    ] {
        assert_eq!(send(&registry, 1, action), Err(ActionError::GameIdMismatch));
    }

    let after = registry.lookup(CHANNEL).unwrap().snapshot().unwrap();
    assert_eq!(after, before);
    assert_eq!(after.deck_remaining.len(), 48);
}

#[test]
fn game_id_is_checked_before_the_actor() {
    let (registry, _) = dealt_table(&[1, 2]);
    assert_eq!(
        send(
            &registry,
            2,
            TableAction::Hit {
                actor: 1,
                game_id: GameId::new()
            }
        ),
        Err(ActionError::GameIdMismatch)
    );
}

#[test]
fn rejection_goes_only_to_the_caller() {
    let (registry, game_id) = dealt_table(&[1, 2]);
    let mut sub = registry.event_bus().subscribe(CHANNEL);

    let _ = send(&registry, 2, TableAction::Draw { actor: 1, game_id });

    let events = sub.drain();
    assert_eq!(events.len(), 1);
    match &events[0] {
        TableEvent::ActionRejected {
            actor, rejection, ..
        } => {
            assert_eq!(*actor, 2);
            assert_eq!(rejection.error, "actor_mismatch");
            assert_eq!(rejection.message, "These cards belong to another player");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn rejections_are_logged_by_severity() {
    let logs = init_test_logging();
    let registry = registry(5);

    let _ = send(&registry, 1, TableAction::Join);

    // other tests in this binary log rejections concurrently
    let rejected: Vec<_> = logs
        .find("action rejected")
        .into_iter()
        .filter(|entry| entry.field("error") == Some("session_not_found"))
        .collect();
    assert!(!rejected.is_empty());
    assert_eq!(rejected[0].level, tracing::Level::INFO);
    assert_eq!(rejected[0].field("channel"), Some("5"));
    assert_eq!(
        ActionError::SessionNotFound(CHANNEL).severity(),
        ErrorSeverity::Client
    );
}
