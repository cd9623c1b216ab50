//! Public and private message text.

use xidach_engine::cards::Card;
use xidach_engine::resolver::{Seat, Settlement, DEALER_MIN_SCORE, PLAYER_MIN_SCORE};
use xidach_engine::scoring::SpecialHand;

use crate::requests::GameId;

const DEALER_NAME: &str = "Dealer (bot)";

pub fn seat_name(seat: Seat) -> String {
    match seat {
        Seat::Player(actor) => format!("<@{actor}>"),
        Seat::Dealer => DEALER_NAME.to_string(),
    }
}

pub fn card_list(cards: &[Card]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn dealer_reveal(cards: &[Card], score: u32) -> String {
    format!("{DEALER_NAME}: {} (total: {score})", card_list(cards))
}

pub fn dealer_instant_win(special: SpecialHand) -> String {
    format!("{DEALER_NAME} wins immediately with {special}!")
}

/// Note attached to a player's private hand when it wins on sight.
pub fn player_instant_win(special: SpecialHand) -> String {
    format!("You win immediately with {special}!")
}

pub fn results(game_id: GameId, settlement: &Settlement) -> String {
    if settlement.qualified().next().is_none() {
        return format!(
            "Game {game_id} is over. No hand reached the minimum \
             ({PLAYER_MIN_SCORE} for players, {DEALER_MIN_SCORE} for the dealer), so nobody wins."
        );
    }

    let mut text = format!("Results for game {game_id}:\n");
    for entry in &settlement.entries {
        text.push_str(&format!(
            "{}: {} (total: {})",
            seat_name(entry.seat),
            card_list(&entry.cards),
            entry.score
        ));
        if let Some(special) = entry.special {
            text.push_str(&format!(" [{special}]"));
        }
        if !entry.qualified {
            text.push_str(&format!(" - below {}, not counted", entry.seat.min_score()));
        }
        text.push('\n');
    }

    match (settlement.winner, settlement.winning_score) {
        (Some(seat), Some(score)) => {
            text.push_str(&format!("\nWinner: {} with {score}!", seat_name(seat)));
        }
        _ => text.push_str("\nNo winner: every counted hand went over 21."),
    }
    text
}
