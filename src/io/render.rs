use crate::domain::{Card, Holding};

/// Cards per grid row before wrapping onto a new grid.
pub const CARDS_PER_ROW: usize = 13;

// Widest code is "10♠"; each cell is one space, the code padded to 3, one space.
const CELL_WIDTH: usize = 5;

/// Render cards as a bordered grid, one column per card:
///
/// ```text
/// +-----+-----+
/// | A♥  | 10♠ |
/// +-----+-----+
/// ```
///
/// Hands longer than [`CARDS_PER_ROW`] are split over several grids.
pub fn render_cards(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "(no cards)\n".to_string();
    }

    let mut out = String::new();
    for row in cards.chunks(CARDS_PER_ROW) {
        let border = format!("{}+\n", format!("+{}", "-".repeat(CELL_WIDTH)).repeat(row.len()));
        out.push_str(&border);
        for card in row {
            out.push_str(&format!("| {:<3} ", card.code()));
        }
        out.push_str("|\n");
        out.push_str(&border);
    }
    out
}

pub fn render_holdings(holdings: &[Holding]) -> String {
    let cards: Vec<Card> = holdings.iter().map(|h| h.card).collect();
    render_cards(&cards)
}

/// One labelled grid per character.
pub fn render_table(hands: &[(String, Vec<Holding>)]) -> String {
    if hands.is_empty() {
        return "No characters registered.\n".to_string();
    }

    let mut out = String::new();
    for (i, (name, hand)) in hands.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let noun = if hand.len() == 1 { "card" } else { "cards" };
        out.push_str(&format!("{} ({} {})\n", name, hand.len(), noun));
        out.push_str(&render_holdings(hand));
    }
    out
}
