//! Static card palette: card id -> detailed colour, base colour family, name.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardColor {
    pub id: &'static str,
    pub color: &'static str,
    pub base_color: &'static str,
    pub name: &'static str,
}

const fn card(
    id: &'static str,
    color: &'static str,
    base_color: &'static str,
    name: &'static str,
) -> CardColor {
    CardColor {
        id,
        color,
        base_color,
        name,
    }
}

pub const CARD_PALETTE: &[CardColor] = &[
    card("apple", "crimson", "red", "Apple"),
    card("cherry", "scarlet", "red", "Cherry"),
    card("strawberry", "rose", "red", "Strawberry"),
    card("orange", "tangerine", "orange", "Orange"),
    card("carrot", "amber", "orange", "Carrot"),
    card("banana", "lemon", "yellow", "Banana"),
    card("sunflower", "gold", "yellow", "Sunflower"),
    card("leaf", "lime", "green", "Leaf"),
    card("frog", "emerald", "green", "Frog"),
    card("cactus", "olive", "green", "Cactus"),
    card("whale", "navy", "blue", "Whale"),
    card("drop", "sky", "blue", "Drop"),
    card("grape", "violet", "purple", "Grape"),
    card("plum", "lavender", "purple", "Plum"),
    card("flamingo", "magenta", "pink", "Flamingo"),
    card("bear", "chocolate", "brown", "Bear"),
];

/// Look up a card by id or by its detailed colour.
pub fn lookup(label: &str) -> Option<&'static CardColor> {
    let key = label.trim().to_ascii_lowercase();
    CARD_PALETTE
        .iter()
        .find(|c| c.id == key)
        .or_else(|| CARD_PALETTE.iter().find(|c| c.color == key))
}

/// Base colour family for a stats label; unknown labels are their own family.
pub fn base_family(label: &str) -> String {
    match lookup(label) {
        Some(card) => card.base_color.to_string(),
        None => label.trim().to_ascii_lowercase(),
    }
}
