use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OracleType {
    Tarot,
    Lenormand,
    Cartomancia,
}

impl OracleType {
    pub const ALL: [OracleType; 3] = [
        OracleType::Tarot,
        OracleType::Lenormand,
        OracleType::Cartomancia,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tarot" => Some(Self::Tarot),
            "lenormand" => Some(Self::Lenormand),
            "cartomancia" | "cartomancy" => Some(Self::Cartomancia),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tarot => "tarot",
            Self::Lenormand => "lenormand",
            Self::Cartomancia => "cartomancia",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Tarot => "Tarot",
            Self::Lenormand => "Lenormand",
            Self::Cartomancia => "Cartomancia",
        }
    }

    pub fn total_cards(self) -> usize {
        match self {
            Self::Tarot => 78,
            Self::Lenormand => 36,
            Self::Cartomancia => 52,
        }
    }

    /// Only tarot cards carry a meaningful reversed state.
    pub fn supports_reversal(self) -> bool {
        matches!(self, Self::Tarot)
    }
}

impl fmt::Display for OracleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Upright,
    Reversed,
}

impl Orientation {
    pub fn is_reversed(self) -> bool {
        matches!(self, Self::Reversed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DeckCard {
    pub code: String,
    #[serde(default)]
    pub orientation: Orientation,
}

impl DeckCard {
    pub fn upright(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            orientation: Orientation::Upright,
        }
    }

    pub fn reversed(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            orientation: Orientation::Reversed,
        }
    }

    pub fn is_reversed(&self) -> bool {
        self.orientation.is_reversed()
    }
}

const MAJOR_ARCANA: [&str; 22] = [
    "fool",
    "magician",
    "high_priestess",
    "empress",
    "emperor",
    "hierophant",
    "lovers",
    "chariot",
    "strength",
    "hermit",
    "wheel_of_fortune",
    "justice",
    "hanged_man",
    "death",
    "temperance",
    "devil",
    "tower",
    "star",
    "moon",
    "sun",
    "judgement",
    "world",
];

const TAROT_SUITS: [&str; 4] = ["wands", "cups", "swords", "coins"];

const TAROT_RANKS: [&str; 14] = [
    "ace", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "page",
    "knight", "queen", "king",
];

const LENORMAND_CARDS: [&str; 36] = [
    "rider",
    "clover",
    "ship",
    "house",
    "tree",
    "clouds",
    "snake",
    "coffin",
    "bouquet",
    "scythe",
    "whip",
    "birds",
    "child",
    "fox",
    "bear",
    "stars",
    "stork",
    "dog",
    "tower",
    "garden",
    "mountain",
    "crossroads",
    "mice",
    "heart",
    "ring",
    "book",
    "letter",
    "man",
    "woman",
    "lily",
    "sun",
    "moon",
    "key",
    "fish",
    "anchor",
    "cross",
];

const PLAYING_SUITS: [&str; 4] = ["clubs", "diamonds", "hearts", "spades"];

const PLAYING_RANKS: [&str; 13] = [
    "ace", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "jack",
    "queen", "king",
];

/// Canonical, unshuffled card codes for an oracle, `total_cards()` long.
pub fn catalog(oracle: OracleType) -> Vec<String> {
    let mut codes = Vec::with_capacity(oracle.total_cards());
    match oracle {
        OracleType::Tarot => {
            for (idx, name) in MAJOR_ARCANA.iter().enumerate() {
                codes.push(format!("tarot_major_{idx:02}_{name}"));
            }
            for suit in TAROT_SUITS {
                for rank in TAROT_RANKS {
                    codes.push(format!("tarot_minor_{suit}_{rank}"));
                }
            }
        }
        OracleType::Lenormand => {
            for (idx, name) in LENORMAND_CARDS.iter().enumerate() {
                codes.push(format!("lenormand_{:02}_{name}", idx + 1));
            }
        }
        OracleType::Cartomancia => {
            for suit in PLAYING_SUITS {
                for rank in PLAYING_RANKS {
                    codes.push(format!("cartomancy_{suit}_{rank}"));
                }
            }
        }
    }
    codes
}
