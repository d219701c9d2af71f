//! Display names for drawn cards. Preview text only; nothing gates on it.

use crate::OracleType;
use regex::Regex;
use std::sync::LazyLock;

pub const REVERSED_MARKER: &str = " (invertida)";

struct Pattern {
    regex: Regex,
    name: &'static str,
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            tracing::error!("invalid label pattern {pattern}: {err}");
            None
        }
    }
}

fn token(alternatives: &str) -> Option<Regex> {
    compile(&format!(
        r"(?i)(?:^|[_\-\s])(?:{alternatives})(?:$|[_\-\s])"
    ))
}

fn table(entries: &[(&str, &'static str)]) -> Vec<Pattern> {
    entries
        .iter()
        .filter_map(|(alternatives, name)| {
            Some(Pattern {
                regex: token(alternatives)?,
                name: *name,
            })
        })
        .collect()
}

const MAJOR_NAMES: [&str; 22] = [
    "O Louco",
    "O Mago",
    "A Sacerdotisa",
    "A Imperatriz",
    "O Imperador",
    "O Hierofante",
    "Os Enamorados",
    "O Carro",
    "A Força",
    "O Eremita",
    "A Roda da Fortuna",
    "A Justiça",
    "O Enforcado",
    "A Morte",
    "A Temperança",
    "O Diabo",
    "A Torre",
    "A Estrela",
    "A Lua",
    "O Sol",
    "O Julgamento",
    "O Mundo",
];

static MAJOR_SLUGS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    table(&[
        ("fool|the_fool|louco|o_louco", MAJOR_NAMES[0]),
        ("magician|the_magician|mago|o_mago|magus", MAJOR_NAMES[1]),
        ("high_priestess|priestess|sacerdotisa|papisa", MAJOR_NAMES[2]),
        ("empress|imperatriz", MAJOR_NAMES[3]),
        ("emperor|imperador", MAJOR_NAMES[4]),
        ("hierophant|hierofante|papa|pope", MAJOR_NAMES[5]),
        ("lovers|the_lovers|enamorados|amantes", MAJOR_NAMES[6]),
        ("chariot|carro", MAJOR_NAMES[7]),
        ("strength|forca|força", MAJOR_NAMES[8]),
        ("hermit|eremita", MAJOR_NAMES[9]),
        ("wheel_of_fortune|wheel|roda_da_fortuna|roda", MAJOR_NAMES[10]),
        ("justice|justica|justiça", MAJOR_NAMES[11]),
        ("hanged_man|hanged|enforcado", MAJOR_NAMES[12]),
        ("death|morte", MAJOR_NAMES[13]),
        ("temperance|temperanca|temperança", MAJOR_NAMES[14]),
        ("devil|diabo", MAJOR_NAMES[15]),
        ("tower|torre", MAJOR_NAMES[16]),
        ("star|estrela", MAJOR_NAMES[17]),
        ("moon|lua", MAJOR_NAMES[18]),
        ("sun|sol", MAJOR_NAMES[19]),
        ("judgement|judgment|julgamento", MAJOR_NAMES[20]),
        ("world|mundo", MAJOR_NAMES[21]),
    ])
});

static MAJOR_NUMBER: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"(?i)major[_\-]?(\d{1,2})(?:$|[_\-])"));

static MINOR_MARKER: LazyLock<Option<Regex>> = LazyLock::new(|| token("minor|menor"));

static RANKS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    table(&[
        ("ace|as|ás|0?1", "Ás"),
        ("two|dois|0?2", "Dois"),
        ("three|tres|três|0?3", "Três"),
        ("four|quatro|0?4", "Quatro"),
        ("five|cinco|0?5", "Cinco"),
        ("six|seis|0?6", "Seis"),
        ("seven|sete|0?7", "Sete"),
        ("eight|oito|0?8", "Oito"),
        ("nine|nove|0?9", "Nove"),
        ("ten|dez|10", "Dez"),
        ("page|valete|pajem|princess|princesa", "Valete"),
        ("knight|cavaleiro|prince|principe", "Cavaleiro"),
        ("queen|rainha", "Rainha"),
        ("king|rei", "Rei"),
    ])
});

static SUITS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    table(&[
        ("wands|wand|paus|bastoes|bastões|batons|rods", "Paus"),
        ("cups|cup|copas|calices|cálices|chalices", "Copas"),
        ("swords|sword|espadas", "Espadas"),
        ("pentacles|pentacle|coins|coin|ouros|discs|denarios|denários", "Ouros"),
    ])
});

fn first_match(patterns: &[Pattern], code: &str) -> Option<&'static str> {
    patterns
        .iter()
        .find(|pattern| pattern.regex.is_match(code))
        .map(|pattern| pattern.name)
}

fn tarot_name(code: &str) -> Option<String> {
    let minor = MINOR_MARKER
        .as_ref()
        .is_some_and(|regex| regex.is_match(code));
    if !minor {
        if let Some(name) = first_match(&MAJOR_SLUGS, code) {
            return Some(name.to_string());
        }
        if let Some(name) = MAJOR_NUMBER
            .as_ref()
            .and_then(|regex| regex.captures(code))
            .and_then(|caps| caps.get(1))
            .and_then(|number| number.as_str().parse::<usize>().ok())
            .and_then(|number| MAJOR_NAMES.get(number))
        {
            return Some(name.to_string());
        }
    }
    let suit = first_match(&SUITS, code)?;
    let rank = first_match(&RANKS, code)?;
    Some(format!("{rank} de {suit}"))
}

/// Human-readable name for a card code. Unknown codes come back unchanged.
pub fn label(oracle: OracleType, code: &str, reversed: bool) -> String {
    match oracle {
        OracleType::Tarot => {
            let mut name = tarot_name(code).unwrap_or_else(|| code.to_string());
            if reversed {
                name.push_str(REVERSED_MARKER);
            }
            name
        }
        OracleType::Lenormand | OracleType::Cartomancia => code.to_string(),
    }
}
