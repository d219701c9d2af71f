//! Method registry: every spread the app knows, keyed per oracle.
//!
//! The set is closed. A method key that is not listed here cannot be turned
//! into a [`Method`], so the count lookups below are total and never guess.

use crate::OracleType;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MethodError {
    #[error("unknown method `{key}` for {oracle}")]
    Unknown { oracle: OracleType, key: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    CartaDoDia,
    SimOuNao,
    TresPpp,
    TemploDeAfrodite,
    Ferradura,
    CruzCelta,
    MandalaAstrologica,
    LinhaDeTres,
    LinhaDeCinco,
    QuadradoDeNove,
    GrandTableau,
    CartaUnica,
    TresCartas,
    CruzSimples,
    FerraduraCigana,
}

const PAST_PRESENT_FUTURE: &[&str] = &["Passado", "Presente", "Futuro"];

const HORSESHOE: &[&str] = &[
    "Passado",
    "Presente",
    "Futuro próximo",
    "Obstáculos",
    "Influências externas",
    "Conselho",
    "Resultado",
];

impl Method {
    pub const ALL: [Method; 15] = [
        Method::CartaDoDia,
        Method::SimOuNao,
        Method::TresPpp,
        Method::TemploDeAfrodite,
        Method::Ferradura,
        Method::CruzCelta,
        Method::MandalaAstrologica,
        Method::LinhaDeTres,
        Method::LinhaDeCinco,
        Method::QuadradoDeNove,
        Method::GrandTableau,
        Method::CartaUnica,
        Method::TresCartas,
        Method::CruzSimples,
        Method::FerraduraCigana,
    ];

    /// Resolve a method key within an oracle. Keys of other oracles are rejected.
    pub fn parse(oracle: OracleType, key: &str) -> Result<Self, MethodError> {
        let key = key.trim();
        methods_for(oracle)
            .find(|method| method.key() == key)
            .ok_or_else(|| MethodError::Unknown {
                oracle,
                key: key.to_string(),
            })
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::CartaDoDia => "carta_do_dia",
            Self::SimOuNao => "sim_ou_nao",
            Self::TresPpp => "tres_ppp",
            Self::TemploDeAfrodite => "templo_de_afrodite",
            Self::Ferradura => "ferradura",
            Self::CruzCelta => "cruz_celta",
            Self::MandalaAstrologica => "mandala_astrologica",
            Self::LinhaDeTres => "linha_de_tres",
            Self::LinhaDeCinco => "linha_de_cinco",
            Self::QuadradoDeNove => "quadrado_de_nove",
            Self::GrandTableau => "grand_tableau",
            Self::CartaUnica => "carta_unica",
            Self::TresCartas => "tres_cartas",
            Self::CruzSimples => "cruz_simples",
            Self::FerraduraCigana => "ferradura_cigana",
        }
    }

    pub fn oracle(self) -> OracleType {
        match self {
            Self::CartaDoDia
            | Self::SimOuNao
            | Self::TresPpp
            | Self::TemploDeAfrodite
            | Self::Ferradura
            | Self::CruzCelta
            | Self::MandalaAstrologica => OracleType::Tarot,
            Self::LinhaDeTres | Self::LinhaDeCinco | Self::QuadradoDeNove | Self::GrandTableau => {
                OracleType::Lenormand
            }
            Self::CartaUnica | Self::TresCartas | Self::CruzSimples | Self::FerraduraCigana => {
                OracleType::Cartomancia
            }
        }
    }

    pub fn cards_needed(self) -> usize {
        match self {
            Self::CartaDoDia | Self::SimOuNao | Self::CartaUnica => 1,
            Self::TresPpp | Self::LinhaDeTres | Self::TresCartas => 3,
            Self::LinhaDeCinco | Self::CruzSimples => 5,
            Self::TemploDeAfrodite | Self::Ferradura | Self::FerraduraCigana => 7,
            Self::QuadradoDeNove => 9,
            Self::CruzCelta => 10,
            Self::MandalaAstrologica => 12,
            Self::GrandTableau => OracleType::Lenormand.total_cards(),
        }
    }

    /// The whole deck is revealed by the first flip.
    pub fn is_full_reveal(self) -> bool {
        matches!(self, Self::GrandTableau)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::CartaDoDia => "Carta do Dia",
            Self::SimOuNao => "Sim ou Não",
            Self::TresPpp => "Passado, Presente e Futuro",
            Self::TemploDeAfrodite => "Templo de Afrodite",
            Self::Ferradura => "Ferradura",
            Self::CruzCelta => "Cruz Celta",
            Self::MandalaAstrologica => "Mandala Astrológica",
            Self::LinhaDeTres => "Linha de Três",
            Self::LinhaDeCinco => "Linha de Cinco",
            Self::QuadradoDeNove => "Quadrado de Nove",
            Self::GrandTableau => "Grand Tableau",
            Self::CartaUnica => "Carta Única",
            Self::TresCartas => "Três Cartas",
            Self::CruzSimples => "Cruz Simples",
            Self::FerraduraCigana => "Ferradura Cigana",
        }
    }

    fn roles(self) -> &'static [&'static str] {
        match self {
            Self::CartaDoDia => &["Conselho do dia"],
            Self::SimOuNao | Self::CartaUnica => &["Resposta"],
            Self::TresPpp | Self::LinhaDeTres | Self::TresCartas => PAST_PRESENT_FUTURE,
            Self::TemploDeAfrodite => &[
                "Pensamento do consulente",
                "Pensamento do outro",
                "Sentimento do consulente",
                "Sentimento do outro",
                "Atração do consulente",
                "Atração do outro",
                "Síntese",
            ],
            Self::Ferradura | Self::FerraduraCigana => HORSESHOE,
            Self::CruzCelta => &[
                "Situação atual",
                "Desafio",
                "Base",
                "Passado recente",
                "Objetivo",
                "Futuro próximo",
                "Consulente",
                "Ambiente",
                "Esperanças e medos",
                "Resultado",
            ],
            Self::MandalaAstrologica => &[
                "Identidade",
                "Finanças",
                "Comunicação",
                "Lar",
                "Amor",
                "Trabalho",
                "Parcerias",
                "Transformação",
                "Espiritualidade",
                "Carreira",
                "Amizades",
                "Inconsciente",
            ],
            Self::LinhaDeCinco => &[
                "Passado distante",
                "Passado recente",
                "Presente",
                "Futuro próximo",
                "Futuro distante",
            ],
            Self::QuadradoDeNove => &[
                "Pensamentos passados",
                "Pensamentos presentes",
                "Pensamentos futuros",
                "Passado",
                "Centro",
                "Futuro",
                "Base passada",
                "Base presente",
                "Base futura",
            ],
            Self::CruzSimples => &["Situação", "Obstáculo", "Raiz", "Passado", "Futuro"],
            Self::GrandTableau => &[],
        }
    }

    /// Positional role of the `index`-th revealed card.
    pub fn position_role(self, index: usize) -> String {
        if self.is_full_reveal() {
            return format!("Casa {}", index + 1);
        }
        self.roles()
            .get(index)
            .map(|role| role.to_string())
            .unwrap_or_else(|| format!("Posição {}", index + 1))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

pub fn methods_for(oracle: OracleType) -> impl Iterator<Item = Method> {
    Method::ALL
        .into_iter()
        .filter(move |method| method.oracle() == oracle)
}

pub fn cards_needed(method: Method) -> usize {
    method.cards_needed()
}

pub fn total_cards(oracle: OracleType) -> usize {
    oracle.total_cards()
}

pub fn is_full_reveal_method(method: Method) -> bool {
    method.is_full_reveal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_method_needs_a_drawable_count() {
        for method in Method::ALL {
            let needed = method.cards_needed();
            assert!(needed > 0, "{method} needs zero cards");
            assert!(needed <= method.oracle().total_cards(), "{method} exceeds deck");
        }
    }

    #[test]
    fn every_standard_method_names_each_position() {
        for method in Method::ALL.into_iter().filter(|m| !m.is_full_reveal()) {
            assert_eq!(method.roles().len(), method.cards_needed(), "{method}");
        }
    }

    #[test]
    fn keys_round_trip_within_their_oracle() {
        for method in Method::ALL {
            assert_eq!(Method::parse(method.oracle(), method.key()), Ok(method));
        }
    }

    #[test]
    fn keys_are_scoped_to_their_oracle() {
        assert!(Method::parse(OracleType::Tarot, "grand_tableau").is_err());
        assert!(Method::parse(OracleType::Lenormand, "cruz_celta").is_err());
    }

    #[test]
    fn only_grand_tableau_reveals_everything() {
        let full: Vec<_> = Method::ALL
            .into_iter()
            .filter(|m| m.is_full_reveal())
            .collect();
        assert_eq!(full, vec![Method::GrandTableau]);
        assert_eq!(Method::GrandTableau.position_role(35), "Casa 36");
    }
}
