//! Card draw engine for oracle consultations. Keep this crate free of IO.

pub mod assets;
pub mod cards;
pub mod consultation;
pub mod deck;
pub mod events;
pub mod label;
pub mod methods;
pub mod provider;
pub mod queue;
pub mod reading;
pub mod rng;
pub mod selection;

pub use assets::*;
pub use cards::*;
pub use consultation::*;
pub use deck::*;
pub use events::*;
pub use label::*;
pub use methods::*;
pub use provider::*;
pub use queue::*;
pub use reading::*;
pub use rng::*;
pub use selection::*;
