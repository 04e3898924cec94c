pub mod character_service;
pub mod processor;
pub mod views;

pub use character_service::{CharacterInfo, CharacterService, HttpCharacterService};
pub use processor::MarriageProcessor;
pub use views::MarriageView;
