//! The character-service port: an external collaborator that answers "does this character
//! exist, and what level are they". Modeled as a trait so the concrete wire protocol stays
//! swappable behind it.

use async_trait::async_trait;

use marriage_common::AppError;
use marriage_domain::CharacterId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterInfo {
    pub id: CharacterId,
    pub level: u32,
}

#[async_trait]
pub trait CharacterService: Send + Sync {
    async fn lookup(&self, character_id: CharacterId) -> Result<CharacterInfo, AppError>;
}

/// Production implementation backed by an HTTP call to the external character service
/// (`CHARACTER_SERVICE_BASE_URL`). The wire format is a minimal guess — `{ "level": u32 }` at
/// `GET {base}/characters/{id}` — the real upstream contract belongs to another service; this
/// crate only needs to exercise the trait, not reproduce that protocol faithfully.
pub struct HttpCharacterService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCharacterService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[derive(serde::Deserialize)]
struct CharacterResponse {
    level: u32,
}

#[async_trait]
impl CharacterService for HttpCharacterService {
    async fn lookup(&self, character_id: CharacterId) -> Result<CharacterInfo, AppError> {
        let url = format!("{}/characters/{character_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::CharacterService(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::CharacterService(format!("character {character_id} does not exist")));
        }
        let response = response.error_for_status().map_err(|e| AppError::CharacterService(e.to_string()))?;
        let body: CharacterResponse = response.json().await.map_err(|e| AppError::CharacterService(e.to_string()))?;
        Ok(CharacterInfo { id: character_id, level: body.level })
    }
}

/// Public test double: an in-memory table of known
/// characters, used by this crate's own Processor tests and by downstream crates (consumer,
/// scheduler) that need a `CharacterService` without standing up an HTTP server.
pub mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeCharacterService {
        characters: Mutex<HashMap<CharacterId, u32>>,
    }

    impl FakeCharacterService {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_character(self, character_id: CharacterId, level: u32) -> Self {
            self.characters.lock().unwrap().insert(character_id, level);
            self
        }

        pub fn set_level(&self, character_id: CharacterId, level: u32) {
            self.characters.lock().unwrap().insert(character_id, level);
        }
    }

    #[async_trait]
    impl CharacterService for FakeCharacterService {
        async fn lookup(&self, character_id: CharacterId) -> Result<CharacterInfo, AppError> {
            self.characters
                .lock()
                .unwrap()
                .get(&character_id)
                .map(|&level| CharacterInfo { id: character_id, level })
                .ok_or_else(|| AppError::CharacterService(format!("character {character_id} does not exist")))
        }
    }
}
