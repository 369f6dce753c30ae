//! GraphQL client for the public Rick & Morty catalogue.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::application::sync::{CharacterSource, ExternalCharacter, SourceError};

use super::error::InfraError;

const CHARACTERS_QUERY: &str = "query { characters(page: 1) { results { id name status species gender origin { name } } } }";

#[derive(Clone, Debug)]
pub struct RickAndMortyClient {
    http: Client,
    endpoint: Url,
}

impl RickAndMortyClient {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, InfraError> {
        let http = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()
            .map_err(|err| InfraError::upstream(format!("failed to build http client: {err}")))?;
        Ok(Self { http, endpoint })
    }

    pub fn user_agent() -> &'static str {
        concat!("citadel/", env!("CARGO_PKG_VERSION"))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl CharacterSource for RickAndMortyClient {
    async fn fetch_characters(&self, limit: usize) -> Result<Vec<ExternalCharacter>, SourceError> {
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&json!({ "query": CHARACTERS_QUERY }))
            .send()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let characters = parse_characters(&bytes, limit)?;
        debug!(
            target = "citadel::sync",
            endpoint = %self.endpoint,
            fetched = characters.len(),
            "Fetched upstream characters"
        );
        Ok(characters)
    }
}

#[derive(Deserialize)]
struct Envelope {
    data: Option<Data>,
    #[serde(default)]
    errors: Vec<UpstreamError>,
}

#[derive(Deserialize)]
struct UpstreamError {
    message: String,
}

#[derive(Deserialize)]
struct Data {
    characters: Option<Page>,
}

#[derive(Deserialize)]
struct Page {
    results: Option<Vec<WireCharacter>>,
}

#[derive(Deserialize)]
struct WireCharacter {
    id: WireId,
    name: Option<String>,
    status: Option<String>,
    species: Option<String>,
    gender: Option<String>,
    origin: Option<WireOrigin>,
}

#[derive(Deserialize)]
struct WireOrigin {
    name: Option<String>,
}

/// Upstream publishes ids as strings; accept numbers too.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(i64),
}

impl WireId {
    fn parse(&self) -> Result<i32, SourceError> {
        match self {
            WireId::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| SourceError::Malformed(format!("invalid character id `{text}`"))),
            WireId::Number(value) => i32::try_from(*value)
                .map_err(|_| SourceError::Malformed(format!("character id {value} out of range"))),
        }
    }
}

/// Decode a GraphQL response body into at most `limit` characters.
///
/// A response without `data.characters.results` yields an empty list; a
/// response carrying only `errors` is reported as an upstream failure.
/// Entries without a name are dropped.
pub fn parse_characters(body: &[u8], limit: usize) -> Result<Vec<ExternalCharacter>, SourceError> {
    let envelope: Envelope =
        serde_json::from_slice(body).map_err(|err| SourceError::Malformed(err.to_string()))?;

    let page = envelope.data.and_then(|data| data.characters);
    let Some(page) = page else {
        if !envelope.errors.is_empty() {
            let messages: Vec<_> = envelope.errors.into_iter().map(|e| e.message).collect();
            return Err(SourceError::Upstream(messages.join("; ")));
        }
        return Ok(Vec::new());
    };

    let mut characters = Vec::new();
    for wire in page.results.unwrap_or_default().into_iter().take(limit) {
        let id = wire.id.parse()?;
        let Some(name) = wire.name else {
            debug!(target = "citadel::sync", upstream_id = id, "Skipping nameless upstream character");
            continue;
        };
        characters.push(ExternalCharacter {
            id,
            name,
            status: wire.status,
            species: wire.species,
            gender: wire.gender,
            origin: wire.origin.and_then(|origin| origin.name),
        });
    }
    Ok(characters)
}
