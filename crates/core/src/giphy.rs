//! Random festive GIF client for the GIPHY API.
//!
//! Calls `GET /v1/gifs/random` with a tag and content rating, downloads the
//! downsampled GIF, and optionally keeps a copy on disk.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::GiphyConfig;
use crate::errors::GifError;

/// A downloaded GIF ready for inline embedding.
#[derive(Debug, Clone)]
pub struct FestiveGif {
    /// GIPHY asset id, also used as the MIME Content-ID.
    pub id: String,
    /// Direct URL, substituted into the plain-text body.
    pub url: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct RandomGifEnvelope {
    data: RandomGifData,
}

#[derive(Debug, Deserialize)]
struct RandomGifData {
    id: Option<String>,
    fixed_height_downsampled_url: Option<String>,
}

/// Asynchronous GIPHY API client.
#[derive(Clone)]
pub struct GiphyClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    tag: String,
    rating: String,
    keep_dir: Option<PathBuf>,
}

impl GiphyClient {
    /// Create a client from config and the resolved API token.
    pub fn new(config: &GiphyConfig, token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token,
            tag: config.tag.clone(),
            rating: config.rating.clone(),
            keep_dir: config.keep_gifs.then(|| config.save_dir.clone()),
        }
    }

    /// Fetch one random GIF matching the configured tag and rating.
    pub async fn fetch_random(&self) -> Result<FestiveGif, GifError> {
        let url = format!("{}/v1/gifs/random", self.api_url);
        debug!(tag = %self.tag, rating = %self.rating, "requesting random GIF");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("api_key", self.token.as_str()),
                ("tag", self.tag.as_str()),
                ("rating", self.rating.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GifError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: RandomGifEnvelope = response.json().await?;
        let id = envelope
            .data
            .id
            .ok_or_else(|| GifError::MissingField("data.id".into()))?;
        let gif_url = envelope
            .data
            .fixed_height_downsampled_url
            .ok_or_else(|| GifError::MissingField("data.fixed_height_downsampled_url".into()))?;

        let bytes = self
            .http
            .get(&gif_url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?
            .to_vec();

        debug!(id = %id, size = bytes.len(), "downloaded GIF");

        if let Some(ref dir) = self.keep_dir {
            std::fs::create_dir_all(dir)?;
            let path = dir.join(format!("{id}.gif"));
            std::fs::write(&path, &bytes)?;
            info!(path = %path.display(), "kept a copy of the GIF");
        }

        Ok(FestiveGif {
            id,
            url: gif_url,
            bytes,
        })
    }
}
