//! Wikipedia page-image photo lookup

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::PhotoProvider;
use super::http::{HttpTransport, endpoint};

pub struct WikipediaPhotoClient {
    transport: HttpTransport,
    base_url: String,
    thumbnail_size: u32,
}

#[derive(Debug, Deserialize)]
struct PageImagesResponse {
    query: Option<QueryBlock>,
}

#[derive(Debug, Deserialize)]
struct QueryBlock {
    /// Keyed by page id
    #[serde(default)]
    pages: BTreeMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    source: Option<String>,
}

impl PageImagesResponse {
    fn first_thumbnail(self) -> Option<String> {
        self.query?
            .pages
            .into_values()
            .find_map(|page| page.thumbnail.and_then(|thumbnail| thumbnail.source))
    }
}

impl WikipediaPhotoClient {
    pub fn new(transport: HttpTransport, base_url: String, thumbnail_size: u32) -> Self {
        Self {
            transport,
            base_url,
            thumbnail_size,
        }
    }
}

#[async_trait]
impl PhotoProvider for WikipediaPhotoClient {
    #[instrument(skip(self), fields(query = query))]
    async fn photo(&self, query: &str) -> Result<Option<String>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let url = endpoint(
            &self.base_url,
            "",
            &[
                ("action", "query".to_string()),
                ("format", "json".to_string()),
                ("prop", "pageimages".to_string()),
                ("generator", "search".to_string()),
                ("gsrsearch", query.to_string()),
                ("gsrlimit", "1".to_string()),
                ("piprop", "thumbnail".to_string()),
                ("pithumbsize", self.thumbnail_size.to_string()),
                ("pilimit", "1".to_string()),
            ],
        )?;

        let response: PageImagesResponse = self.transport.get_json("wikipedia", url).await?;
        let photo = response.first_thumbnail();
        if photo.is_none() {
            debug!("No page image found for '{}'", query);
        }
        Ok(photo)
    }
}
