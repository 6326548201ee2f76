use async_trait::async_trait;
use url::Url;

use super::{parse_list_page, ApiError, ListPage, ListRequest, CLIENT, DEFAULT_BASE};

/// Remote collection behind the card list.
#[async_trait]
pub trait PromptSource: Send + Sync {
    async fn list(&self, request: &ListRequest) -> Result<ListPage, ApiError>;
    async fn toggle_favorite(&self, id: i64) -> Result<(), ApiError>;
    async fn delete(&self, id: i64) -> Result<(), ApiError>;
    /// Raw image bytes of a thumbnail.
    async fn thumbnail(&self, filename: &str) -> Result<Vec<u8>, ApiError>;

    fn export_url(&self) -> Result<String, ApiError>;
    fn thumbnail_url(&self, filename: &str) -> Result<String, ApiError>;
}

/// Prompt library backend over HTTP.
pub struct HttpPromptSource {
    base: Url,
}

impl HttpPromptSource {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base =
            Url::parse(base_url.trim()).map_err(|e| ApiError::BaseUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(ApiError::BaseUrl(base_url.to_string()));
        }
        Ok(Self { base })
    }

    /// Like `new`, but an unusable URL is logged and replaced by the local default backend.
    pub fn or_default(base_url: &str) -> Self {
        Self::new(base_url).unwrap_or_else(|e| {
            log::error!("Invalid API base url, using {}: {e}", *DEFAULT_BASE);
            Self {
                base: DEFAULT_BASE.clone(),
            }
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::BaseUrl(self.base.to_string()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl PromptSource for HttpPromptSource {
    async fn list(&self, request: &ListRequest) -> Result<ListPage, ApiError> {
        let url = self.endpoint(&["list"])?;
        log::debug!("list: GET {} {:?}", url, request);
        let resp = CLIENT.get(url).query(&request.query_pairs()).send().await?;
        let body = Self::check(resp).await?.text().await?;
        parse_list_page(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn toggle_favorite(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&["favorite", &id.to_string()])?;
        log::debug!("toggle_favorite: POST {}", url);
        Self::check(CLIENT.post(url).send().await?).await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&["record", &id.to_string()])?;
        log::debug!("delete: DELETE {}", url);
        Self::check(CLIENT.delete(url).send().await?).await?;
        Ok(())
    }

    async fn thumbnail(&self, filename: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(&["thumbnail", filename])?;
        let resp = Self::check(CLIENT.get(url).send().await?).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    fn export_url(&self) -> Result<String, ApiError> {
        Ok(self.endpoint(&["export"])?.to_string())
    }

    fn thumbnail_url(&self, filename: &str) -> Result<String, ApiError> {
        Ok(self.endpoint(&["thumbnail", filename])?.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_extend_the_base_path() {
        let source = HttpPromptSource::new("http://127.0.0.1:8188/prompt_library/api/").unwrap();
        assert_eq!(
            source.export_url().unwrap(),
            "http://127.0.0.1:8188/prompt_library/api/export"
        );
        assert_eq!(
            source.endpoint(&["favorite", "7"]).unwrap().as_str(),
            "http://127.0.0.1:8188/prompt_library/api/favorite/7"
        );
    }

    #[test]
    fn thumbnail_names_are_escaped() {
        let source = HttpPromptSource::new("https://example.org/api").unwrap();
        assert_eq!(
            source.thumbnail_url("my thumb#1.png").unwrap(),
            "https://example.org/api/thumbnail/my%20thumb%231.png"
        );
    }

    #[test]
    fn unusable_base_urls_are_rejected() {
        assert!(matches!(
            HttpPromptSource::new("not a url"),
            Err(ApiError::BaseUrl(_))
        ));
        assert!(matches!(
            HttpPromptSource::new("mailto:someone@example.org"),
            Err(ApiError::BaseUrl(_))
        ));
        assert_eq!(
            HttpPromptSource::or_default("ftp://host/api").base_url().as_str(),
            crate::api::DEFAULT_BASE_URL
        );
    }
}
