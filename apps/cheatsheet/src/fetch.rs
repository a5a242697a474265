//! Fragment fetching — where page markup comes from.
//!
//! The assembler only sees `Arc<dyn FragmentSource>`. `HttpFragmentSource` is
//! the production backend: one GET per fragment under `BASE_URL/PAGES_DIR/`.
//! There is no retry and no per-request timeout.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response. `status` holds code and reason, e.g. `404 Not Found`.
    #[error("Failed to load {name}: {status}")]
    Status { name: String, status: String },

    #[error("Invalid URL for {name}: {source}")]
    Url {
        name: String,
        #[source]
        source: url::ParseError,
    },
}

/// A place fragments can be read from by name.
#[async_trait]
pub trait FragmentSource: Send + Sync {
    async fn fetch(&self, name: &str) -> Result<String, FetchError>;
}

#[derive(Clone)]
pub struct HttpFragmentSource {
    client: Client,
    pages_url: Url,
}

impl HttpFragmentSource {
    /// `base_url` should end in `/`; `pages_dir` is resolved against it.
    pub fn new(base_url: &Url, pages_dir: &str) -> Result<Self, FetchError> {
        let pages_dir = pages_dir.trim_matches('/');
        let pages_url = if pages_dir.is_empty() {
            base_url.clone()
        } else {
            base_url
                .join(&format!("{pages_dir}/"))
                .map_err(|source| FetchError::Url {
                    name: pages_dir.to_string(),
                    source,
                })?
        };

        Ok(Self {
            client: Client::builder().build()?,
            pages_url,
        })
    }

    pub fn pages_url(&self) -> &Url {
        &self.pages_url
    }

    /// Always a path below `pages_url`: the `./` prefix keeps names that look
    /// absolute, scheme-relative or scheme-qualified from escaping it.
    pub fn fragment_url(&self, name: &str) -> Result<Url, FetchError> {
        self.pages_url.join(&format!("./{name}")).map_err(|source| FetchError::Url {
            name: name.to_string(),
            source,
        })
    }
}

#[async_trait]
impl FragmentSource for HttpFragmentSource {
    async fn fetch(&self, name: &str) -> Result<String, FetchError> {
        let url = self.fragment_url(name)?;
        debug!("GET {url}");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                name: name.to_string(),
                status: status.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
