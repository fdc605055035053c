use crate::error::{LeaderboardError, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub const PER_PAGE: usize = 100;
pub const FIRST_PAGE: u32 = 1;

/// Anything that can hand back one raw JSON page of a collection resource.
pub trait PageSource {
    /// Location of `path` for error messages and logs.
    fn url_for(&self, path: &str) -> String;

    async fn fetch_page(&self, path: &str, page: u32, per_page: usize) -> Result<String>;
}

pub async fn paginate<S, T>(source: &S, path: &str, max_pages: Option<u32>) -> Result<Vec<T>>
where
    S: PageSource,
    T: DeserializeOwned,
{
    paginate_from(source, path, FIRST_PAGE, max_pages).await
}

/// Collects every item of `path` starting at `start_page`.
///
/// A page of exactly `PER_PAGE` items leads to the next one, any other size
/// ends the walk. Only a failure of the starting page is returned; a failure on any later
/// page ends pagination and keeps what was already gathered.
pub async fn paginate_from<S, T>(
    source: &S,
    path: &str,
    start_page: u32,
    max_pages: Option<u32>,
) -> Result<Vec<T>>
where
    S: PageSource,
    T: DeserializeOwned,
{
    let mut items = Vec::new();
    let mut page = start_page;
    let mut fetched = 0u32;

    loop {
        let batch = match fetch_decoded::<S, T>(source, path, page).await {
            Ok(batch) => batch,
            Err(e) if page == start_page => return Err(e),
            Err(e) => {
                warn!(path, page, error = %e, "stopping pagination early");
                break;
            }
        };
        fetched += 1;

        let len = batch.len();
        items.extend(batch);
        debug!(path, page, len, total = items.len(), "fetched page");

        if len != PER_PAGE {
            break;
        }
        if max_pages.is_some_and(|cap| fetched >= cap) {
            warn!(path, pages = fetched, "page cap reached, results may be incomplete");
            break;
        }
        page += 1;
    }

    Ok(items)
}

async fn fetch_decoded<S, T>(source: &S, path: &str, page: u32) -> Result<Vec<T>>
where
    S: PageSource,
    T: DeserializeOwned,
{
    let body = source.fetch_page(path, page, PER_PAGE).await?;
    serde_json::from_str(&body).map_err(|source_err| LeaderboardError::Decode {
        url: source.url_for(path),
        source: source_err,
    })
}
