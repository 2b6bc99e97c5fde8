//! "Fetch all pages" strategy shared by every collection endpoint

use crate::error::{Error, Result};
use crate::http::client::{parse_json, RateLimitedClient};
use crate::traits::HttpTransport;
use crate::types::FetchOutcome;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Where a page's items live in the response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageShape {
    /// The body is the item array (`/deployments`, `/orgs/{org}/repos`)
    Array,
    /// The items are under one field (`{"total_count": n, "workflow_runs": [...]}`)
    Field(&'static str),
    /// Either of the above, depending on the endpoint version
    ArrayOrField(&'static str),
}

impl PageShape {
    /// Pull the raw items out of a page body
    pub fn extract(&self, body: Value) -> Result<Vec<Value>> {
        let key = match (self, body) {
            (PageShape::Array | PageShape::ArrayOrField(_), Value::Array(items)) => {
                return Ok(items)
            }
            (PageShape::Field(key) | PageShape::ArrayOrField(key), Value::Object(mut map)) => {
                match map.remove(*key) {
                    Some(Value::Array(items)) => return Ok(items),
                    Some(Value::Null) | None => return Ok(Vec::new()),
                    Some(_) => *key,
                }
            }
            (_, other) => {
                return Err(Error::Decode(format!(
                    "expected {:?} page, got {}",
                    self,
                    json_type(&other)
                )))
            }
        };
        Err(Error::Decode(format!("field `{}` is not an array", key)))
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decode a page's items into `I`
pub fn decode_items<I: DeserializeOwned>(shape: PageShape, body: Value) -> Result<Vec<I>> {
    shape
        .extract(body)?
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(Error::from))
        .collect()
}

fn page_query(base: &[(String, String)], per_page: u32, page: u32) -> Vec<(String, String)> {
    let mut query = base.to_vec();
    query.push(("per_page".to_string(), per_page.to_string()));
    query.push(("page".to_string(), page.to_string()));
    query
}

/// Fetch every page of a collection.
///
/// Follows the `Link: rel="next"` header when the server sends one;
/// otherwise requests the next page number until a page comes back empty
/// or shorter than `per_page`. All cursor state is local to the call.
///
/// A 404 on the first page yields `Absent`; a failure on any page fails
/// the whole collection so a truncated list is never mistaken for a
/// complete one.
pub async fn fetch_all<T, I>(
    client: &RateLimitedClient<T>,
    url: &str,
    base_query: &[(String, String)],
    shape: PageShape,
) -> FetchOutcome<Vec<I>>
where
    T: HttpTransport,
    I: DeserializeOwned,
{
    let per_page = client.config().per_page;
    let max_pages = client.config().max_pages;

    let mut items: Vec<I> = Vec::new();
    let mut next_url = url.to_string();
    let mut page = 1u32;
    let mut query = page_query(base_query, per_page, page);
    let mut pages_fetched = 0u32;

    loop {
        let response = match client.get_raw(&next_url, &query).await {
            FetchOutcome::Found(response) => response,
            FetchOutcome::Absent if pages_fetched == 0 => return FetchOutcome::Absent,
            FetchOutcome::Absent => {
                return FetchOutcome::Failed(Error::NotFound(format!(
                    "page {} of {} disappeared",
                    pages_fetched + 1,
                    url
                )))
            }
            FetchOutcome::Failed(e) => return FetchOutcome::Failed(e),
        };
        pages_fetched += 1;

        let page_items: Vec<I> =
            match parse_json(&next_url, &response.body).and_then(|body| decode_items(shape, body)) {
                Ok(page_items) => page_items,
                Err(e) => return FetchOutcome::Failed(e),
            };
        let count = page_items.len();
        items.extend(page_items);
        debug!(url, page = pages_fetched, count, "Fetched page");

        if let Some(link) = response.next_link {
            next_url = link;
            query.clear();
        } else if count == 0 || count < per_page as usize {
            break;
        } else {
            page = pages_fetched + 1;
            next_url = url.to_string();
            query = page_query(base_query, per_page, page);
        }

        if pages_fetched >= max_pages {
            warn!(url, max_pages, "Page limit reached");
            return FetchOutcome::Failed(Error::Other(format!(
                "{} has more than {} pages",
                url, max_pages
            )));
        }
    }

    FetchOutcome::Found(items)
}
