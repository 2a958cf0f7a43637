use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client, ClientBuilder,
};
use serde::Serialize;
use url::Url;

use crate::{
    config::ApiConfig,
    model::{
        offer::{offers_from_json, Offer},
        Error, Result,
    },
};

// Browser-like request headers. The user agent comes from config.
pub const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("accept", "application/json, text/plain, */*"),
    ("accept-language", "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"),
];

#[derive(Serialize)]
struct OfferQuery<'a> {
    affid: &'a str,
    order: &'a str,
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (k, v) in DEFAULT_HEADERS {
        if let Ok(val) = HeaderValue::from_str(v) {
            headers.insert(HeaderName::from_static(*k), val);
        }
    }
    headers
}

pub fn build_client(api: &ApiConfig) -> Result<Client> {
    Ok(ClientBuilder::new()
        .user_agent(api.user_agent.as_str())
        .default_headers(default_headers())
        .timeout(api.timeout())
        .build()?)
}

/// The endpoint with `affid` and `order` appended to whatever query it already has.
pub fn offers_url(api: &ApiConfig) -> Result<Url> {
    let mut url = api.endpoint.clone();
    let query = serde_urlencoded::to_string(OfferQuery {
        affid: &api.affid,
        order: api.order.as_str(),
    })?;

    let query = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{existing}&{query}"),
        _ => query,
    };
    url.set_query(Some(&query));
    Ok(url)
}

async fn try_fetch(api: &ApiConfig) -> Result<Vec<Offer>> {
    let url = offers_url(api)?;
    tracing::debug!("requesting {}", url);

    let response = build_client(api)?.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Status { status, body });
    }

    let body = response.bytes().await?;
    let value: serde_json::Value = serde_json::from_slice(&body)?;
    Ok(offers_from_json(value))
}

/// Fetch the current offers. Any failure is logged and reads as no offers.
pub async fn fetch_offers(api: &ApiConfig) -> Vec<Offer> {
    match try_fetch(api).await {
        Ok(offers) => {
            tracing::info!("fetched {} offers", offers.len());
            offers
        }
        Err(err) => {
            tracing::warn!("offer fetch failed: {}", err);
            Vec::new()
        }
    }
}
