use std::collections::HashSet;

use serde::{de::IgnoredAny, Deserialize, Deserializer};
use serde_json::Value;

use crate::model::published::PublishedSet;

/// One campaign as returned by the offer api.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Offer {
    #[serde(rename = "apOffer", default, deserialize_with = "loose_string")]
    pub id: Option<String>,
    #[serde(rename = "apAppTitle", default, deserialize_with = "loose_string")]
    pub title: Option<String>,
    #[serde(rename = "apHeadline", default, deserialize_with = "loose_string")]
    pub headline: Option<String>,
    #[serde(rename = "apAppPromoText", default, deserialize_with = "loose_string")]
    pub promo_text: Option<String>,
    #[serde(rename = "apImages", default)]
    pub images: Value,
    #[serde(rename = "apTrackingLink", default, deserialize_with = "loose_string")]
    pub tracking_link: Option<String>,
    #[serde(rename = "apRemain", default, deserialize_with = "loose_count")]
    pub remain: Option<u64>,
}

impl Offer {
    pub fn icon(&self) -> Option<&str> {
        self.images
            .get("icon")
            .and_then(Value::as_str)
            .filter(|icon| !icon.is_empty())
    }

    /// The identifier, if present and non-empty.
    pub fn offer_id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Text(String),
    Number(serde_json::Number),
    Other(IgnoredAny),
}

fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Text(text)) => Some(text),
        Some(Loose::Number(number)) => Some(number.to_string()),
        Some(Loose::Other(_)) | None => None,
    })
}

fn loose_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Text(text)) => text.trim().replace(',', "").parse().ok(),
        Some(Loose::Number(number)) => number.as_u64(),
        Some(Loose::Other(_)) | None => None,
    })
}

/// Turn a response body into offers.
///
/// Accepts an array of offers, a single offer object, or an object whose
/// values are offers. Entries that aren't offer-shaped are dropped.
pub fn offers_from_json(body: Value) -> Vec<Offer> {
    let entries = match body {
        Value::Array(items) => items,
        Value::Object(map) if map.contains_key("apOffer") => vec![Value::Object(map)],
        Value::Object(map) => map.into_iter().map(|(_, value)| value).collect(),
        other => {
            tracing::warn!("offer response is neither an array nor an object: {}", other);
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|entry| match serde_json::from_value::<Offer>(entry) {
            Ok(offer) => Some(offer),
            Err(err) => {
                tracing::warn!("skipping malformed offer: {}", err);
                None
            }
        })
        .collect()
}

/// Pick offers not yet published, in the order given, at most `max` of them.
pub fn select_unpublished(offers: Vec<Offer>, published: &PublishedSet, max: usize) -> Vec<Offer> {
    let mut seen = HashSet::new();
    offers
        .into_iter()
        .filter(|offer| match offer.offer_id() {
            Some(id) => !published.contains(id) && seen.insert(id.to_owned()),
            None => {
                tracing::debug!("skipping offer without id: {:?}", offer.title);
                false
            }
        })
        .take(max)
        .collect()
}
