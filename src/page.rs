use std::{
    io::Write,
    path::{Path, PathBuf},
};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tera::Tera;
use time::{macros::format_description, Date, OffsetDateTime};

use crate::{config::PageConfig, model::offer::Offer};

const OFFER_TEMPLATE: &str = "offer.html";
const TITLE_SLUG_LEN: usize = 30;
const ID_HASH_LEN: usize = 8;

/// Everything the landing page template sees.
#[derive(Serialize, Clone, Debug)]
pub struct Page<'a> {
    pub offer_id: Option<&'a str>,
    pub app_title: &'a str,
    pub ad_headline: &'a str,
    pub promo_text: &'a str,
    pub icon_url: Option<&'a str>,
    pub tracking_link: &'a str,
    pub remain: Option<u64>,
    #[serde(with = "time::serde::rfc3339")]
    pub generated: OffsetDateTime,
}

impl<'a> Page<'a> {
    pub fn new(offer: &'a Offer, defaults: &'a PageConfig, generated: OffsetDateTime) -> Self {
        let ad_headline = non_empty(&offer.headline).unwrap_or(defaults.default_headline.as_str());

        Page {
            offer_id: offer.offer_id(),
            app_title: non_empty(&offer.title).unwrap_or(defaults.default_title.as_str()),
            ad_headline,
            promo_text: non_empty(&offer.promo_text).unwrap_or(ad_headline),
            icon_url: offer.icon(),
            tracking_link: non_empty(&offer.tracking_link).unwrap_or(defaults.default_link.as_str()),
            remain: offer.remain,
            generated,
        }
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|text| !text.trim().is_empty())
}

pub struct Renderer {
    tera: Tera,
    defaults: PageConfig,
}

impl Renderer {
    pub fn new(defaults: PageConfig) -> crate::model::Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html"]);
        tera.add_raw_template(OFFER_TEMPLATE, include_str!("../templates/offer.html"))?;
        Ok(Renderer { tera, defaults })
    }

    pub fn render(&self, offer: &Offer, generated: OffsetDateTime) -> crate::model::Result<String> {
        let page = Page::new(offer, &self.defaults, generated);
        let context = tera::Context::from_serialize(&page)?;
        Ok(self.tera.render(OFFER_TEMPLATE, &context)?)
    }

    /// `<date>_<title slug>_<id slug>-<id hash>.html`
    ///
    /// Slugs fold case and punctuation, so the hash of the raw id keeps
    /// distinct ids apart.
    pub fn file_name(&self, offer: &Offer, date: Date) -> crate::model::Result<String> {
        let date = date.format(format_description!("[year]-[month]-[day]"))?;

        let title = non_empty(&offer.title).unwrap_or(self.defaults.default_title.as_str());
        let mut title = slug::slugify(title);
        title.truncate(TITLE_SLUG_LEN);
        let title = title.trim_end_matches('-');
        let title = if title.is_empty() { "offer" } else { title };

        Ok(match offer.offer_id() {
            Some(id) => {
                let mut hash = hex::encode(Sha256::digest(id.as_bytes()));
                hash.truncate(ID_HASH_LEN);
                match slug::slugify(id) {
                    slug if slug.is_empty() => format!("{date}_{title}_{hash}.html"),
                    slug => format!("{date}_{title}_{slug}-{hash}.html"),
                }
            }
            None => format!("{date}_{title}.html"),
        })
    }
}

/// Whether the page at `path` was rendered for offer `id`.
pub fn page_belongs_to(path: &Path, id: &str) -> crate::model::Result<bool> {
    let html = std::fs::read_to_string(path)?;
    let marker = format!(
        "<meta name=\"offer-id\" content=\"{}\" />",
        tera::escape_html(id)
    );
    Ok(html.contains(&marker))
}

/// Write a page into `dir`. Existing pages are never overwritten.
pub fn write_page(dir: &Path, name: &str, html: &str) -> crate::model::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);

    let mut file = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
    {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(crate::model::Error::PageExists(path));
        }
        Err(err) => return Err(err.into()),
    };

    file.write_all(html.as_bytes())?;
    Ok(path)
}
