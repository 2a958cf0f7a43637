use std::path::PathBuf;

use time::OffsetDateTime;

use crate::{
    config::Config,
    fetch::fetch_offers,
    model::{
        offer::{select_unpublished, Offer},
        published::PublishedSet,
        Error, Result,
    },
    page::{page_belongs_to, write_page, Renderer},
    sitemap,
};

#[derive(Debug, Default)]
pub struct Report {
    pub pages: Vec<PathBuf>,
    pub sitemap: Option<PathBuf>,
}

/// Render and write pages for the offers not yet in `published`, then persist
/// the ids that got a page. Leaves the published file alone when nothing is new.
pub fn publish(
    config: &Config,
    offers: Vec<Offer>,
    published: &mut PublishedSet,
    now: OffsetDateTime,
) -> Result<Vec<PathBuf>> {
    let selected = select_unpublished(offers, published, config.output.max_offers);
    if selected.is_empty() {
        tracing::info!("no new offers to publish");
        return Ok(Vec::new());
    }

    let before = published.len();
    let outcome = write_pages(config, &selected, published, now);

    if published.len() != before {
        published.save(&config.output.published_file)?;
        tracing::info!(
            "recorded {} new offer ids in {}",
            published.len() - before,
            config.output.published_file.display()
        );
        tracing::debug!(
            "newly published: {:?}",
            published.iter().skip(before).collect::<Vec<_>>()
        );
    }

    outcome
}

fn write_pages(
    config: &Config,
    selected: &[Offer],
    published: &mut PublishedSet,
    now: OffsetDateTime,
) -> Result<Vec<PathBuf>> {
    let renderer = Renderer::new(config.page.clone())?;
    let mut pages = Vec::new();

    for offer in selected {
        let Some(id) = offer.offer_id() else {
            continue;
        };

        let html = renderer.render(offer, now)?;
        let name = renderer.file_name(offer, now.date())?;

        match write_page(&config.output.dir, &name, &html) {
            Ok(path) => {
                tracing::info!("wrote {} for offer {}", path.display(), id);
                pages.push(path);
            }

            Err(Error::PageExists(path)) if page_belongs_to(&path, id)? => {
                tracing::warn!("{} already exists, keeping it for offer {}", path.display(), id);
            }

            Err(Error::PageExists(path)) => {
                tracing::warn!(
                    "{} belongs to another offer, not publishing offer {}",
                    path.display(),
                    id
                );
                continue;
            }

            Err(err) => return Err(err),
        }

        published.insert(id);
    }

    Ok(pages)
}

pub fn write_sitemap(config: &Config, now: OffsetDateTime) -> Result<PathBuf> {
    let pages = sitemap::collect_pages(&config.output.dir)?;
    let xml = sitemap::render(
        &config.sitemap.base_url,
        &config.sitemap.page_prefix,
        &pages,
        now.date(),
    )?;
    let path = sitemap::write(&config.sitemap.path, &xml)?;
    tracing::info!("sitemap {} lists {} pages", path.display(), pages.len());
    Ok(path)
}

/// The sitemap is refreshed when pages were written, or when it doesn't exist
/// yet but the output directory already has pages.
fn sitemap_due(config: &Config, pages_written: bool) -> Result<bool> {
    if !config.sitemap.enabled {
        return Ok(false);
    }
    if pages_written {
        return Ok(true);
    }
    Ok(!config.sitemap.path.exists()
        && !sitemap::collect_pages(&config.output.dir)?.is_empty())
}

/// One full run: load state, fetch, publish, and refresh the sitemap.
pub async fn run(config: &Config, now: OffsetDateTime) -> Result<Report> {
    let mut published = PublishedSet::load(&config.output.published_file);
    if published.is_empty() {
        tracing::info!("no offers published yet");
    } else {
        tracing::info!("{} offers already published", published.len());
    }

    let offers = fetch_offers(&config.api).await;
    let pages = publish(config, offers, &mut published, now)?;

    let sitemap = if sitemap_due(config, !pages.is_empty())? {
        Some(write_sitemap(config, now)?)
    } else {
        None
    };

    Ok(Report { pages, sitemap })
}
