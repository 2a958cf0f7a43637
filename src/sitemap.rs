use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::Tera;
use time::{macros::format_description, Date};

use crate::config::DirUrl;

const SITEMAP_TEMPLATE: &str = "sitemap.xml";

#[derive(Serialize)]
struct Sitemap {
    locs: Vec<String>,
    lastmod: String,
}

/// Sorted names of the `.html` files directly inside `dir`.
pub fn collect_pages(dir: &Path) -> crate::model::Result<Vec<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut pages = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "html") {
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                pages.push(name.to_owned());
            }
        }
    }

    pages.sort();
    Ok(pages)
}

pub fn render(
    base_url: &DirUrl,
    page_prefix: &str,
    pages: &[String],
    date: Date,
) -> crate::model::Result<String> {
    let prefix = if page_prefix.is_empty() || page_prefix.ends_with('/') {
        base_url.join(page_prefix)?
    } else {
        base_url.join(&format!("{page_prefix}/"))?
    };

    let mut locs = vec![xml_escape(base_url.as_str())];
    for page in pages {
        locs.push(xml_escape(prefix.join(page)?.as_str()));
    }

    let sitemap = Sitemap {
        locs,
        lastmod: date.format(format_description!("[year]-[month]-[day]"))?,
    };

    let mut tera = Tera::default();
    tera.autoescape_on(Vec::new());
    tera.add_raw_template(SITEMAP_TEMPLATE, include_str!("../templates/sitemap.xml"))?;
    Ok(tera.render(SITEMAP_TEMPLATE, &tera::Context::from_serialize(&sitemap)?)?)
}

pub fn write(path: &Path, xml: &str) -> crate::model::Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, xml)?;
    Ok(path.to_path_buf())
}

fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use url::Url;

    fn base() -> DirUrl {
        DirUrl::new(Url::parse("https://someone.github.io/landing").unwrap())
    }

    #[test]
    fn lists_only_html_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.html"), "").unwrap();
        std::fs::write(dir.path().join("a.html"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested.html")).unwrap();

        let pages = collect_pages(dir.path()).unwrap();
        assert_eq!(pages, vec!["a.html", "b.html"]);
    }

    #[test]
    fn missing_dir_has_no_pages() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_pages(&dir.path().join("ads")).unwrap().is_empty());
    }

    #[test]
    fn root_then_pages() {
        let pages = vec!["2026-10-15_x_1.html".to_owned()];
        let xml = render(&base(), "ads", &pages, date!(2026 - 10 - 15)).unwrap();

        let root = xml.find("<loc>https://someone.github.io/landing/</loc>").unwrap();
        let page = xml
            .find("<loc>https://someone.github.io/landing/ads/2026-10-15_x_1.html</loc>")
            .unwrap();
        assert!(root < page);
        assert_eq!(xml.matches("<url>").count(), 2);
        assert_eq!(xml.matches("<lastmod>2026-10-15</lastmod>").count(), 2);
        assert!(xml.starts_with("<?xml"));
    }

    #[test]
    fn empty_site_lists_root() {
        let xml = render(&base(), "ads/", &[], date!(2026 - 10 - 15)).unwrap();
        assert_eq!(xml.matches("<url>").count(), 1);
    }

    #[test]
    fn escapes_locs() {
        let base = DirUrl::new(Url::parse("https://a.example/?x=1&y=2").unwrap());
        let xml = render(&base, "", &[], date!(2026 - 10 - 15)).unwrap();
        assert!(xml.contains("&amp;y=2"));
    }

    #[test]
    fn writes_into_new_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ads").join("sitemap.xml");
        write(&path, "<urlset/>").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<urlset/>");
    }
}
