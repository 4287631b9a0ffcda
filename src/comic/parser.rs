//! HTML extraction for comic detail pages and chapter pages.
//!
//! The crawl pipeline depends only on the [`PageParser`] trait; the
//! [`SitePageParser`] implementation knows the site's markup.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use super::error::ParseError;
use super::model::{Chapter, Comic, Meta};

const TITLE: &str = ".detail-main-info-title";
const COVER: &str = ".detail-main-cover > img";
const AUTHOR_LINKS: &str = ".detail-main-info-author > a";
const TAGS: &str = ".detail-main-info-class a";
const DESC: &str = ".detail-desc";
const CHAPTER_ITEMS: &str = "#detail-list-select .chapteritem";
const CHAPTER_IMAGES: &str = "#cp_img img[data-original]";

/// Lazy image source attribute used by the site.
const LAZY_SRC: &str = "data-original";

#[allow(clippy::expect_used)]
fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid") // Static pattern, safe to panic
}

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector(TITLE));
static COVER_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector(COVER));
static AUTHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector(AUTHOR_LINKS));
static TAGS_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector(TAGS));
static DESC_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector(DESC));
static CHAPTER_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector(CHAPTER_ITEMS));
static IMAGE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector(CHAPTER_IMAGES));

/// Turns fetched HTML into comics and chapter image lists.
pub trait PageParser: Send + Sync {
    /// Parses a comic detail page.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when the title, cover or a chapter link is missing.
    fn parse_comic(&self, html: &str) -> Result<Comic, ParseError>;

    /// Parses a chapter page into its image URLs, in reading order.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when an image link cannot be resolved.
    fn parse_chapter(&self, html: &str) -> Result<Vec<String>, ParseError>;
}

/// Parser for the comic site's detail and chapter markup.
///
/// Relative links are resolved against the configured base URL.
#[derive(Debug, Clone)]
pub struct SitePageParser {
    base_url: Url,
}

impl SitePageParser {
    /// Creates a parser resolving links against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidLink`] if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, ParseError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ParseError::invalid_link(base_url, base_url, e))?;
        Ok(Self { base_url })
    }

    fn resolve(&self, link: &str) -> Result<String, ParseError> {
        self.base_url
            .join(link)
            .map(String::from)
            .map_err(|e| ParseError::invalid_link(link, self.base_url.as_str(), e))
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).next().map(element_text)
}

impl PageParser for SitePageParser {
    #[instrument(level = "debug", skip(self, html), fields(bytes = html.len()))]
    fn parse_comic(&self, html: &str) -> Result<Comic, ParseError> {
        let document = Html::parse_document(html);

        let title = first_text(&document, &TITLE_SELECTOR)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ParseError::missing_element("comic title", TITLE))?;

        let cover_element = document
            .select(&COVER_SELECTOR)
            .next()
            .ok_or_else(|| ParseError::missing_element("cover image", COVER))?;
        let cover_link = cover_element
            .value()
            .attr(LAZY_SRC)
            .map(str::trim)
            .filter(|src| !src.is_empty())
            .ok_or_else(|| ParseError::missing_attribute("cover image", LAZY_SRC))?;
        let cover = self.resolve(cover_link)?;

        let authors: Vec<String> = document.select(&AUTHOR_SELECTOR).map(element_text).collect();
        let author_at = |i: usize| authors.get(i).cloned().unwrap_or_default();

        let meta = Meta {
            alias_title: author_at(0),
            author: author_at(1),
            area: author_at(2),
            tags: document.select(&TAGS_SELECTOR).map(element_text).collect(),
            desc: first_text(&document, &DESC_SELECTOR).unwrap_or_default(),
        };

        let chapters = document
            .select(&CHAPTER_SELECTOR)
            .map(|item| {
                let href = item
                    .value()
                    .attr("href")
                    .ok_or_else(|| ParseError::missing_attribute("chapter item", "href"))?;
                let title = element_text(item);
                if title.is_empty() {
                    return Err(ParseError::missing_element("chapter title", CHAPTER_ITEMS));
                }
                Ok(Chapter {
                    url: self.resolve(href)?,
                    title,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(title = %title, chapters = chapters.len(), "parsed comic page");
        Ok(Comic {
            title,
            cover,
            meta,
            chapters,
        })
    }

    #[instrument(level = "debug", skip(self, html), fields(bytes = html.len()))]
    fn parse_chapter(&self, html: &str) -> Result<Vec<String>, ParseError> {
        let document = Html::parse_document(html);
        document
            .select(&IMAGE_SELECTOR)
            .filter_map(|img| img.value().attr(LAZY_SRC).map(str::trim))
            .filter(|src| !src.is_empty())
            .map(|src| self.resolve(src))
            .collect()
    }
}
