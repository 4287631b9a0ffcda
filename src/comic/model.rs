//! Comic, chapter and metadata records produced by the page parser.

use serde::{Deserialize, Serialize};

/// Descriptive metadata written to `meta.json` next to the images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub author: String,
    pub area: String,
    pub alias_title: String,
    pub tags: Vec<String>,
    pub desc: String,
}

/// One chapter as listed on the comic's detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// Absolute URL of the chapter page.
    pub url: String,
    /// Chapter title. Unique within its comic; used as the directory name
    /// and progress key.
    pub title: String,
}

/// A comic parsed from its detail page. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comic {
    pub title: String,
    /// Absolute URL of the cover image.
    pub cover: String,
    pub meta: Meta,
    /// Chapters in the site's reading order.
    pub chapters: Vec<Chapter>,
}
