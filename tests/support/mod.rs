//! Fixture comic site served by wiremock, plus context builders.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use comic_crawler::{
    CrawlContext, CrawlSettings, HttpClient, HttpClientOptions, PageParser, ProgressStore,
    RetryPolicy, SitePageParser,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const COMIC_TITLE: &str = "Test Comic";
pub const COMIC_PATH: &str = "/book/1";

/// A comic with `chapters[k]` images in chapter `k + 1`.
pub struct FixtureSite {
    pub server: MockServer,
    pub chapters: Vec<usize>,
}

pub fn chapter_title(chapter: usize) -> String {
    format!("Chapter {chapter}")
}

pub fn image_path(chapter: usize, index: usize) -> String {
    format!("/img/{chapter}/{index}.jpg")
}

pub fn image_body(chapter: usize, index: usize) -> Vec<u8> {
    format!("image-{chapter}-{index}").into_bytes()
}

fn detail_page(chapters: &[usize]) -> String {
    let items: String = (1..=chapters.len())
        .map(|k| {
            format!(
                r#"<a class="chapteritem" href="/chapter/{k}.html">{}</a>"#,
                chapter_title(k)
            )
        })
        .collect();
    format!(
        r#"<html><body>
        <div class="detail-main-cover"><img data-original="/cover.jpg"></div>
        <p class="detail-main-info-title">{COMIC_TITLE}</p>
        <p class="detail-main-info-author"><a>Alias</a><a>Author</a><a>Area</a></p>
        <p class="detail-main-info-class"><a>tag-a</a><a>tag-b</a></p>
        <p class="detail-desc">A comic used in tests.</p>
        <div id="detail-list-select">{items}</div>
        </body></html>"#
    )
}

fn chapter_page(chapter: usize, images: usize) -> String {
    let imgs: String = (0..images)
        .map(|i| format!(r#"<img data-original="{}">"#, image_path(chapter, i)))
        .collect();
    format!(r#"<html><body><div id="cp_img">{imgs}</div></body></html>"#)
}

impl FixtureSite {
    pub async fn start(chapters: &[usize]) -> Self {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(COMIC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(chapters)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cover.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"cover".to_vec()))
            .mount(&server)
            .await;

        for (k, &images) in chapters.iter().enumerate() {
            let chapter = k + 1;
            Mock::given(method("GET"))
                .and(path(format!("/chapter/{chapter}.html")))
                .respond_with(
                    ResponseTemplate::new(200).set_body_string(chapter_page(chapter, images)),
                )
                .mount(&server)
                .await;
            for i in 0..images {
                Mock::given(method("GET"))
                    .and(path(image_path(chapter, i)))
                    .respond_with(ResponseTemplate::new(200).set_body_bytes(image_body(chapter, i)))
                    .mount(&server)
                    .await;
            }
        }

        Self {
            server,
            chapters: chapters.to_vec(),
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn comic_url(&self) -> String {
        format!("{}{COMIC_PATH}", self.server.uri())
    }

    /// Requests received so far whose path starts with `prefix`.
    pub async fn requests_under(&self, prefix: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path().starts_with(prefix))
            .count()
    }

    pub async fn image_requests(&self) -> usize {
        self.requests_under("/img/").await
    }
}

/// Context writing under `root/comics` and `root/archives` with fast retries.
pub fn context(
    site_uri: &str,
    root: &Path,
    store: Arc<dyn ProgressStore>,
    max_attempts: u32,
) -> CrawlContext {
    let client = HttpClient::with_options(HttpClientOptions {
        retry_policy: RetryPolicy::new(max_attempts, Duration::from_millis(5)),
        ..HttpClientOptions::default()
    })
    .expect("client builds");
    let parser: Arc<dyn PageParser> =
        Arc::new(SitePageParser::new(site_uri).expect("mock server URI is absolute"));
    CrawlContext::new(
        client,
        store,
        parser,
        CrawlSettings {
            download_dir: root.join("comics"),
            archive_dir: root.join("archives"),
            ..CrawlSettings::default()
        },
    )
    .expect("default bounds are valid")
}
