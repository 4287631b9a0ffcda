//! Network side of the crawl: retrying fetches and bounded task fan-out.
//!
//! # Features
//!
//! - Fixed browser User-Agent, HTTP/1.1 only by default
//! - Exponential backoff (base × 2^attempt) over a fixed attempt ceiling
//! - Streaming downloads straight to disk
//! - [`BoundedRunner`] for running tasks under a concurrency bound
//!
//! # Example
//!
//! ```no_run
//! use comic_crawler::download::HttpClient;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let file_path = client
//!     .download_to_file("https://example.com/cover.jpg", Path::new("./comics/x"), "cover.jpg")
//!     .await?;
//! println!("Downloaded: {}", file_path.display());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod filename;
mod retry;
mod runner;

pub use client::{HttpClient, HttpClientOptions};
pub use error::FetchError;
pub use filename::{image_filename, sanitize_filename};
pub use retry::{RetryDecision, RetryPolicy};
pub use runner::{BoundedRunner, RunReport, RunnerError, Task};
