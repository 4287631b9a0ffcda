//! Comic data model and page parsing.

mod error;
mod model;
mod parser;

pub use error::ParseError;
pub use model::{Chapter, Comic, Meta};
pub use parser::{PageParser, SitePageParser};
