pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod summary;
pub mod table;

pub use error::{PayloadFormat, PipelineError, Stage};
pub use extract::{
    extract_html, extract_json, extract_markup, extract_xml, Extraction, Extractor, Policy,
    Report, Selector,
};
pub use fetch::{Fetcher, FetcherConfig, RawPayload};
pub use normalize::normalize;
pub use pipeline::Pipeline;
pub use table::{Record, Table, Value};
