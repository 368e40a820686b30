//! Client library for clippings.
//!
//! This crate provides the two-tier fetch strategies, HTML normalization
//! and article extraction, and the sequential batch orchestrator shared by
//! the CLI and anything else driving a scrape.

pub mod batch;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod render;

pub use batch::{BatchOutcome, BatchRunner, DelayPolicy, StatusEvent, StatusSender};
pub use extract::{NO_CONTENT, NO_TITLE, collect_headings, locate_content, resolve_title};
pub use fetch::{Fetch, FetchClient, FetchConfig, FetchResponse, canonicalize};
pub use pipeline::{ExtractionPipeline, FetchStrategy};
pub use render::{DisabledSessionFactory, RenderOptions, Renderer, SessionFactory};

#[cfg(feature = "render")]
pub use render::{HeadlessSession, HeadlessSessionFactory};
