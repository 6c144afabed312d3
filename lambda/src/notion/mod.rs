pub mod client;

pub use client::{DocumentExporter, NotionClient};
