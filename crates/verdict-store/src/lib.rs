//! Batch ingestion: tab-separated review files into a [`ReviewCorpus`].

mod error;
pub use error::StoreError;

pub mod tsv;
pub use tsv::{ReviewCorpus, extract_column, load_corpus, parse_rows, read_corpus};
