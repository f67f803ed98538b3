//! TSV review files.
//!
//! Parsing goes through Arrow's CSV reader (tab delimiter, header row, type
//! inference), then each batch is re-encoded as JSON objects so that rows
//! keep per-cell types: a column that only holds numbers yields numbers,
//! empty cells are dropped from their row. Projection then keeps string
//! cells only.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::json::ArrayWriter;
use arrow::record_batch::RecordBatch;
use serde_json::Value;
use tracing::{debug, info};

use crate::StoreError;

const DELIMITER: u8 = b'\t';

/// Review texts extracted from one bulk file, in file order.
///
/// Owned by the caller and replaced wholesale on each load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewCorpus {
    reviews: Vec<String>,
}

impl ReviewCorpus {
    pub fn new(reviews: Vec<String>) -> Self {
        Self { reviews }
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.reviews.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.reviews
    }

    pub fn into_inner(self) -> Vec<String> {
        self.reviews
    }
}

impl<'a> IntoIterator for &'a ReviewCorpus {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.reviews.iter()
    }
}

/// Parse tab-separated `content` (first line is the header) into row objects.
///
/// Any row-level problem fails the whole parse; only the first is reported.
pub fn parse_rows(content: &str) -> Result<Vec<Value>, StoreError> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let format = Format::default().with_header(true).with_delimiter(DELIMITER);
    let (schema, records) = format.infer_schema(Cursor::new(content.as_bytes()), None)?;
    debug!(columns = schema.fields().len(), records, "inferred TSV schema");

    let reader = ReaderBuilder::new(Arc::new(schema))
        .with_header(true)
        .with_delimiter(DELIMITER)
        .build(Cursor::new(content.as_bytes()))?;

    let batches = reader.collect::<Result<Vec<RecordBatch>, _>>()?;
    batches_to_rows(&batches)
}

/// Re-encode Arrow batches as one JSON object per row.
fn batches_to_rows(batches: &[RecordBatch]) -> Result<Vec<Value>, StoreError> {
    let mut writer = ArrayWriter::new(Vec::new());
    let refs: Vec<&RecordBatch> = batches.iter().collect();
    writer.write_batches(&refs)?;
    writer.finish()?;
    let buf = writer.into_inner();
    if buf.is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_slice::<Value>(&buf)? {
        Value::Array(rows) => Ok(rows),
        other => Err(StoreError::Parse(format!(
            "expected a list of rows, got {}",
            if other.is_object() { "an object" } else { "a scalar" }
        ))),
    }
}

/// Pull the trimmed, non-empty string values of `column` out of `rows`.
///
/// Rows that are not objects, or whose cell is missing or not a string, are
/// skipped. Order and duplicates are preserved.
pub fn extract_column(rows: &[Value], column: &str) -> Vec<String> {
    rows.iter()
        .filter_map(Value::as_object)
        .filter_map(|row| row.get(column).and_then(Value::as_str))
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `content` and extract `column` in one step.
pub fn load_corpus(content: &str, column: &str) -> Result<ReviewCorpus, StoreError> {
    let rows = parse_rows(content)?;
    let reviews = extract_column(&rows, column);
    info!(rows = rows.len(), reviews = reviews.len(), column, "loaded review corpus");
    Ok(ReviewCorpus::new(reviews))
}

/// Read a TSV file from disk and extract `column`.
pub async fn read_corpus(path: &Path, column: &str) -> Result<ReviewCorpus, StoreError> {
    if !path.exists() {
        return Err(StoreError::FileNotFound(path.to_path_buf()));
    }
    let content = tokio::fs::read_to_string(path).await?;
    load_corpus(&content, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn extract_skips_blank_missing_and_non_string_cells() {
        let rows = vec![
            json!({"text": "  good "}),
            json!({"text": ""}),
            json!({"other": "x"}),
            json!({"text": 123}),
        ];
        assert_eq!(extract_column(&rows, "text"), vec!["good".to_string()]);
    }

    #[test]
    fn extract_skips_non_object_rows_and_keeps_duplicates() {
        let rows = vec![
            json!(["text", "not a row"]),
            json!({"text": "fine"}),
            json!(null),
            json!({"text": "fine"}),
            json!({"text": "   "}),
        ];
        assert_eq!(extract_column(&rows, "text"), vec!["fine", "fine"]);
    }

    #[test]
    fn parse_tab_separated_rows() {
        let content = "id\ttext\n1\tGreat phone\n2\t  Battery died  \n";
        let rows = parse_rows(content).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["text"], "Great phone");
        assert_eq!(rows[1]["text"], "  Battery died  ");
        assert_eq!(rows[0]["id"], 1);
    }

    #[test]
    fn numeric_column_is_not_text() {
        let content = "text\tscore\n42\tgood\n7\tbad\n";
        let corpus = load_corpus(content, "text").unwrap();
        assert!(corpus.is_empty());
        let corpus = load_corpus(content, "score").unwrap();
        assert_eq!(corpus.as_slice(), ["good", "bad"]);
    }

    #[test]
    fn empty_cells_are_skipped() {
        let content = "text\tstars\nLoved it\t5\n\t3\nMeh\t2\n";
        let corpus = load_corpus(content, "text").unwrap();
        assert_eq!(corpus.into_inner(), vec!["Loved it", "Meh"]);
    }

    #[test]
    fn missing_column_yields_empty_corpus() {
        let corpus = load_corpus("review\nnice\n", "text").unwrap();
        assert!(corpus.is_empty());
    }

    #[test]
    fn empty_content_yields_no_rows() {
        assert!(parse_rows("").unwrap().is_empty());
        assert!(parse_rows("  \n").unwrap().is_empty());
    }

    #[test]
    fn ragged_row_is_parse_error() {
        let content = "id\ttext\n1\tfine\n2\ttoo\tmany\tfields\n";
        let err = parse_rows(content).unwrap_err();
        assert!(matches!(err, StoreError::Parse(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn read_corpus_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "text\tlang\nExcellent service\ten\n\ten\nTerrible\ten\n").unwrap();
        let corpus = read_corpus(file.path(), "text").await.unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.iter().next().map(String::as_str), Some("Excellent service"));
    }

    #[tokio::test]
    async fn read_missing_file_fails() {
        let err = read_corpus(Path::new("/nonexistent/reviews.tsv"), "text")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::FileNotFound(_)));
    }

    #[test]
    fn bundled_demo_file_loads() {
        let corpus = load_corpus(include_str!("../../../demos/reviews.tsv"), "text").unwrap();
        assert_eq!(corpus.len(), 4);
        assert_eq!(corpus.as_slice()[2], "It is okay, nothing special.");
    }
}
