//! Uploaded transaction batches

/// Cell tokens read as missing values (the pandas `read_csv` NA set)
pub const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a raw cell holds no value
pub fn is_missing(cell: &str) -> bool {
    NA_TOKENS.contains(&cell)
}

/// One transaction as uploaded.
///
/// Cells keep their raw text so the exported report reproduces the input
/// verbatim; numeric parsing happens only when a column enters the feature
/// matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<String>,
}

impl Record {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Raw cell at `index`, or `None` past the end of the row
    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when every cell is missing
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|cell| is_missing(cell))
    }
}

/// A parsed upload: ordered column names plus the rows under them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionBatch {
    columns: Vec<String>,
    records: Vec<Record>,
    /// Fully-empty rows removed at ingest
    dropped_rows: usize,
}

impl TransactionBatch {
    /// Build a batch, discarding rows whose cells are all missing.
    ///
    /// Every record must be as wide as `columns`.
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        debug_assert!(records.iter().all(|r| r.len() == columns.len()));

        let total = records.len();
        let records: Vec<Record> = records.into_iter().filter(|r| !r.is_blank()).collect();
        let dropped_rows = total - records.len();

        Self {
            columns,
            records,
            dropped_rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// First `n` records, for previews
    pub fn head(&self, n: usize) -> &[Record] {
        &self.records[..n.min(self.records.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cells: &[&str]) -> Record {
        Record::new(cells.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn test_missing_tokens() {
        assert!(is_missing(""));
        assert!(is_missing("NaN"));
        assert!(is_missing("null"));
        assert!(!is_missing("0"));
        assert!(!is_missing(" "));
    }

    #[test]
    fn test_blank_rows_are_dropped() {
        let batch = TransactionBatch::new(
            vec!["Time".into(), "Amount".into()],
            vec![
                record(&["1", "2.5"]),
                record(&["", "NaN"]),
                record(&["", "3"]),
            ],
        );

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.dropped_rows(), 1);
        assert_eq!(batch.records()[1].get(1), Some("3"));
    }

    #[test]
    fn test_head_is_bounded() {
        let batch = TransactionBatch::new(vec!["A".into()], vec![record(&["1"])]);
        assert_eq!(batch.head(5).len(), 1);
        assert_eq!(batch.head(0).len(), 0);
    }
}
