use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{SubjectFrame, SubjectSeries, VariableTitles};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a subject frame from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – one column per subject, one row per observation
/// * `.json`    – `[{ "<subject>": <number|null>, ... }, ...]`
/// * `.parquet` – one numeric column per subject
///
/// Only numeric columns become subjects; anything else is skipped, the way a
/// descriptive summary of a mixed data frame ignores text columns.
pub fn load_frame(path: &Path) -> Result<SubjectFrame> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let frame = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    if frame.is_empty() {
        bail!("{} contains no numeric columns", path.display());
    }
    Ok(frame)
}

/// Load the variable-titles table: first column is the subject id, second
/// column its display title. Extra columns are ignored.
pub fn load_titles(path: &Path) -> Result<VariableTitles> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening titles CSV")?;

    let mut titles = VariableTitles::default();
    for (row_no, result) in reader.byte_records().enumerate() {
        let record = result.with_context(|| format!("titles CSV row {row_no}"))?;
        let (Some(id), Some(title)) = (record.get(0), record.get(1)) else {
            bail!("titles CSV row {row_no}: expected at least two columns");
        };
        titles.insert(
            String::from_utf8_lossy(id).trim(),
            String::from_utf8_lossy(title).trim(),
        );
    }
    Ok(titles)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Survey exports are not always valid UTF-8, so cells are read as bytes and
/// decoded lossily.
fn load_csv(path: &Path) -> Result<SubjectFrame> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .byte_headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim().to_string())
        .collect();
    let headers = mangle_duplicate_names(headers);

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.byte_records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        for (col_idx, column) in cells.iter_mut().enumerate() {
            let raw = record.get(col_idx).unwrap_or_default();
            column.push(String::from_utf8_lossy(raw).into_owned());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .filter_map(|(name, raw)| numeric_series(name, &raw))
        .collect();
    Ok(SubjectFrame::new(columns))
}

/// Parse a text column as numbers. Returns `None` for non-numeric columns.
fn numeric_series(name: String, raw: &[String]) -> Option<SubjectSeries> {
    let mut values = Vec::with_capacity(raw.len());
    for (row, cell) in raw.iter().enumerate() {
        match parse_cell(cell) {
            Ok(v) => values.push(v),
            Err(()) => {
                log::warn!("skipping non-numeric column '{name}' (row {row}: '{cell}')");
                return None;
            }
        }
    }
    Some(SubjectSeries::new(name, values))
}

fn parse_cell(cell: &str) -> Result<Option<f64>, ()> {
    let s = cell.trim();
    if s.is_empty() || matches!(s, "NA" | "N/A" | "NaN" | "nan" | "null") {
        return Ok(None);
    }
    s.parse::<f64>().map(Some).map_err(|_| ())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "101": 3.0, "102": 4.5 },
///   { "101": null, "102": 2.0 }
/// ]
/// ```
///
/// Subjects appear in first-seen key order; keys missing from a
/// record count as missing values.
fn load_json(path: &Path) -> Result<SubjectFrame> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut names: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let mut columns = Vec::with_capacity(names.len());
    'columns: for name in names {
        let mut values = Vec::with_capacity(records.len());
        for rec in records {
            match rec.get(&name) {
                None | Some(JsonValue::Null) => values.push(None),
                Some(JsonValue::Number(n)) => values.push(n.as_f64()),
                Some(other) => {
                    log::warn!("skipping non-numeric column '{name}' (value {other})");
                    continue 'columns;
                }
            }
        }
        columns.push(SubjectSeries::new(name, values));
    }
    Ok(SubjectFrame::new(columns))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by Pandas or Polars. Integer and float
/// columns become subjects; nulls become missing values.
fn load_parquet(path: &Path) -> Result<SubjectFrame> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    let names = mangle_duplicate_names(schema.fields().iter().map(|f| f.name().clone()).collect());
    let mut numeric: Vec<usize> = Vec::new();
    for (idx, field) in schema.fields().iter().enumerate() {
        if is_numeric(field.data_type()) {
            numeric.push(idx);
        } else {
            log::warn!("skipping non-numeric column '{}' ({})", names[idx], field.data_type());
        }
    }

    let reader = builder.build().context("building parquet reader")?;
    let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); numeric.len()];

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (column, &idx) in values.iter_mut().zip(&numeric) {
            let as_f64 = cast(batch.column(idx), &DataType::Float64)
                .with_context(|| format!("casting column '{}' to f64", names[idx]))?;
            let arr = as_f64
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array after cast")?;
            column.extend(arr.iter());
        }
    }

    let columns = numeric
        .iter()
        .zip(values)
        .map(|(&idx, column)| SubjectSeries::new(names[idx].clone(), column))
        .collect();
    Ok(SubjectFrame::new(columns))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Rename repeated column names the way pandas does on read: the second
/// `101` becomes `101.1`, the third `101.2`, skipping names already taken.
fn mangle_duplicate_names(names: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(names.len());
    names
        .into_iter()
        .map(|name| {
            if taken.insert(name.clone()) {
                return name;
            }
            let renamed = (1..)
                .map(|k| format!("{name}.{k}"))
                .find(|candidate| !taken.contains(candidate))
                .unwrap_or_default();
            log::warn!("duplicate column '{name}' renamed to '{renamed}'");
            taken.insert(renamed.clone());
            renamed
        })
        .collect()
}

fn is_numeric(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn csv_keeps_numeric_columns_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "data.csv", "name,102,101\nana,1,4\nluis,,5.5\n");

        let frame = load_frame(&path).unwrap();
        assert_eq!(frame.subject_names().collect::<Vec<_>>(), vec!["102", "101"]);
        assert_eq!(frame.columns[0].values, vec![Some(1.0), None]);
        assert_eq!(frame.columns[1].values, vec![Some(4.0), Some(5.5)]);
    }

    #[test]
    fn csv_without_numeric_columns_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "text.csv", "a,b\nx,y\n");
        assert!(load_frame(&path).is_err());
    }

    #[test]
    fn json_records_fill_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "data.json",
            r#"[{"A": 1, "B": "x"}, {"A": null}, {"A": 2.5}]"#,
        );

        let frame = load_frame(&path).unwrap();
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.columns[0].values, vec![Some(1.0), None, Some(2.5)]);
    }

    #[test]
    fn parquet_numeric_columns_become_subjects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("7", DataType::Int64, true),
            Field::new("label", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![Some(1), None, Some(3)])),
                Arc::new(StringArray::from(vec!["a", "b", "c"])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let frame = load_frame(&path).unwrap();
        assert_eq!(frame.subject_names().collect::<Vec<_>>(), vec!["7"]);
        assert_eq!(frame.columns[0].values, vec![Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn csv_duplicate_headers_get_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "dup.csv", "101,101,101.1\n1,100,7\n3,300,9\n");

        let frame = load_frame(&path).unwrap();
        assert_eq!(
            frame.subject_names().collect::<Vec<_>>(),
            vec!["101", "101.1", "101.1.1"]
        );
        assert_eq!(frame.columns[0].values, vec![Some(1.0), Some(3.0)]);
        assert_eq!(frame.columns[1].values, vec![Some(100.0), Some(300.0)]);
    }

    #[test]
    fn duplicate_ids_keep_separate_statistics() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "dup.csv", "101,101\n1,100\n3,300\n");

        let frame = load_frame(&path).unwrap();
        let table = crate::analysis::describe::build_frequency_table(&frame).unwrap();
        let ids: Vec<_> = table.subject_ids().collect();
        assert_eq!(ids, vec!["101", "101.1"]);
        let mean = &table.rows[1].values;
        assert_eq!(mean["101"], 2.0);
        assert_eq!(mean["101.1"], 200.0);
    }

    #[test]
    fn parquet_multiple_batches_are_concatenated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batches.parquet");

        let schema = Arc::new(Schema::new(vec![Field::new("5", DataType::Int64, true)]));
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema.clone(), None).unwrap();
        for chunk in [vec![Some(1), Some(2)], vec![None, Some(4)]] {
            let batch =
                RecordBatch::try_new(schema.clone(), vec![Arc::new(Int64Array::from(chunk))])
                    .unwrap();
            writer.write(&batch).unwrap();
        }
        writer.close().unwrap();

        let frame = load_frame(&path).unwrap();
        assert_eq!(frame.columns[0].values, vec![Some(1.0), Some(2.0), None, Some(4.0)]);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_frame(Path::new("scores.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn titles_map_ids_to_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "titles.csv", "id,title\n101, Anxiety score\n102,Sleep\n");

        let titles = load_titles(&path).unwrap();
        assert_eq!(titles.len(), 2);
        assert_eq!(titles.get("101"), Some("Anxiety score"));
        assert_eq!(titles.get("999"), None);
    }
}
