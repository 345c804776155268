use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use svm_dashboard::data::model::gauss;

/// Survey items: (id, title, mean, std dev).
const SUBJECTS: [(&str, &str, f64, f64); 6] = [
    ("101", "Sleep quality", 6.5, 1.8),
    ("102", "Perceived stress", 4.0, 2.2),
    ("103", "Study hours", 5.5, 1.2),
    ("104", "Physical activity", 3.0, 2.5),
    ("105", "Screen time", 7.0, 1.5),
    ("106", "Social support", 6.0, 2.0),
];

const N_RESPONDENTS: usize = 120;
/// Fraction of answers left blank.
const MISSING_RATE: f64 = 0.05;

/// Scores on a 0–10 scale, rounded to halves, with some blanks.
fn generate_answers(rng: &mut impl Rng, mean: f64, std_dev: f64) -> Vec<Option<f64>> {
    (0..N_RESPONDENTS)
        .map(|_| {
            if rng.gen_bool(MISSING_RATE) {
                None
            } else {
                let v = (mean + gauss(rng, std_dev)).clamp(0.0, 10.0);
                Some((v * 2.0).round() / 2.0)
            }
        })
        .collect()
}

fn write_csv(path: &str, respondents: &[String], columns: &[Vec<Option<f64>>]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;

    let mut header = vec!["respondent".to_string()];
    header.extend(SUBJECTS.iter().map(|(id, ..)| id.to_string()));
    writer.write_record(&header)?;

    for (row, name) in respondents.iter().enumerate() {
        let mut record = vec![name.clone()];
        record.extend(
            columns
                .iter()
                .map(|col| col[row].map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, respondents: &[String], columns: &[Vec<Option<f64>>]) -> Result<()> {
    let mut fields = vec![Field::new("respondent", DataType::Utf8, false)];
    fields.extend(
        SUBJECTS
            .iter()
            .map(|(id, ..)| Field::new(*id, DataType::Float64, true)),
    );
    let schema = Arc::new(Schema::new(fields));

    let mut arrays: Vec<ArrayRef> = vec![Arc::new(StringArray::from(
        respondents.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
    ))];
    arrays.extend(
        columns
            .iter()
            .map(|col| Arc::new(Float64Array::from(col.clone())) as ArrayRef),
    );

    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;
    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn write_titles(path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(["id", "title"])?;
    for (id, title, ..) in SUBJECTS {
        writer.write_record([id, title])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let respondents: Vec<String> = (1..=N_RESPONDENTS).map(|i| format!("R{i:03}")).collect();
    let columns: Vec<Vec<Option<f64>>> = SUBJECTS
        .iter()
        .map(|&(_, _, mean, std_dev)| generate_answers(&mut rng, mean, std_dev))
        .collect();

    write_csv("sample_subjects.csv", &respondents, &columns)?;
    write_parquet("sample_subjects.parquet", &respondents, &columns)?;
    write_titles("sample_titles.csv")?;

    println!(
        "Wrote {} respondents x {} subjects to sample_subjects.csv / .parquet and sample_titles.csv",
        N_RESPONDENTS,
        SUBJECTS.len()
    );
    Ok(())
}
