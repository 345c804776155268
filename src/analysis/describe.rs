use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::data::model::{SubjectFrame, SubjectSeries, VariableTitles};
use crate::error::{AnalysisError, AnalysisResult};

// ---------------------------------------------------------------------------
// Descriptive statistics of one series
// ---------------------------------------------------------------------------

/// Summary of the present (non-missing) values of a series.
///
/// Fields that are undefined for the sample size are NaN: everything but
/// `count` for an empty series, `std` for a single value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Description {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

/// The statistics of a [`Description`] in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Count,
    Mean,
    Std,
    Min,
    Q25,
    Q50,
    Q75,
    Max,
}

impl Statistic {
    pub const ALL: [Statistic; 8] = [
        Statistic::Count,
        Statistic::Mean,
        Statistic::Std,
        Statistic::Min,
        Statistic::Q25,
        Statistic::Q50,
        Statistic::Q75,
        Statistic::Max,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Statistic::Count => "count",
            Statistic::Mean => "mean",
            Statistic::Std => "std",
            Statistic::Min => "min",
            Statistic::Q25 => "25%",
            Statistic::Q50 => "50%",
            Statistic::Q75 => "75%",
            Statistic::Max => "max",
        }
    }
}

impl Description {
    pub fn get(&self, stat: Statistic) -> f64 {
        match stat {
            Statistic::Count => self.count as f64,
            Statistic::Mean => self.mean,
            Statistic::Std => self.std,
            Statistic::Min => self.min,
            Statistic::Q25 => self.q25,
            Statistic::Q50 => self.q50,
            Statistic::Q75 => self.q75,
            Statistic::Max => self.max,
        }
    }
}

/// Describe a series, ignoring missing values.
///
/// Sample standard deviation (n - 1 denominator); quantiles by linear
/// interpolation between closest ranks (R-7).
pub fn describe(series: &SubjectSeries) -> Description {
    let mut sorted: Vec<f64> = series.present().collect();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    if count == 0 {
        return Description {
            count,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            q50: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        };
    }

    let n = count as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let std = if count < 2 {
        f64::NAN
    } else {
        let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1.0)).sqrt()
    };

    Description {
        count,
        mean,
        std,
        min: sorted[0],
        q25: quantile_sorted(&sorted, 0.25),
        q50: quantile_sorted(&sorted, 0.5),
        q75: quantile_sorted(&sorted, 0.75),
        max: sorted[count - 1],
    }
}

/// R-7 quantile of an ascending, non-empty slice.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

// ---------------------------------------------------------------------------
// Frequency table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
}

/// Column metadata for the table renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ColumnKind>,
}

/// One statistic across all subjects, e.g. `{param: "mean", "101": 2.5}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsRow {
    pub param: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyTable {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<StatsRow>,
    /// Per-subject summaries in column order, for the box-plot view.
    #[serde(skip)]
    pub descriptions: Vec<(String, Description)>,
}

pub const PARAM_COLUMN_ID: &str = "param";

/// Build the descriptive statistics table of a subject frame.
///
/// Rows always come in the order count, mean, std, min, 25%, 50%, 75%, max;
/// columns follow the frame's subject order after the parameter column.
pub fn build_frequency_table(frame: &SubjectFrame) -> AnalysisResult<FrequencyTable> {
    if frame.is_empty() {
        return Err(AnalysisError::EmptyInput("subject frame has no columns"));
    }
    let mut seen = BTreeSet::new();
    if let Some(dup) = frame.subject_names().find(|&name| !seen.insert(name)) {
        return Err(AnalysisError::DuplicateSubject(dup.to_string()));
    }

    let descriptions: Vec<(String, Description)> = frame
        .columns
        .iter()
        .map(|s| (s.name.clone(), describe(s)))
        .collect();

    let mut columns = vec![ColumnDescriptor {
        name: "Parameter".to_string(),
        id: PARAM_COLUMN_ID.to_string(),
        kind: None,
    }];
    columns.extend(descriptions.iter().map(|(name, _)| ColumnDescriptor {
        name: name.clone(),
        id: name.clone(),
        kind: Some(ColumnKind::Text),
    }));

    let rows = Statistic::ALL
        .iter()
        .map(|&stat| StatsRow {
            param: stat.display_name().to_string(),
            values: descriptions
                .iter()
                .map(|(name, d)| (name.clone(), d.get(stat)))
                .collect(),
        })
        .collect();

    Ok(FrequencyTable {
        columns,
        rows,
        descriptions,
    })
}

impl FrequencyTable {
    /// Replace subject column display names with their titles, where known.
    /// Column ids are left untouched.
    pub fn with_titles(mut self, titles: &VariableTitles) -> Self {
        for col in self.columns.iter_mut().skip(1) {
            if let Some(title) = titles.get(&col.id) {
                col.name = title.to_string();
            }
        }
        self
    }

    /// Subject column ids in display order.
    pub fn subject_ids(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().skip(1).map(|c| c.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn describe_small_series() {
        let d = describe(&SubjectSeries::from_values("A", &[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(d.count, 4);
        assert!((d.mean - 2.5).abs() < EPS);
        assert_eq!(d.min, 1.0);
        assert_eq!(d.max, 4.0);
        assert!((d.q25 - 1.75).abs() < EPS);
        assert!((d.q50 - 2.5).abs() < EPS);
        assert!((d.q75 - 3.25).abs() < EPS);
        assert!((d.std - (5.0f64 / 3.0).sqrt()).abs() < EPS);
    }

    #[test]
    fn describe_skips_missing_values() {
        let d = describe(&SubjectSeries::new("A", vec![Some(4.0), None, Some(2.0), Some(f64::NAN)]));
        assert_eq!(d.count, 2);
        assert!((d.mean - 3.0).abs() < EPS);
    }

    #[test]
    fn constant_series_has_zero_std() {
        let d = describe(&SubjectSeries::from_values("A", &[7.0, 7.0, 7.0]));
        assert_eq!(d.std, 0.0);
    }

    #[test]
    fn undefined_statistics_are_nan() {
        let single = describe(&SubjectSeries::from_values("A", &[3.0]));
        assert_eq!(single.count, 1);
        assert!(single.std.is_nan());
        assert_eq!(single.q75, 3.0);

        let empty = describe(&SubjectSeries::new("B", vec![None, None]));
        assert_eq!(empty.count, 0);
        assert!(empty.mean.is_nan() && empty.max.is_nan());
    }

    #[test]
    fn table_rows_follow_fixed_order() {
        let frame = SubjectFrame::new(vec![
            SubjectSeries::from_values("9", &[1.0, 2.0]),
            SubjectSeries::from_values("1", &[5.0, 6.0, 7.0]),
        ]);
        let table = build_frequency_table(&frame).unwrap();

        let params: Vec<_> = table.rows.iter().map(|r| r.param.as_str()).collect();
        assert_eq!(params, vec!["count", "mean", "std", "min", "25%", "50%", "75%", "max"]);

        let ids: Vec<_> = table.columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["param", "9", "1"]);
        assert_eq!(table.columns[1].kind, Some(ColumnKind::Text));

        assert_eq!(table.rows[0].values["1"], 3.0);
        assert_eq!(table.rows[1].values["9"], 1.5);
    }

    #[test]
    fn table_for_single_subject() {
        let frame = SubjectFrame::new(vec![SubjectSeries::from_values("A", &[1.0, 2.0, 3.0, 4.0])]);
        let table = build_frequency_table(&frame).unwrap();
        let value = |param: &str| table.rows.iter().find(|r| r.param == param).unwrap().values["A"];
        assert_eq!(value("count"), 4.0);
        assert_eq!(value("mean"), 2.5);
        assert_eq!(value("min"), 1.0);
        assert_eq!(value("max"), 4.0);
    }

    #[test]
    fn empty_frame_is_rejected() {
        let err = build_frequency_table(&SubjectFrame::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyInput(_)));
    }

    #[test]
    fn duplicate_subject_ids_are_rejected() {
        let frame = SubjectFrame::new(vec![
            SubjectSeries::from_values("101", &[1.0, 3.0]),
            SubjectSeries::from_values("101", &[100.0, 300.0]),
        ]);
        let err = build_frequency_table(&frame).unwrap_err();
        assert_eq!(err, AnalysisError::DuplicateSubject("101".to_string()));
    }

    #[test]
    fn titles_rename_columns_but_keep_ids() {
        let frame = SubjectFrame::new(vec![
            SubjectSeries::from_values("101", &[1.0]),
            SubjectSeries::from_values("102", &[2.0]),
        ]);
        let mut titles = VariableTitles::default();
        titles.insert("101", "Sleep quality");

        let table = build_frequency_table(&frame).unwrap().with_titles(&titles);
        assert_eq!(table.columns[0].name, "Parameter");
        assert_eq!(table.columns[1].name, "Sleep quality");
        assert_eq!(table.columns[1].id, "101");
        assert_eq!(table.columns[2].name, "102");
    }

    #[test]
    fn rows_serialize_flat() {
        let frame = SubjectFrame::new(vec![SubjectSeries::from_values("7", &[2.0, 4.0])]);
        let table = build_frequency_table(&frame).unwrap();
        let json = serde_json::to_value(&table.rows[1]).unwrap();
        assert_eq!(json, serde_json::json!({"param": "mean", "7": 3.0}));

        let col = serde_json::to_value(&table.columns[1]).unwrap();
        assert_eq!(col, serde_json::json!({"name": "7", "id": "7", "type": "text"}));
    }
}
