//! Record table, declared schema and the preprocessing boundary.
//!
//! The clustering stages never look columns up by name. The [`Preprocessor`]
//! checks the [`Schema`] once, then hands each stage a positional
//! [`PreparedData`]: a numeric feature matrix and a categorical table, both
//! row-aligned with the original records.
//!
//! Preprocessing covers text cleaning (trim + lowercase) and z-score
//! normalization. Outlier clipping is expected upstream.

use ndarray::Array2;

use crate::error::{Error, Result, Stage};

/// One named column of a [`RecordTable`].
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Numeric values.
    Numeric(Vec<f64>),
    /// Free-text / nominal values.
    Text(Vec<String>),
}

impl Column {
    /// Number of values.
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    /// True if the column has no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Uploaded survey records as named columns. Row `i` of every column is
/// record `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    columns: Vec<(String, Column)>,
}

impl RecordTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a numeric column.
    pub fn with_numeric(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.insert(name.into(), Column::Numeric(values));
        self
    }

    /// Add (or replace) a text column.
    pub fn with_text<S: Into<String>>(mut self, name: impl Into<String>, values: Vec<S>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.insert(name.into(), Column::Text(values));
        self
    }

    fn insert(&mut self, name: String, column: Column) {
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = column,
            None => self.columns.push((name, column)),
        }
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Length of the first inserted column (0 if there are none). The
    /// [`Preprocessor`] counts records from schema columns instead.
    pub fn n_records(&self) -> usize {
        self.columns.first().map_or(0, |(_, c)| c.len())
    }
}

/// Required columns, declared once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Numeric feature columns, in feature order.
    pub numeric: Vec<String>,
    /// Categorical feature columns, in feature order.
    pub categorical: Vec<String>,
}

impl Schema {
    /// Schema with the given columns.
    pub fn new<S: Into<String>>(numeric: Vec<S>, categorical: Vec<S>) -> Self {
        Self {
            numeric: numeric.into_iter().map(Into::into).collect(),
            categorical: categorical.into_iter().map(Into::into).collect(),
        }
    }

    /// UMKM survey schema: capital, revenue and workforce size; business
    /// type and whether the business uses ride-hailing delivery.
    pub fn umkm() -> Self {
        Self::new(
            vec!["capital", "revenue", "workforce"],
            vec!["business_type", "uses_ride_hailing"],
        )
    }

    /// Fail on the first required column that is absent or has the wrong kind.
    pub fn check(&self, table: &RecordTable) -> Result<()> {
        for name in &self.numeric {
            match table.column(name) {
                Some(Column::Numeric(_)) => {}
                Some(Column::Text(_)) => {
                    return Err(Error::invalid_parameter(
                        "schema",
                        format!("column '{name}' must be numeric"),
                    ))
                }
                None => return Err(Error::missing_column(name.as_str(), Stage::Numeric)),
            }
        }
        for name in &self.categorical {
            if table.column(name).is_none() {
                return Err(Error::missing_column(name.as_str(), Stage::Categorical));
            }
        }
        Ok(())
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::umkm()
    }
}

/// Categorical feature table: one `Vec<String>` per column, row-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalTable {
    names: Vec<String>,
    columns: Vec<Vec<String>>,
}

impl CategoricalTable {
    /// Build from named columns of equal length.
    pub fn new(columns: Vec<(String, Vec<String>)>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::EmptyInput);
        }
        let n = columns[0].1.len();
        if let Some((_, c)) = columns.iter().find(|(_, c)| c.len() != n) {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: c.len(),
            });
        }
        let (names, columns) = columns.into_iter().unzip();
        Ok(Self { names, columns })
    }

    /// Build from record rows (each row lists one value per column).
    pub fn from_rows<S: AsRef<str>>(names: &[&str], rows: &[Vec<S>]) -> Result<Self> {
        let mut columns: Vec<Vec<String>> = vec![Vec::with_capacity(rows.len()); names.len()];
        for row in rows {
            if row.len() != names.len() {
                return Err(Error::DimensionMismatch {
                    expected: names.len(),
                    found: row.len(),
                });
            }
            for (col, value) in columns.iter_mut().zip(row) {
                col.push(value.as_ref().to_string());
            }
        }
        Self::new(names.iter().map(|n| n.to_string()).zip(columns).collect())
    }

    /// Column names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Columns, in name order.
    pub fn columns(&self) -> &[Vec<String>] {
        &self.columns
    }

    /// Number of records.
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }
}

/// Output of the preprocessing boundary.
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Numeric features, one row per record, columns in schema order.
    pub numeric: Array2<f64>,
    /// Cleaned categorical features, columns in schema order.
    pub categorical: CategoricalTable,
}

impl PreparedData {
    /// Number of records.
    pub fn n_records(&self) -> usize {
        self.numeric.nrows()
    }
}

/// Schema check, text cleaning and z-score normalization.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    schema: Schema,
    normalize: bool,
}

impl Preprocessor {
    /// Preprocessor for `schema`, normalizing numeric columns.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            normalize: true,
        }
    }

    /// Toggle z-score normalization.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// The declared schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Validate `table` against the schema and produce stage inputs.
    pub fn prepare(&self, table: &RecordTable) -> Result<PreparedData> {
        self.schema.check(table)?;

        // Columns outside the schema do not decide the record count.
        let n = self
            .schema
            .numeric
            .iter()
            .chain(&self.schema.categorical)
            .find_map(|name| table.column(name))
            .map_or(0, Column::len);
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        let mut numeric = Array2::<f64>::zeros((n, self.schema.numeric.len()));
        for (j, name) in self.schema.numeric.iter().enumerate() {
            let Some(Column::Numeric(values)) = table.column(name) else {
                return Err(Error::missing_column(name.as_str(), Stage::Numeric));
            };
            check_len(n, values.len())?;
            if let Some(row) = values.iter().position(|v| !v.is_finite()) {
                return Err(Error::NonFiniteValue {
                    column: name.clone(),
                    row,
                });
            }
            let values = if self.normalize {
                zscore(values)
            } else {
                values.clone()
            };
            for (i, v) in values.into_iter().enumerate() {
                numeric[(i, j)] = v;
            }
        }

        let mut categorical = Vec::with_capacity(self.schema.categorical.len());
        for name in &self.schema.categorical {
            let cleaned: Vec<String> = match table.column(name) {
                Some(Column::Text(values)) => values.iter().map(|s| clean_text(s)).collect(),
                // Numeric codes (e.g. a 0/1 flag) are treated as nominal values.
                Some(Column::Numeric(values)) => values.iter().map(|v| v.to_string()).collect(),
                None => return Err(Error::missing_column(name.as_str(), Stage::Categorical)),
            };
            check_len(n, cleaned.len())?;
            categorical.push((name.clone(), cleaned));
        }

        Ok(PreparedData {
            numeric,
            categorical: CategoricalTable::new(categorical)?,
        })
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(Schema::umkm())
    }
}

fn check_len(expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(Error::DimensionMismatch { expected, found });
    }
    Ok(())
}

/// Trim surrounding whitespace and lowercase.
pub fn clean_text(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Standardize to zero mean and unit population standard deviation.
/// A constant column maps to all zeros.
pub fn zscore(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    if std == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - mean) / std).collect()
}
