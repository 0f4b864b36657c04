//! Integer encodings of nominal data.
//!
//! Two ways to turn nominal values into an [`EncodedTable`]:
//!
//! - [`EncodedTable::label_encode`]: each column becomes small integer codes
//!   (sorted distinct values → 0, 1, 2, ...). One encoded column per input
//!   column.
//! - [`EncodedTable::one_hot`]: each (column, value) pair becomes its own
//!   0/1 column. Used for fusing label assignments, where two records that
//!   disagree on one label differ in two binary columns.
//!
//! Codes are stable within one encoding and are never shared between runs.

use std::collections::BTreeMap;

use ndarray::Array2;

use crate::dataset::CategoricalTable;
use crate::error::{Error, Result};

/// A record × column matrix of integer codes.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedTable {
    codes: Array2<u32>,
    column_names: Vec<String>,
}

impl EncodedTable {
    /// Wrap an existing code matrix.
    pub fn from_codes(codes: Array2<u32>, column_names: Vec<String>) -> Result<Self> {
        if column_names.len() != codes.ncols() {
            return Err(Error::DimensionMismatch {
                expected: codes.ncols(),
                found: column_names.len(),
            });
        }
        Ok(Self {
            codes,
            column_names,
        })
    }

    /// Label-encode every column of `table`.
    pub fn label_encode(table: &CategoricalTable) -> Result<Self> {
        let n = table.n_rows();
        if n == 0 || table.n_cols() == 0 {
            return Err(Error::EmptyInput);
        }

        let mut codes = Array2::<u32>::zeros((n, table.n_cols()));
        for (j, column) in table.columns().iter().enumerate() {
            let dictionary = dictionary(column.iter().map(String::as_str));
            for (i, value) in column.iter().enumerate() {
                codes[(i, j)] = dictionary[value.as_str()];
            }
        }

        Ok(Self {
            codes,
            column_names: table.names().to_vec(),
        })
    }

    /// One-hot encode named label columns. Labels are compared as strings,
    /// and the binary columns for each input column are ordered by the
    /// string form of the label (`"name_value"`).
    pub fn one_hot(columns: &[(&str, &[usize])]) -> Result<Self> {
        let Some((_, first)) = columns.first() else {
            return Err(Error::EmptyInput);
        };
        let n = first.len();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if let Some((_, c)) = columns.iter().find(|(_, c)| c.len() != n) {
            return Err(Error::LabelMisaligned {
                left: n,
                right: c.len(),
            });
        }

        let mut column_names = Vec::new();
        let mut blocks = Vec::with_capacity(columns.len());
        for (name, labels) in columns {
            let as_text: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
            let dictionary = dictionary(as_text.iter().map(String::as_str));
            let offset = column_names.len() as u32;
            column_names.extend(dictionary.keys().map(|v| format!("{name}_{v}")));
            blocks.push(
                as_text
                    .iter()
                    .map(|v| offset + dictionary[v.as_str()])
                    .collect::<Vec<_>>(),
            );
        }

        let mut codes = Array2::<u32>::zeros((n, column_names.len()));
        for block in &blocks {
            for (i, &hot) in block.iter().enumerate() {
                codes[(i, hot as usize)] = 1;
            }
        }

        Ok(Self {
            codes,
            column_names,
        })
    }

    /// The code matrix.
    pub fn codes(&self) -> &Array2<u32> {
        &self.codes
    }

    /// Encoded column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of records.
    pub fn n_rows(&self) -> usize {
        self.codes.nrows()
    }

    /// Number of encoded columns.
    pub fn n_cols(&self) -> usize {
        self.codes.ncols()
    }
}

/// Sorted distinct values mapped to consecutive codes.
fn dictionary<'a>(values: impl Iterator<Item = &'a str>) -> BTreeMap<&'a str, u32> {
    let mut dictionary: BTreeMap<&str, u32> = values.map(|v| (v, 0)).collect();
    for (code, slot) in dictionary.values_mut().enumerate() {
        *slot = code as u32;
    }
    dictionary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_encode_sorted_codes() {
        let table = CategoricalTable::from_rows(
            &["type", "flag"],
            &[
                vec!["oleh", "ya"],
                vec!["mamin", "tidak"],
                vec!["jasa", "ya"],
                vec!["mamin", "ya"],
            ],
        )
        .unwrap();
        let encoded = EncodedTable::label_encode(&table).unwrap();

        assert_eq!(encoded.n_rows(), 4);
        assert_eq!(encoded.n_cols(), 2);
        // jasa < mamin < oleh; tidak < ya
        assert_eq!(encoded.codes().column(0).to_vec(), vec![2, 1, 0, 1]);
        assert_eq!(encoded.codes().column(1).to_vec(), vec![1, 0, 1, 1]);
        assert_eq!(encoded.column_names(), &["type".to_string(), "flag".to_string()]);
    }

    #[test]
    fn test_one_hot_layout() {
        let numeric = [1usize, 2, 2];
        let categorical = [3usize, 3, 1];
        let encoded = EncodedTable::one_hot(&[
            ("numeric", &numeric[..]),
            ("categorical", &categorical[..]),
        ])
        .unwrap();

        assert_eq!(
            encoded.column_names(),
            &["numeric_1", "numeric_2", "categorical_1", "categorical_3"]
        );
        assert_eq!(encoded.codes().row(0).to_vec(), vec![1, 0, 0, 1]);
        assert_eq!(encoded.codes().row(1).to_vec(), vec![0, 1, 0, 1]);
        assert_eq!(encoded.codes().row(2).to_vec(), vec![0, 1, 1, 0]);
        // Every row has exactly one hot value per input column.
        for row in encoded.codes().rows() {
            assert_eq!(row.sum(), 2);
        }
    }

    #[test]
    fn test_one_hot_orders_labels_as_strings() {
        let labels = [10usize, 2, 1];
        let encoded = EncodedTable::one_hot(&[("x", &labels[..])]).unwrap();
        assert_eq!(encoded.column_names(), &["x_1", "x_10", "x_2"]);
    }

    #[test]
    fn test_one_hot_misaligned() {
        let a = [1usize, 2];
        let b = [1usize];
        let err = EncodedTable::one_hot(&[("a", &a[..]), ("b", &b[..])]).unwrap_err();
        assert!(matches!(err, Error::LabelMisaligned { left: 2, right: 1 }));
    }

    #[test]
    fn test_from_codes_checks_names() {
        let codes = Array2::<u32>::zeros((2, 3));
        assert!(EncodedTable::from_codes(codes, vec!["a".into()]).is_err());
    }
}
