//! Delimited text loading.
//!
//! Cells are read without type coercion: every value is kept as the exact text
//! in the file, empty fields included.

use std::io;
use std::path::Path;

use tracing::debug;

use bindfeat_common::{Delimiter, FeatureError, Result, SchemaError};

use crate::table::{FeatureTable, Value};

/// Load a delimited file and key it by `key`.
pub fn load_table(path: &Path, key: &str, delimiter: Delimiter) -> Result<FeatureTable> {
    if !path.exists() {
        return Err(SchemaError::MissingSource(path.to_path_buf()).into());
    }
    let file = std::fs::File::open(path)?;
    let table = read_table(file, &table_name(path), path, key, delimiter)?;
    debug!(
        "Loaded {:?}: {} rows x {} columns (key '{}')",
        path,
        table.row_count(),
        table.column_count(),
        key
    );
    Ok(table)
}

/// Parse delimited text from any reader. `origin` is only used in error messages.
pub fn read_table<R: io::Read>(
    input: R,
    name: &str,
    origin: &Path,
    key: &str,
    delimiter: Delimiter,
) -> Result<FeatureTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(true)
        .flexible(false)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(origin, e))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(FeatureError::parse(origin, "no header row"));
    }
    if !headers.iter().any(|h| h == key) {
        return Err(SchemaError::MissingKeyColumn {
            table: name.to_string(),
            column: key.to_string(),
        }
        .into());
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(origin, e))?;
        rows.push(record.iter().map(|field| Value::Text(field.to_string())).collect());
    }

    FeatureTable::new(name, key, headers, rows)
}

/// Table name used in logs, manifests and errors: the file stem.
pub fn table_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn csv_error(origin: &Path, err: csv::Error) -> FeatureError {
    if err.is_io_error() {
        if let csv::ErrorKind::Io(e) = err.into_kind() {
            return FeatureError::Io(e);
        }
        return FeatureError::parse(origin, "I/O error while reading");
    }
    FeatureError::parse(origin, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read(text: &str, key: &str, delimiter: Delimiter) -> Result<FeatureTable> {
        read_table(text.as_bytes(), "fixture", Path::new("fixture.csv"), key, delimiter)
    }

    #[test]
    fn test_values_are_kept_as_text() {
        let table = read(
            "proteinName,helix,note\nP1,0.1000000000000000055511151231257827,\nP2,1e-3,NA\n",
            "proteinName",
            Delimiter::Comma,
        )
        .unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.rows()[0],
            vec![
                Value::from("P1"),
                Value::from("0.1000000000000000055511151231257827"),
                Value::from(""),
            ]
        );
        // No NA inference
        assert_eq!(table.rows()[1][2], Value::from("NA"));
    }

    #[test]
    fn test_tab_delimited() {
        let table = read("NAME\tMW\tlogP\nCHEMBL1\t300.2\t1.5\n", "NAME", Delimiter::Tab).unwrap();
        assert_eq!(table.columns(), &["NAME", "MW", "logP"].map(String::from));
        assert_eq!(table.key(), "NAME");
    }

    #[test]
    fn test_missing_key_column_is_schema_error() {
        let err = read("cluster_name,a\nP1,1\n", "proteinName", Delimiter::Comma).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::Schema(SchemaError::MissingKeyColumn { .. })
        ));
    }

    #[test]
    fn test_ragged_row_is_parse_error() {
        let err = read("proteinName,a\nP1,1,2\n", "proteinName", Delimiter::Comma).unwrap_err();
        assert!(matches!(err, FeatureError::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn test_empty_input_is_parse_error() {
        let err = read("", "proteinName", Delimiter::Comma).unwrap_err();
        assert!(matches!(err, FeatureError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_schema_error() {
        let err = load_table(Path::new("/nonexistent/protein.csv"), "proteinName", Delimiter::Comma)
            .unwrap_err();
        assert!(matches!(err, FeatureError::Schema(SchemaError::MissingSource(_))));
    }

    #[test]
    fn test_table_name_is_file_stem() {
        assert_eq!(table_name(Path::new("data/protein_features_2struc.csv")), "protein_features_2struc");
    }
}
