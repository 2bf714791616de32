use std::fs;
use std::io::Write;

use camino::Utf8Path;
use csv::{QuoteStyle, WriterBuilder};

use crate::error::DexError;
use crate::projector::Row;

/// Header from the `Row` field names, then one line per row. Fields with a
/// comma, quote or newline are quoted; `None` is an empty field.
pub fn render_table(rows: &[Row]) -> Result<Vec<u8>, DexError> {
    if rows.is_empty() {
        return Err(DexError::EmptyTable);
    }
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true)
        .from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(row)
            .map_err(|err| DexError::Serialization(err.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|err| DexError::Serialization(err.to_string()))
}

/// Replaces any existing file at `path`; parent directories are created.
pub fn write_table(path: &Utf8Path, rows: &[Row]) -> Result<(), DexError> {
    let content = render_table(rows)?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| DexError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix(".dex-export")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| DexError::Filesystem(err.to_string()))?;
    temp.write_all(&content)
        .map_err(|err| DexError::Filesystem(err.to_string()))?;
    if path.as_std_path().exists() {
        fs::remove_file(path.as_std_path())
            .map_err(|err| DexError::Filesystem(err.to_string()))?;
    }
    temp.persist(path.as_std_path())
        .map_err(|err| DexError::Filesystem(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn empty_rows_have_no_header() {
        assert_matches!(render_table(&[]), Err(DexError::EmptyTable));
    }
}
