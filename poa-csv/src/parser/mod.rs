//! Table loader for the EJP CSV exports.
//!
//! Every table is read whole: bytes are decoded (UTF-8 when valid, otherwise
//! the encoding chardet reports, Western European by default), then parsed
//! with a quote-aware reader into raw rows (preamble, header and data rows
//! alike).
//!
//! Some exports carry free text that contains the delimiter without proper
//! quoting ("overflow" tables). Those get a second pass with quoting disabled;
//! from the configured join column onward the cells are glued back together
//! and stray quote characters are stripped. Repaired rows replace the rows of
//! the first pass that start on the same source line. A quoted record spanning
//! several lines keeps its first-pass value.

use std::collections::HashMap;

use encoding_rs::{Encoding, WINDOWS_1252};

use crate::config::{Settings, TableKind};
use crate::error::TableError;

/// One parsed row.
pub type Row = Vec<String>;

const DELIMITER: u8 = b',';

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 is taken as is; chardet is only consulted for anything else.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "windows-1252".to_string(),
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            "windows-1252".to_string()
        }
        _ => charset,
    }
}

/// Decode bytes to a string using the given encoding.
///
/// Latin-1 labels decode as Windows-1252, and unknown labels fall back to
/// Windows-1252 as well.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" => String::from_utf8_lossy(bytes).into_owned(),
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            WINDOWS_1252.decode(bytes).0.into_owned()
        }
        label => Encoding::for_label(label.as_bytes())
            .unwrap_or(WINDOWS_1252)
            .decode(bytes)
            .0
            .into_owned(),
    }
}

/// Load every row of `table`, applying the overflow repair when configured.
pub fn load_table(settings: &Settings, table: TableKind) -> Result<Vec<Row>, TableError> {
    let path = settings.path_for(table);
    let bytes = std::fs::read(&path).map_err(|source| TableError::SourceUnavailable {
        table,
        path: path.clone(),
        source,
    })?;

    let encoding = detect_encoding(&bytes);
    let content = decode_content(&bytes, &encoding);

    parse_sheet(
        &content,
        settings.overflow_join_column(table),
        settings.data_start_row,
    )
    .map_err(|source| TableError::Csv { table, source })
}

/// Parse decoded table content into rows.
///
/// `join_from` enables the overflow repair for rows at index `data_start_row`
/// and later.
pub fn parse_sheet(
    content: &str,
    join_from: Option<usize>,
    data_start_row: usize,
) -> Result<Vec<Row>, csv::Error> {
    let Some(join_from) = join_from else {
        return parse_rows(content, true);
    };

    let quoted = parse_lines(content, true)?;
    let mut unquoted: HashMap<u64, Row> = parse_lines(content, false)?.into_iter().collect();

    let sheet = quoted
        .into_iter()
        .enumerate()
        .map(|(index, (line, row))| {
            if index < data_start_row || spans_lines(&row) {
                return row;
            }
            match unquoted.remove(&line) {
                Some(raw) => rejoin_overflow(raw, join_from),
                None => row,
            }
        })
        .collect();

    Ok(sheet)
}

/// Parse rows with or without quote handling.
pub fn parse_rows(content: &str, quoting: bool) -> Result<Vec<Row>, csv::Error> {
    Ok(parse_lines(content, quoting)?
        .into_iter()
        .map(|(_, row)| row)
        .collect())
}

/// Rows paired with the source line each record starts on.
fn parse_lines(content: &str, quoting: bool) -> Result<Vec<(u64, Row)>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(DELIMITER)
        .quoting(quoting)
        .from_reader(content.as_bytes());

    reader
        .records()
        .map(|record| {
            record.map(|r| {
                let line = r.position().map(|p| p.line()).unwrap_or_default();
                (line, r.iter().map(String::from).collect())
            })
        })
        .collect()
}

/// A quoted cell carried a line break, so the record covers several lines.
fn spans_lines(row: &[String]) -> bool {
    row.iter().any(|cell| cell.contains('\n') || cell.contains('\r'))
}

/// Glue cells from `join_from` to the end back into one cell and strip the
/// quote characters the unquoted pass left behind.
fn rejoin_overflow(mut row: Row, join_from: usize) -> Row {
    if row.len() > join_from {
        let tail = row.split_off(join_from);
        row.push(tail.join(","));
    }
    row.into_iter()
        .map(|cell| cell.trim_matches('"').to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREAMBLE: &str = "\"POA Title Report\"\n\"Run Date: 2016-12-20\"\n\"Journal: eLife\"\n";

    #[test]
    fn test_quoted_parse() {
        let csv = "a,b,c\n1,\"x, y\",3\n";
        let rows = parse_rows(csv, true).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["1", "x, y", "3"]);
    }

    #[test]
    fn test_unquoted_parse_splits_on_every_comma() {
        let csv = "1,\"x, y\",3\n";
        let rows = parse_rows(csv, false).unwrap();

        assert_eq!(rows[0], vec!["1", "\"x", " y\"", "3"]);
    }

    #[test]
    fn test_overflow_repair_rejoins_free_text() {
        let csv = format!(
            "{}poa_m_ms_id,poa_m_ms_no,poa_m_title_tag\n\
             1,3,\"This, 'title, includes \"quotation\", marks & more &#x00FC;\"\n\
             2,7,Plants emit volatiles, which attract predators, in nature.\n",
            PREAMBLE
        );
        let sheet = parse_sheet(&csv, Some(2), 4).unwrap();

        assert_eq!(sheet.len(), 6);
        assert_eq!(sheet[3], vec!["poa_m_ms_id", "poa_m_ms_no", "poa_m_title_tag"]);
        assert_eq!(
            sheet[4],
            vec!["1", "3", "This, 'title, includes \"quotation\", marks & more &#x00FC;"]
        );
        assert_eq!(
            sheet[5],
            vec!["2", "7", "Plants emit volatiles, which attract predators, in nature."]
        );
    }

    #[test]
    fn test_overflow_repair_skips_rows_before_data_start() {
        let csv = format!("{}\"id\",\"no\",\"text\"\n1,2,a,b\n", PREAMBLE);
        let sheet = parse_sheet(&csv, Some(2), 4).unwrap();

        // header row comes from the quoted pass
        assert_eq!(sheet[3], vec!["id", "no", "text"]);
        assert_eq!(sheet[4], vec!["1", "2", "a,b"]);
    }

    #[test]
    fn test_no_repair_without_join_column() {
        let csv = format!("{}id,no,text\n1,2,a,b\n", PREAMBLE);
        let sheet = parse_sheet(&csv, None, 4).unwrap();

        assert_eq!(sheet[4], vec!["1", "2", "a", "b"]);
    }

    #[test]
    fn test_short_rows_are_left_alone() {
        let row = rejoin_overflow(vec!["1".into(), "\"3\"".into()], 3);
        assert_eq!(row, vec!["1", "3"]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Soci\u{e9}t\u{e9}");
    }

    #[test]
    fn test_ascii_is_utf8() {
        assert_eq!(detect_encoding(b"poa_m_ms_no,poa_a_id\n3,1211\n"), "utf-8");
    }

    #[test]
    fn test_valid_utf8_is_kept() {
        let content = "poa_m_ms_no,poa_a_last_nm\n1,3,M\u{fc}ller\n2,3,Smith\n";
        let encoding = detect_encoding(content.as_bytes());

        assert_eq!(encoding, "utf-8");
        assert_eq!(decode_content(content.as_bytes(), &encoding), content);
    }

    #[test]
    fn test_latin1_decodes_as_windows_1252() {
        // 0xA4 and 0xBD are the currency sign and one half, not ISO-8859-15's euro and oe
        let bytes: &[u8] = b"Price \xa4 5, half \xbd";
        assert_eq!(decode_content(bytes, "iso-8859-1"), "Price \u{a4} 5, half \u{bd}");
        assert_eq!(decode_content(b"\x80", "latin1"), "\u{20ac}");
        assert_ne!(detect_encoding(bytes), "utf-8");
    }

    #[test]
    fn test_multiline_quoted_cell_keeps_row_alignment() {
        let csv = format!(
            "{}poa_m_ms_id,poa_m_ms_no,poa_m_abstract_tag\n\
             1,3,\"line one, more\nline two\"\n\
             2,7,plain, text\n",
            PREAMBLE
        );
        let sheet = parse_sheet(&csv, Some(2), 4).unwrap();

        assert_eq!(sheet.len(), 6);
        assert_eq!(sheet[4], vec!["1", "3", "line one, more\nline two"]);
        assert_eq!(sheet[5], vec!["2", "7", "plain, text"]);
    }

    #[test]
    fn test_load_utf8_fixture() {
        let settings = crate::test_support::fixture_settings();
        let sheet = load_table(&settings, TableKind::Authors).unwrap();

        let row = sheet
            .iter()
            .find(|row| row.get(1).map(String::as_str) == Some("14874"))
            .unwrap();
        assert_eq!(row[4], "J\u{fc}rgen");
        assert_eq!(row[6], "M\u{fc}ller");
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_csv_path(dir.path());

        let err = load_table(&settings, TableKind::Authors).unwrap_err();
        assert!(matches!(err, TableError::SourceUnavailable { table: TableKind::Authors, .. }));
    }

    #[test]
    fn test_load_overflow_fixture() {
        let settings = crate::test_support::fixture_settings();
        let sheet = load_table(&settings, TableKind::Ethics).unwrap();

        assert_eq!(sheet[3], vec!["poa_m_ms_id", "poa_m_ms_no", "poa_e_id", "poa_m_ethics_note"]);
        assert!(sheet[4][3].contains("(expedient number 78/05), in compliance"));
        assert_eq!(sheet[4].len(), 4);
    }
}
