//! Export of merged diff tables to CSV and highlighted XLSX

use crate::align::DiffTag;
use crate::error::{Error, Result};
use crate::merger::{MergedTable, Side, DIFF_COLUMN};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use std::path::Path;
use tracing::debug;

/// Worksheet name used for every spreadsheet
pub const SHEET_NAME: &str = "AHB-Diff";

/// Uniform column width, in character units (about 150px)
const COLUMN_WIDTH: f64 = 21.0;

const GREY: &str = "#D9D9D9";
const NEW_FILL: &str = "#C6EFCE";
const REMOVED_FILL: &str = "#FFC7CE";
const NEW_TEXT: &str = "#7AAB8A";
const REMOVED_TEXT: &str = "#E94C74";

/// Prefix of index artifact columns left behind by other table tools
const UNNAMED_PREFIX: &str = "Unnamed:";

/// Write the merged table as flat CSV: header row, then one record per row
pub fn write_csv<P: AsRef<Path>>(table: &MergedTable, path: P) -> Result<()> {
    let path = path.as_ref();
    let csv_error = |source| Error::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    writer.write_record(&table.header).map_err(csv_error)?;
    for row in &table.rows {
        writer.write_record(&row.cells).map_err(csv_error)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = table.row_count(), "wrote CSV");
    Ok(())
}

/// Write the merged table as a spreadsheet with diff highlighting
///
/// Previous-side cells of removed rows are filled red, subsequent-side
/// cells of new rows green; the `diff` column carries a colored label.
pub fn write_xlsx<P: AsRef<Path>>(table: &MergedTable, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut workbook = Workbook::new();

    build_sheet(table, workbook.add_worksheet())
        .and_then(|_| workbook.save(path))
        .map_err(|source| Error::Xlsx {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(path = %path.display(), rows = table.row_count(), "wrote XLSX");
    Ok(())
}

struct SheetFormats {
    header: Format,
    base: Format,
    new_fill: Format,
    removed_fill: Format,
    diff_unchanged: Format,
    diff_new: Format,
    diff_removed: Format,
}

impl SheetFormats {
    fn new() -> Self {
        let cell = Format::new().set_border(FormatBorder::Thin).set_text_wrap();
        let diff_cell = cell
            .clone()
            .set_background_color(GREY)
            .set_align(FormatAlign::Center);

        Self {
            header: diff_cell.clone().set_bold(),
            new_fill: cell.clone().set_background_color(NEW_FILL),
            removed_fill: cell.clone().set_background_color(REMOVED_FILL),
            diff_new: diff_cell.clone().set_bold().set_font_color(NEW_TEXT),
            diff_removed: diff_cell.clone().set_bold().set_font_color(REMOVED_TEXT),
            diff_unchanged: diff_cell,
            base: cell,
        }
    }

    fn diff_label(&self, tag: DiffTag) -> &Format {
        match tag {
            DiffTag::Unchanged => &self.diff_unchanged,
            DiffTag::New => &self.diff_new,
            DiffTag::Removed => &self.diff_removed,
        }
    }

    fn cell(&self, tag: DiffTag, side: Option<Side>) -> &Format {
        match (tag, side) {
            (DiffTag::Removed, Some(Side::Previous)) => &self.removed_fill,
            (DiffTag::New, Some(Side::Subsequent)) => &self.new_fill,
            _ => &self.base,
        }
    }
}

enum ColumnRole {
    Diff,
    Data(Option<Side>),
}

fn build_sheet(table: &MergedTable, worksheet: &mut Worksheet) -> std::result::Result<(), XlsxError> {
    worksheet.set_name(SHEET_NAME)?;
    let formats = SheetFormats::new();

    // (merged index, header, role) for every column shown in the sheet
    let columns: Vec<(usize, &str, ColumnRole)> = table
        .header
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.starts_with(UNNAMED_PREFIX))
        .map(|(idx, name)| {
            let role = if name == DIFF_COLUMN {
                ColumnRole::Diff
            } else {
                ColumnRole::Data(table.side_of(name))
            };
            (idx, name.as_str(), role)
        })
        .collect();

    for (col, (_, name, _)) in columns.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, *name, &formats.header)?;
        worksheet.set_column_width(col, COLUMN_WIDTH)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (row_idx, row) in table.rows.iter().enumerate() {
        let sheet_row = row_idx as u32 + 1;
        for (col, (idx, _, role)) in columns.iter().enumerate() {
            let col = col as u16;
            let value = row.get(*idx).unwrap_or_default();
            let format = match role {
                ColumnRole::Diff => formats.diff_label(row.diff),
                ColumnRole::Data(side) => formats.cell(row.diff, *side),
            };

            match as_number(value) {
                Some(number) => worksheet.write_number_with_format(sheet_row, col, number, format)?,
                None => worksheet.write_string_with_format(sheet_row, col, value, format)?,
            };
        }
    }

    if !table.rows.is_empty() && !columns.is_empty() {
        worksheet.autofilter(0, 0, table.rows.len() as u32, (columns.len() - 1) as u16)?;
    }

    Ok(())
}

/// Numeric cell text worth writing as a spreadsheet number
///
/// Values with a leading zero (`0062`) are identifiers and stay text.
fn as_number(value: &str) -> Option<f64> {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let numeric_chars = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && digits.bytes().next().is_some_and(|b| b.is_ascii_digit());
    let leading_zero = digits.len() > 1
        && digits.starts_with('0')
        && !digits.starts_with("0.");

    if !numeric_chars || leading_zero {
        return None;
    }
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::KeyMatching;
    use crate::merger::merge_tables;
    use crate::parser::parse_csv_str;
    use crate::version::FormatVersion;
    use std::fs;
    use tempfile::tempdir;

    fn sample() -> MergedTable {
        let previous = parse_csv_str(
            "Unnamed: 0,Segmentname,Code\n0,Kopf,UNH\n1,\"Ende, alt\",UNT\n",
            "prev.csv",
        )
        .unwrap();
        let subsequent =
            parse_csv_str("Segmentname,Code\nKopf,UNH\nNeu,42\n", "next.csv").unwrap();
        merge_tables(
            &previous,
            &subsequent,
            FormatVersion::parse("FV2410").unwrap(),
            FormatVersion::parse("FV2504").unwrap(),
            KeyMatching::Exact,
        )
    }

    #[test]
    fn test_write_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("55001.csv");
        write_csv(&sample(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "Segmentname_FV2410,Unnamed: 0_FV2410,Code_FV2410,diff,Segmentname_FV2504,Code_FV2504"
        );
        assert_eq!(lines[1], "Kopf,0,UNH,,Kopf,UNH");
        assert_eq!(lines[2], "\"Ende, alt\",1,UNT,REMOVED,,");
        assert_eq!(lines[3], ",,,NEW,Neu,42");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_write_xlsx() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("55001.xlsx");
        write_xlsx(&sample(), &path).unwrap();

        let bytes = fs::read(&path).unwrap();
        // xlsx files are zip archives
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_write_xlsx_empty_table() {
        let dir = tempdir().unwrap();
        let previous = parse_csv_str("Segmentname\n", "prev.csv").unwrap();
        let table = merge_tables(
            &previous,
            &previous,
            FormatVersion::parse("FV2410").unwrap(),
            FormatVersion::parse("FV2504").unwrap(),
            KeyMatching::Exact,
        );
        let path = dir.path().join("empty.xlsx");
        write_xlsx(&table, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("55001.csv");
        assert!(write_csv(&sample(), &path).is_err());
    }

    #[test]
    fn test_as_number() {
        assert_eq!(as_number("42"), Some(42.0));
        assert_eq!(as_number("-1.5"), Some(-1.5));
        assert_eq!(as_number("0"), Some(0.0));
        assert_eq!(as_number("0.25"), Some(0.25));
        assert_eq!(as_number("0062"), None);
        assert_eq!(as_number(""), None);
        assert_eq!(as_number("E_0062"), None);
        assert_eq!(as_number("1.2.3"), None);
        assert_eq!(as_number("NaN"), None);
        assert_eq!(as_number(".5"), None);
    }

    #[test]
    fn test_cell_formats_follow_side() {
        let formats = SheetFormats::new();
        assert!(std::ptr::eq(
            formats.cell(DiffTag::Removed, Some(Side::Previous)),
            &formats.removed_fill
        ));
        assert!(std::ptr::eq(
            formats.cell(DiffTag::New, Some(Side::Subsequent)),
            &formats.new_fill
        ));
        assert!(std::ptr::eq(
            formats.cell(DiffTag::New, Some(Side::Previous)),
            &formats.base
        ));
        assert!(std::ptr::eq(formats.cell(DiffTag::Unchanged, None), &formats.base));
        assert!(std::ptr::eq(formats.diff_label(DiffTag::New), &formats.diff_new));
    }
}
