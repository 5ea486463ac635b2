use crate::error::RustyLedgerError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::to_time_string;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::excel::load_number_formats;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;
use tracing::warn;
use zip::ZipArchive;

const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts");
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");
const TAG_FORMAT_INDEX: QName = QName(b"xf");
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");
const TAG_TEXT: QName = QName(b"t");
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr");
const TAG_SHEET: QName = QName(b"sheet");
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_INLINE_STRING: QName = QName(b"is");
const TAG_VALUE: QName = QName(b"v");

/// Excel's sheet size limits.
const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

/// An Excel `.xlsx` workbook opened for import.
pub(crate) struct XlsxSpreadsheet {
    zip: ZipArchive<BufReader<File>>,
    /// Storage type per cell style index
    number_formats: Vec<CellType>,
    /// Whether serial dates count from 1904 instead of 1900
    is_1904: bool,
    /// Worksheets as (name, zip_path) pairs in workbook order
    sheets: Vec<(String, String)>,
}

impl XlsxSpreadsheet {
    pub(crate) fn open(path: &Path) -> Result<XlsxSpreadsheet, RustyLedgerError> {
        let mut zip = ZipArchive::new(BufReader::new(File::open(path)?))?;
        let (sheets, is_1904) = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::EmptySpreadsheet(path.to_string_lossy().to_string()))?
        }
        let number_formats = load_styles(&mut zip)?;
        Ok(XlsxSpreadsheet {
            zip,
            number_formats,
            is_1904,
            sheets,
        })
    }

    /// Loads the whole shared string table.
    fn load_shared_strings(&mut self) -> Result<Vec<String>, RustyLedgerError> {
        let mut shared_strings = Vec::<String>::new();
        let mut reader = match self.zip.xml_reader("xl/sharedStrings.xml")? {
            Some(reader) => reader,
            None => return Ok(shared_strings),
        };
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
            }
        });
        Ok(shared_strings)
    }

    /// Reads every worksheet into a [`Sheet`], in workbook order.
    pub(crate) fn read_sheets(&mut self) -> Result<Vec<Sheet>, RustyLedgerError> {
        let shared_strings = self.load_shared_strings()?;
        let mut sheets = Vec::<Sheet>::new();
        for (sheet_name, zip_path) in self.sheets.clone() {
            let mut sheet = Sheet::new(&sheet_name);
            let mut reader = self
                .zip
                .xml_reader(&zip_path)?
                .ok_or_else(|| SpreadsheetError::FileError(zip_path.to_owned()))?;
            let mut row_count = 0usize;
            let mut col_count = 0usize;
            let mut row = 0usize;
            let mut col = 0usize;
            let mut in_range = true;
            let mut kind = CellType::default();
            let mut value = String::new();
            match_xml_events!(reader => {
                Event::End(event) if event.name() == TAG_ROW => {
                    row_count += 1;
                    col_count = 0;
                }
                Event::Start(event) if event.name() == TAG_CELL => {
                    (row, col) = event.get_attribute_value("r")?
                        .and_then(|reference| reference_to_index(&reference))
                        .unwrap_or((row_count, col_count));
                    col_count = col + 1;
                    in_range = row < MAX_ROWS && col < MAX_COLUMNS;
                    if !in_range {
                        warn!(sheet = %sheet_name, row = row + 1, column = col + 1, "Cell outside the sheet limits skipped");
                    }
                    value.clear();
                    kind = event.get_attribute_value("t")?.map(|t| {
                        match &*t {
                            "inlineStr" | "str" => CellType::InlineString,
                            "s" => CellType::SharedString,
                            "d" => CellType::IsoDateTime,
                            "b" => CellType::Boolean,
                            "e" => CellType::Error,
                            _ => CellType::Number,
                        }
                    }).unwrap_or(CellType::Number);
                    if kind == CellType::Number {
                        if let Some(style) = event.get_attribute_value("s")? {
                            if !style.is_empty() {
                                let index = style.parse::<usize>()?;
                                kind = self.number_formats.get(index).copied().unwrap_or(CellType::Number);
                            }
                        }
                    }
                }
                Event::Start(event) if event.name() == TAG_INLINE_STRING => {
                    value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
                }
                Event::Start(event) if event.name() == TAG_VALUE => {
                    value = read_string_value(&mut reader, TAG_VALUE, true)?;
                }
                Event::End(event) if event.name() == TAG_CELL => {
                    if in_range && !value.is_empty() {
                        let cell = to_cell(kind, &value, self.is_1904, &shared_strings, &sheet_name, row, col);
                        sheet.set_value(row + 1, col + 1, cell)?;
                    }
                    kind = CellType::default();
                }
            });
            debug!(sheet = %sheet_name, rows = sheet.last_row(), "Imported worksheet");
            sheets.push(sheet);
        }
        Ok(sheets)
    }
}

/// Converts a raw worksheet value into a ledger cell.
fn to_cell(
    kind: CellType,
    value: &str,
    is_1904: bool,
    shared_strings: &[String],
    sheet_name: &str,
    row: usize,
    col: usize,
) -> Cell {
    let serial = || value.parse::<f64>().ok();
    let converted = match kind {
        CellType::Empty => Some(Cell::Empty),
        CellType::Boolean => Some(Cell::Boolean(value == "1")),
        CellType::Number => serial().map(Cell::Number),
        CellType::NumberDate => serial().and_then(|serial| Cell::from_serial(serial, is_1904, false)),
        CellType::NumberDateTime => serial().and_then(|serial| Cell::from_serial(serial, is_1904, true)),
        CellType::NumberTime => serial().map(|serial| Cell::Text(to_time_string(serial))),
        CellType::IsoDateTime => Cell::from(value).to_temporal(),
        CellType::InlineString => Some(Cell::from(value)),
        CellType::SharedString => value
            .parse::<usize>()
            .ok()
            .and_then(|index| shared_strings.get(index))
            .map(|string| Cell::from(string.as_str())),
        CellType::Error => {
            warn!(sheet = %sheet_name, cell = %Sheet::reference(row + 1, col + 1), value, "Error value imported as text");
            Some(Cell::from(value))
        }
    };
    converted.unwrap_or_else(|| {
        warn!(sheet = %sheet_name, cell = %Sheet::reference(row + 1, col + 1), value, "Unreadable cell value imported as text");
        Cell::from(value)
    })
}

/// Reads the sheet list and the date system from `xl/workbook.xml`.
fn load_workbook(zip: &mut ZipArchive<BufReader<File>>) -> Result<(Vec<(String, String)>, bool), RustyLedgerError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip
        .xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("xl/workbook.xml".to_string()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<String>;
            let mut id = None::<String>;
            for attribute in event.attributes() {
                let attribute = attribute?;
                match attribute.key.local_name().as_ref() {
                    b"name" => name = Some(attribute.unescape_value()?.to_string()),
                    b"id" => id = Some(attribute.unescape_value()?.to_string()),
                    _ => (),
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(&id) {
                    sheets.push((name, path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value == "1" || value == "true")
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Reads custom number formats and the cell style table from `xl/styles.xml`.
fn load_styles(zip: &mut ZipArchive<BufReader<File>>) -> Result<Vec<CellType>, RustyLedgerError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();
    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_formats.insert(id.to_string(), CellType::parse_custom_number_format(&format));
            }
        }
        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = false,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?;
            format_indexes.push(id.map(|id| id.to_string()).unwrap_or_default());
        }
    });

    Ok(load_number_formats(format_indexes, custom_formats))
}

/// Collects the text of a string element up to `end_tag`, skipping phonetic runs.
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, RustyLedgerError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = is_text_content,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::Workbook;
    use chrono::NaiveDate;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#;

    const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <workbookPr/>
  <sheets><sheet name="Form_Responses" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy-mm-dd hh:mm"/></numFmts>
  <cellXfs count="3"><xf numFmtId="0"/><xf numFmtId="14"/><xf numFmtId="164"/></cellXfs>
</styleSheet>"#;

    const SHARED_STRINGS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="3" uniqueCount="3">
  <si><t>Task</t></si>
  <si><t>Status</t></si>
  <si><r><t>Pay </t></r><r><t>rent &amp; bills</t></r></si>
</sst>"#;

    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="inlineStr"><is><t>Due Date</t></is></c><c r="C1" t="s"><v>1</v></c><c r="D1" t="inlineStr"><is><t>Recurring?</t></is></c><c r="E1" t="inlineStr"><is><t>Updated</t></is></c></row>
    <row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2" s="1"><v>45352</v></c><c r="C2" t="str"><v>Open</v></c><c r="D2" t="b"><v>1</v></c><c r="E2" s="2"><v>45352.5</v></c></row>
    <row r="4"><c r="A4" t="inlineStr"><is><t>Later</t></is></c><c r="C4"><v>7</v></c></row>
  </sheetData>
</worksheet>"#;

    fn write_xlsx(path: &Path) {
        write_xlsx_with_sheet(path, SHEET);
    }

    fn write_xlsx_with_sheet(path: &Path, sheet: &str) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default();
        for (name, content) in [
            ("[Content_Types].xml", CONTENT_TYPES),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/styles.xml", STYLES),
            ("xl/sharedStrings.xml", SHARED_STRINGS),
            ("xl/worksheets/sheet1.xml", sheet),
        ] {
            zip.start_file(name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn imports_typed_cells() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("tasks.xlsx");
        write_xlsx(&path);

        let workbook = Workbook::open(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Form_Responses"]);

        let sheet = workbook.sheet("Form_Responses").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(sheet.row(1), vec![
            Cell::from("Task"),
            Cell::from("Due Date"),
            Cell::from("Status"),
            Cell::from("Recurring?"),
            Cell::from("Updated"),
        ]);
        assert_eq!(sheet.row(2), vec![
            Cell::from("Pay rent & bills"),
            Cell::Date(date),
            Cell::from("Open"),
            Cell::Boolean(true),
            Cell::DateTime(date.and_hms_opt(12, 0, 0).unwrap()),
        ]);
        assert_eq!(sheet.get(3, 1), &Cell::Empty);
        assert_eq!(sheet.get(4, 1), &Cell::from("Later"));
        assert_eq!(sheet.get(4, 3), &Cell::Number(7.0));
        assert_eq!(sheet.last_row(), 4);
    }

    #[test]
    fn cells_beyond_sheet_limits_are_skipped() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("huge.xlsx");
        write_xlsx_with_sheet(&path, r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1"><c r="A1" t="s"><v>0</v></c><c r="XFE1" t="inlineStr"><is><t>Wide</t></is></c></row>
    <row r="999999999"><c r="A999999999" t="inlineStr"><is><t>Deep</t></is></c></row>
  </sheetData>
</worksheet>"#);

        let workbook = Workbook::open(&path).unwrap();
        let sheet = workbook.sheet("Form_Responses").unwrap();
        assert_eq!(sheet.last_row(), 1);
        assert_eq!(sheet.last_column(), 1);
        assert_eq!(sheet.get(1, 1), &Cell::from("Task"));
    }

    #[test]
    fn missing_workbook_part_fails() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("broken.xlsx");
        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        zip.start_file("xl/_rels/workbook.xml.rels", SimpleFileOptions::default()).unwrap();
        zip.write_all(WORKBOOK_RELS.as_bytes()).unwrap();
        zip.finish().unwrap();

        assert!(Workbook::open(&path).is_err());
    }
}
