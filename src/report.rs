//! Spreadsheet report writer.
//!
//! Produces a minimal Office Open XML workbook (`.xlsx`) with a single
//! `Movies` sheet. The package is assembled directly with `zip`; cell text
//! is escaped with `quick-xml`. Strings are stored inline (`inlineStr`), so
//! no shared-strings part is needed.
//!
//! # Layout
//!
//! | Column | Content |
//! |--------|---------|
//! | A `ID` | number |
//! | B `Title` | text |
//! | C `Vote Average` | number |
//! | D `Genres` | text, joined with `", "` |
//!
//! The header row is frozen. Every cell of an Action row uses the emphasis
//! style: bold font over a solid `FFC7CE` fill.

use anyhow::{Context, Result};
use std::io::{Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;

use crate::atomic_write::write_atomic;
use crate::models::MovieRow;

pub const SHEET_NAME: &str = "Movies";
pub const REPORT_HEADERS: [&str; 4] = ["ID", "Title", "Vote Average", "Genres"];
/// ARGB fill colour of emphasized rows.
pub const EMPHASIS_FILL: &str = "FFFFC7CE";

/// Index into `cellXfs` of the emphasis style.
const EMPHASIS_STYLE: u32 = 1;
const COLUMNS: [char; 4] = ['A', 'B', 'C', 'D'];
const COLUMN_WIDTHS: [u32; 4] = [12, 48, 14, 48];

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

/// Atomically write `rows` as an `.xlsx` workbook at `path`.
///
/// Rows are written in the order given; callers pass the sorted report.
pub fn write_report(rows: &[MovieRow], path: &Path) -> Result<()> {
    write_atomic(path, |file| write_workbook(rows, file))
        .with_context(|| format!("Failed to write report: {}", path.display()))
}

/// Assemble the workbook package into any seekable writer.
pub fn write_workbook<W: Write + Seek>(rows: &[MovieRow], out: W) -> Result<()> {
    let mut zip = zip::ZipWriter::new(out);
    let options = SimpleFileOptions::default();

    let parts: [(&str, String); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", ROOT_RELS_XML.to_string()),
        ("xl/workbook.xml", workbook_xml()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.to_string()),
        ("xl/styles.xml", styles_xml()),
        ("xl/worksheets/sheet1.xml", sheet_xml(rows)),
    ];
    for (name, xml) in parts {
        zip.start_file(name, options)?;
        zip.write_all(xml.as_bytes())?;
    }

    zip.finish()?;
    Ok(())
}

fn workbook_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        SHEET_NAME
    )
}

fn styles_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="3"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill><fill><patternFill patternType="solid"><fgColor rgb="{fill}"/><bgColor rgb="{fill}"/></patternFill></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="2" borderId="0" xfId="0" applyFont="1" applyFill="1"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#,
        fill = EMPHASIS_FILL
    )
}

/// A single cell value.
enum Cell<'a> {
    Number(String),
    Text(&'a str),
}

fn sheet_xml(rows: &[MovieRow]) -> String {
    let mut xml = String::with_capacity(256 + rows.len() * 256);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#);
    xml.push_str(
        r#"<sheetViews><sheetView workbookViewId="0"><pane ySplit="1" topLeftCell="A2" activePane="bottomLeft" state="frozen"/></sheetView></sheetViews>"#,
    );

    xml.push_str("<cols>");
    for (i, width) in COLUMN_WIDTHS.iter().enumerate() {
        xml.push_str(&format!(
            r#"<col min="{n}" max="{n}" width="{w}" customWidth="1"/>"#,
            n = i + 1,
            w = width
        ));
    }
    xml.push_str("</cols>");

    xml.push_str("<sheetData>");
    let header: Vec<Cell> = REPORT_HEADERS.iter().map(|h| Cell::Text(h)).collect();
    push_row(&mut xml, 1, &header, None);

    for (i, movie) in rows.iter().enumerate() {
        let genres = movie.genres.join(", ");
        let cells = [
            Cell::Number(movie.id.to_string()),
            Cell::Text(&movie.title),
            Cell::Number(format_number(movie.vote_average)),
            Cell::Text(&genres),
        ];
        let style = movie.is_action.then_some(EMPHASIS_STYLE);
        push_row(&mut xml, i + 2, &cells, style);
    }
    xml.push_str("</sheetData></worksheet>");

    xml
}

fn push_row(xml: &mut String, row_number: usize, cells: &[Cell], style: Option<u32>) {
    xml.push_str(&format!(r#"<row r="{}">"#, row_number));
    for (column, cell) in COLUMNS.iter().zip(cells) {
        let style_attr = style
            .map(|s| format!(r#" s="{}""#, s))
            .unwrap_or_default();
        match cell {
            Cell::Number(value) => xml.push_str(&format!(
                r#"<c r="{}{}"{}><v>{}</v></c>"#,
                column, row_number, style_attr, value
            )),
            Cell::Text(text) => xml.push_str(&format!(
                r#"<c r="{}{}"{} t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                column,
                row_number,
                style_attr,
                quick_xml::escape::escape(&sanitize_text(text))
            )),
        }
    }
    xml.push_str("</row>");
}

fn format_number(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        "0".to_string()
    }
}

/// Drop characters XML 1.0 cannot carry (C0 controls other than tab/LF/CR).
fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|&c| c >= '\u{20}' || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::events::Event;
    use std::io::Read;

    fn movie(id: u64, title: &str, vote: f64, genres: &[&str]) -> MovieRow {
        let genres: Vec<String> = genres.iter().map(|g| g.to_string()).collect();
        MovieRow {
            id,
            title: title.to_string(),
            vote_average: vote,
            is_action: genres.iter().any(|g| g == "Action"),
            genres,
        }
    }

    fn read_part(path: &Path, name: &str) -> String {
        let file = std::fs::File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut out = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        out
    }

    /// (emphasized, text) per cell, per row.
    fn sheet_cells(xml: &str) -> Vec<Vec<(bool, String)>> {
        let mut reader = quick_xml::Reader::from_str(xml);
        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut styled = false;
        let mut in_value = false;
        let mut text = String::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"c" => {
                        styled = e
                            .attributes()
                            .flatten()
                            .any(|a| a.key.as_ref() == b"s" && a.value.as_ref() == b"1");
                        text.clear();
                    }
                    b"t" | b"v" => in_value = true,
                    _ => {}
                },
                Event::Text(t) if in_value => text.push_str(&t.unescape().unwrap()),
                Event::End(e) => match e.local_name().as_ref() {
                    b"t" | b"v" => in_value = false,
                    b"c" => row.push((styled, text.clone())),
                    b"row" => rows.push(std::mem::take(&mut row)),
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }
        rows
    }

    #[test]
    fn writes_header_and_emphasizes_action_rows() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("movie_data.xlsx");
        let rows = vec![
            movie(1, "A", 7.5, &["Action"]),
            movie(2, "B", 6.0, &["Drama"]),
        ];

        write_report(&rows, &path).unwrap();

        let cells = sheet_cells(&read_part(&path, "xl/worksheets/sheet1.xml"));
        assert_eq!(cells.len(), 3);
        let header: Vec<&str> = cells[0].iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(header, REPORT_HEADERS);
        assert!(cells[0].iter().all(|(styled, _)| !styled));

        assert_eq!(cells[1].len(), 4);
        assert!(cells[1].iter().all(|(styled, _)| *styled));
        assert_eq!(cells[1][0].1, "1");
        assert_eq!(cells[1][2].1, "7.5");

        assert!(cells[2].iter().all(|(styled, _)| !styled));
        assert_eq!(cells[2][1].1, "B");
        assert_eq!(cells[2][3].1, "Drama");
    }

    #[test]
    fn spider_man_row_is_emphasized() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.xlsx");
        let rows = vec![movie(
            634649,
            "Spider-Man: No Way Home",
            7.94,
            &["Action", "Adventure", "Science Fiction"],
        )];
        write_report(&rows, &path).unwrap();

        let cells = sheet_cells(&read_part(&path, "xl/worksheets/sheet1.xml"));
        let texts: Vec<&str> = cells[1].iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "634649",
                "Spider-Man: No Way Home",
                "7.94",
                "Action, Adventure, Science Fiction"
            ]
        );
        assert!(cells[1].iter().all(|(styled, _)| *styled));
    }

    #[test]
    fn workbook_has_movies_sheet_frozen_header_and_fill() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.xlsx");
        write_report(&[], &path).unwrap();

        assert!(read_part(&path, "xl/workbook.xml").contains(r#"<sheet name="Movies""#));
        assert!(read_part(&path, "xl/worksheets/sheet1.xml").contains(r#"state="frozen""#));
        let styles = read_part(&path, "xl/styles.xml");
        assert!(styles.contains("<b/>"));
        assert!(styles.contains(r#"rgb="FFFFC7CE""#));
        assert!(read_part(&path, "[Content_Types].xml").contains("/xl/worksheets/sheet1.xml"));
    }

    #[test]
    fn empty_report_has_header_only() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.xlsx");
        write_report(&[], &path).unwrap();
        let cells = sheet_cells(&read_part(&path, "xl/worksheets/sheet1.xml"));
        assert_eq!(cells.len(), 1);
    }

    #[test]
    fn text_is_escaped_and_sanitized() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.xlsx");
        let rows = vec![movie(5, "Tom & Jerry <3 \u{1}\"quoted\"", 0.0, &[])];
        write_report(&rows, &path).unwrap();

        let cells = sheet_cells(&read_part(&path, "xl/worksheets/sheet1.xml"));
        assert_eq!(cells[1][1].1, "Tom & Jerry <3 \"quoted\"");
        assert_eq!(cells[1][2].1, "0");
        assert_eq!(cells[1][3].1, "");
    }

    #[test]
    fn rewrite_leaves_no_temp_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.xlsx");
        write_report(&[movie(1, "A", 1.0, &[])], &path).unwrap();
        write_report(&[movie(2, "B", 2.0, &[])], &path).unwrap();

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        let cells = sheet_cells(&read_part(&path, "xl/worksheets/sheet1.xml"));
        assert_eq!(cells[1][0].1, "2");
    }
}
