use crate::report::Report;
use anyhow::Context;
use std::io::{Cursor, Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTENT_TYPES_ENTRY: &str = "[Content_Types].xml";
const RELS_ENTRY: &str = "_rels/.rels";
const DOCUMENT_ENTRY: &str = "word/document.xml";
const CORE_PROPS_ENTRY: &str = "docProps/core.xml";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

// A4 portrait in twentieths of a point, one-inch margins.
const SECTION_PROPS_XML: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#;
const TABLE_WIDTH_TWIPS: usize = 9026;

// Run sizes are half-points.
const TITLE_SIZE: u32 = 32;
const HEADING_SIZE: u32 = 28;
const BODY_SIZE: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub alignment: Alignment,
}

impl Paragraph {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            runs: vec![Run {
                text: text.into(),
                bold: false,
                size: None,
            }],
            alignment: Alignment::Left,
        }
    }

    fn styled(text: impl Into<String>, bold: bool, size: u32, alignment: Alignment) -> Self {
        Self {
            runs: vec![Run {
                text: text.into(),
                bold,
                size: Some(size),
            }],
            alignment,
        }
    }

    fn labeled(label: &str, value: &str) -> Self {
        Self {
            runs: vec![
                Run {
                    text: format!("{}: ", label),
                    bold: true,
                    size: Some(BODY_SIZE),
                },
                Run {
                    text: value.to_string(),
                    bold: false,
                    size: Some(BODY_SIZE),
                },
            ],
            alignment: Alignment::Left,
        }
    }

    fn blank() -> Self {
        Self {
            runs: Vec::new(),
            alignment: Alignment::Left,
        }
    }

    #[cfg(test)]
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Vec<Paragraph>>,
}

impl Table {
    fn with_header(header: &[String], body: Vec<Vec<String>>) -> Self {
        let mut rows: Vec<Vec<Paragraph>> = vec![header
            .iter()
            .map(|h| Paragraph {
                runs: vec![Run {
                    text: h.clone(),
                    bold: true,
                    size: None,
                }],
                alignment: Alignment::Left,
            })
            .collect()];
        rows.extend(
            body.into_iter()
                .map(|r| r.into_iter().map(Paragraph::plain).collect::<Vec<_>>()),
        );
        Self { rows }
    }

    #[cfg(test)]
    pub fn row_texts(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| r.iter().map(Paragraph::text).collect())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub creator: String,
    pub blocks: Vec<Block>,
}

#[cfg(test)]
impl Document {
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        })
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
    }
}

/// Lays the report out as paragraphs and tables. Values are copied from the
/// report as-is; nothing is recomputed here.
pub fn document_from_report(report: &Report) -> Document {
    let mut blocks = Vec::new();
    let mut para = |p: Paragraph| blocks.push(Block::Paragraph(p));

    let h = &report.header;
    para(Paragraph::styled(
        h.school_name.clone(),
        true,
        TITLE_SIZE,
        Alignment::Center,
    ));
    for tagline in &h.taglines {
        para(Paragraph::styled(
            tagline.clone(),
            false,
            BODY_SIZE,
            Alignment::Center,
        ));
    }
    for line in [&h.campus_line, &h.year_line, &h.title_line] {
        para(Paragraph::styled(
            line.clone(),
            false,
            BODY_SIZE,
            Alignment::Center,
        ));
    }
    para(Paragraph::blank());
    for field in &report.identity {
        para(Paragraph::labeled(&field.label, &field.value));
    }
    para(Paragraph::blank());
    para(Paragraph::styled(
        "Academic Performance",
        true,
        HEADING_SIZE,
        Alignment::Center,
    ));

    blocks.push(Block::Table(Table::with_header(
        &report.academic_columns,
        report
            .academic_rows
            .iter()
            .map(|r| r.cells().to_vec())
            .collect(),
    )));

    let mut para = |p: Paragraph| blocks.push(Block::Paragraph(p));
    para(Paragraph::blank());
    for cell in report
        .summary
        .cells
        .iter()
        .chain(report.class_statistics.iter())
    {
        para(Paragraph::labeled(&cell.label, &cell.value));
    }
    para(Paragraph::blank());
    para(Paragraph::styled(
        "General Progress",
        true,
        HEADING_SIZE,
        Alignment::Center,
    ));

    let progress = &report.general_progress;
    let labels: Vec<String> = progress.cells.iter().map(|c| c.label.clone()).collect();
    let grades: Vec<String> = progress.cells.iter().map(|c| c.text().to_string()).collect();
    blocks.push(Block::Table(Table::with_header(&labels, vec![grades])));

    let mut para = |p: Paragraph| blocks.push(Block::Paragraph(p));
    para(Paragraph::styled(
        progress.legend.clone(),
        true,
        BODY_SIZE,
        Alignment::Center,
    ));
    para(Paragraph::blank());
    for block in report
        .activity_comments
        .iter()
        .chain(report.teacher_comments.iter())
    {
        para(Paragraph::styled(
            block.title.clone(),
            true,
            BODY_SIZE,
            Alignment::Left,
        ));
        para(Paragraph::styled(
            block.body.clone(),
            false,
            BODY_SIZE,
            Alignment::Left,
        ));
    }
    para(Paragraph::blank());
    for sig in &report.signatures {
        para(Paragraph::labeled(
            &sig.role,
            sig.name.as_deref().unwrap_or(""),
        ));
    }

    Document {
        title: format!("{} Result Card", report.student_name),
        creator: report.header.school_name.clone(),
        blocks,
    }
}

/// Characters XML 1.0 cannot carry at all, even as references.
fn is_xml_forbidden(c: char) -> bool {
    matches!(
        c,
        '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}'
    )
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            c if is_xml_forbidden(c) => {}
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn paragraph_xml(p: &Paragraph, out: &mut String) {
    out.push_str("<w:p>");
    if p.alignment == Alignment::Center {
        out.push_str(r#"<w:pPr><w:jc w:val="center"/></w:pPr>"#);
    }
    for run in &p.runs {
        out.push_str("<w:r>");
        if run.bold || run.size.is_some() {
            out.push_str("<w:rPr>");
            if run.bold {
                out.push_str("<w:b/>");
            }
            if let Some(size) = run.size {
                out.push_str(&format!(
                    r#"<w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#
                ));
            }
            out.push_str("</w:rPr>");
        }
        out.push_str(r#"<w:t xml:space="preserve">"#);
        out.push_str(&xml_escape(&run.text));
        out.push_str("</w:t></w:r>");
    }
    out.push_str("</w:p>");
}

fn table_xml(t: &Table, out: &mut String) {
    let columns = t.rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let col_width = TABLE_WIDTH_TWIPS / columns;
    out.push_str("<w:tbl><w:tblPr>");
    out.push_str(&format!(
        r#"<w:tblW w:w="{TABLE_WIDTH_TWIPS}" w:type="dxa"/>"#
    ));
    out.push_str("<w:tblBorders>");
    for edge in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        out.push_str(&format!(
            r#"<w:{edge} w:val="single" w:sz="4" w:space="0" w:color="000000"/>"#
        ));
    }
    out.push_str("</w:tblBorders></w:tblPr><w:tblGrid>");
    for _ in 0..columns {
        out.push_str(&format!(r#"<w:gridCol w:w="{col_width}"/>"#));
    }
    out.push_str("</w:tblGrid>");
    for row in &t.rows {
        out.push_str("<w:tr>");
        for cell in row {
            out.push_str(&format!(
                r#"<w:tc><w:tcPr><w:tcW w:w="{col_width}" w:type="dxa"/></w:tcPr>"#
            ));
            paragraph_xml(cell, out);
            out.push_str("</w:tc>");
        }
        out.push_str("</w:tr>");
    }
    out.push_str("</w:tbl>");
}

pub fn document_xml(doc: &Document) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
    );
    for block in &doc.blocks {
        match block {
            Block::Paragraph(p) => paragraph_xml(p, &mut out),
            Block::Table(t) => table_xml(t, &mut out),
        }
    }
    out.push_str(SECTION_PROPS_XML);
    out.push_str("</w:body></w:document>");
    out
}

fn core_props_xml(doc: &Document) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{}</dc:title><dc:creator>{}</dc:creator></cp:coreProperties>"#,
        xml_escape(&doc.title),
        xml_escape(&doc.creator)
    )
}

pub fn write_docx<W: Write + Seek>(doc: &Document, writer: W) -> anyhow::Result<W> {
    let mut zip = ZipWriter::new(writer);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, String); 4] = [
        (CONTENT_TYPES_ENTRY, CONTENT_TYPES_XML.to_string()),
        (RELS_ENTRY, RELS_XML.to_string()),
        (DOCUMENT_ENTRY, document_xml(doc)),
        (CORE_PROPS_ENTRY, core_props_xml(doc)),
    ];
    for (name, body) in parts {
        zip.start_file(name, opts)
            .with_context(|| format!("failed to start {} entry", name))?;
        zip.write_all(body.as_bytes())
            .with_context(|| format!("failed to write {} entry", name))?;
    }
    zip.finish().context("failed to finalize docx package")
}

pub fn encode(report: &Report) -> anyhow::Result<Vec<u8>> {
    let doc = document_from_report(report);
    let cursor = write_docx(&doc, Cursor::new(Vec::new()))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_escape_covers_markup_characters() {
        assert_eq!(
            xml_escape(r#"Tom & "Jerry" <'x'>"#),
            "Tom &amp; &quot;Jerry&quot; &lt;&apos;x&apos;&gt;"
        );
    }

    #[test]
    fn xml_escape_drops_characters_xml_cannot_hold() {
        assert_eq!(xml_escape("line\u{1}\u{b}tab"), "linetab");
        assert_eq!(xml_escape("a\u{0}b\u{1f}c\u{fffe}d\u{ffff}"), "abcd");
        assert_eq!(xml_escape("keep\ttab\nand\r\u{fffd}"), "keep\ttab\nand\r\u{fffd}");
    }

    #[test]
    fn centered_bold_run_markup() {
        let mut out = String::new();
        paragraph_xml(
            &Paragraph::styled("Head", true, TITLE_SIZE, Alignment::Center),
            &mut out,
        );
        assert_eq!(
            out,
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:b/><w:sz w:val="32"/><w:szCs w:val="32"/></w:rPr><w:t xml:space="preserve">Head</w:t></w:r></w:p>"#
        );
    }
}
