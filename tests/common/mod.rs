#![allow(dead_code)]

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::{fs, io};

use zip::write::SimpleFileOptions;

pub const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub const LETTER_SECT_PR: &str = r#"<w:sectPr w:rsidR="00F1"><w:headerReference w:type="default" r:id="rId8"/><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/><w:cols w:space="720"/><w:docGrid w:linePitch="360"/></w:sectPr>"#;

pub const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault></w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="0"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:rFonts w:ascii="Calibri Light"/><w:color w:val="2F5496"/><w:sz w:val="32"/></w:rPr></w:style>
  <w:style w:type="character" w:styleId="Emphasis"><w:name w:val="Emphasis"/><w:rPr><w:i/></w:rPr></w:style>
  <w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/></w:style>
</w:styles>"#;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const WORD_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

pub const THEME_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"/>"#;

pub fn heading(text: &str) -> String {
    format!(r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>{text}</w:t></w:r></w:p>"#)
}

pub fn paragraph(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
}

pub fn table() -> String {
    r#"<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/></w:tblPr><w:tblGrid><w:gridCol w:w="4680"/></w:tblGrid><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#.to_string()
}

pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{WML_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006">
  <w:body>
    {body}
  </w:body>
</w:document>"#
    )
}

/// Build an in-memory DOCX package from a body fragment.
pub fn docx_bytes(body: &str) -> Vec<u8> {
    package(&[
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", RELS_XML),
        ("word/document.xml", document_xml(body).as_str()),
        ("word/_rels/document.xml.rels", WORD_RELS_XML),
        ("word/styles.xml", STYLES_XML),
        ("word/theme/theme1.xml", THEME_XML),
    ])
}

pub fn package(parts: &[(&str, &str)]) -> Vec<u8> {
    package_with(parts, zip::CompressionMethod::Deflated)
}

pub fn package_with(parts: &[(&str, &str)], method: zip::CompressionMethod) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(io::Cursor::new(Vec::new()));
    let opt = SimpleFileOptions::default().compression_method(method);
    for (name, content) in parts {
        zip.start_file(*name, opt).expect("start zip entry");
        zip.write_all(content.as_bytes()).expect("write zip entry");
    }
    zip.finish().expect("finish zip").into_inner()
}

/// The standard test document: Letter, 1" margins, Heading1 + Normal styles.
pub fn letter_docx() -> Vec<u8> {
    let body = [
        heading("Title"),
        paragraph("First paragraph."),
        table(),
        paragraph("Second paragraph."),
        LETTER_SECT_PR.to_string(),
    ]
    .concat();
    docx_bytes(&body)
}

/// Overwrite the compressed and uncompressed sizes recorded for entry `name`
/// in its local header and central directory record. Entry data is untouched.
pub fn claim_entry_size(docx: &mut [u8], name: &str, size: u32) {
    // (signature, offset of sizes, offset of name length, offset of name)
    const HEADERS: [([u8; 4], usize, usize, usize); 2] = [
        ([0x50, 0x4b, 0x03, 0x04], 18, 26, 30),
        ([0x50, 0x4b, 0x01, 0x02], 20, 28, 46),
    ];
    for at in 0..docx.len().saturating_sub(4) {
        for (sig, sizes, name_len, name_at) in HEADERS {
            if docx[at..at + 4] != sig {
                continue;
            }
            let Some(len) = docx.get(at + name_len..at + name_len + 2) else {
                continue;
            };
            let len = u16::from_le_bytes([len[0], len[1]]) as usize;
            if docx.get(at + name_at..at + name_at + len) != Some(name.as_bytes()) {
                continue;
            }
            for field in [at + sizes, at + sizes + 4] {
                docx[field..field + 4].copy_from_slice(&size.to_le_bytes());
            }
        }
    }
}

pub fn read_entry(docx: &[u8], name: &str) -> Option<String> {
    use std::io::Read;
    let mut archive = zip::ZipArchive::new(io::Cursor::new(docx)).ok()?;
    let mut content = String::new();
    archive.by_name(name).ok()?.read_to_string(&mut content).ok()?;
    Some(content)
}

#[derive(Debug, PartialEq, Eq)]
pub struct RawGeometry {
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub orient: Option<String>,
    pub top: Option<i64>,
    pub right: Option<i64>,
    pub bottom: Option<i64>,
    pub left: Option<i64>,
}

/// Read the body-level sectPr geometry straight from document.xml, independent
/// of the library's own parser.
pub fn raw_geometry(document_xml: &str) -> Option<RawGeometry> {
    let doc = roxmltree::Document::parse(document_xml).ok()?;
    let body = doc
        .root_element()
        .children()
        .find(|n| n.has_tag_name((WML_NS, "body")))?;
    let sect = body
        .children()
        .filter(|n| n.has_tag_name((WML_NS, "sectPr")))
        .last()?;
    let child = |name: &str| sect.children().find(|n| n.has_tag_name((WML_NS, name)));
    let int = |node: Option<roxmltree::Node>, attr: &str| {
        node.and_then(|n| n.attribute((WML_NS, attr)))
            .and_then(|v| v.parse::<i64>().ok())
    };
    let pg_sz = child("pgSz");
    let pg_mar = child("pgMar");
    Some(RawGeometry {
        width: int(pg_sz, "w"),
        height: int(pg_sz, "h"),
        orient: pg_sz
            .and_then(|n| n.attribute((WML_NS, "orient")))
            .map(String::from),
        top: int(pg_mar, "top"),
        right: int(pg_mar, "right"),
        bottom: int(pg_mar, "bottom"),
        left: int(pg_mar, "left"),
    })
}

/// Count body-level children with the given WML local name.
pub fn body_children(document_xml: &str, name: &str) -> usize {
    let doc = roxmltree::Document::parse(document_xml).expect("document.xml parses");
    let body = doc
        .root_element()
        .children()
        .find(|n| n.has_tag_name((WML_NS, "body")))
        .expect("w:body");
    body.children()
        .filter(|n| n.has_tag_name((WML_NS, name)))
        .count()
}

fn load_skiplist() -> HashSet<String> {
    let path = Path::new("tests/fixtures/SKIPLIST");
    let Ok(content) = fs::read_to_string(path) else {
        return HashSet::new();
    };
    content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| l.to_string())
        .collect()
}

pub fn group_name(fixture: &Path) -> String {
    fixture
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string()
}

/// Output directory: tests/output/<group>/<case>/
pub fn output_dir(fixture: &Path) -> PathBuf {
    let case = fixture.file_name().unwrap().to_string_lossy();
    PathBuf::from("tests/output")
        .join(group_name(fixture))
        .join(case.as_ref())
}

/// Display name for tables: group/case (long names truncated to 16 chars)
pub fn display_name(fixture: &Path) -> String {
    let case = fixture.file_name().unwrap().to_string_lossy();
    let short = if case.len() > 16 {
        format!("{}..", &case[..16])
    } else {
        case.to_string()
    };
    format!("{}/{}", group_name(fixture), short)
}

/// Discover real-world fixtures under tests/fixtures/<group>/<case>/input.docx.
/// Filter with DOCXSTRIP_CASE (case name) and DOCXSTRIP_GROUP (folder name).
/// A missing fixtures directory yields no fixtures.
pub fn discover_fixtures() -> io::Result<Vec<PathBuf>> {
    let fixtures_dir = Path::new("tests/fixtures");
    if !fixtures_dir.is_dir() {
        return Ok(Vec::new());
    }
    let case_filter = std::env::var("DOCXSTRIP_CASE").ok();
    let group_filter = std::env::var("DOCXSTRIP_GROUP").ok();
    let skiplist = load_skiplist();
    let mut fixtures: Vec<PathBuf> = Vec::new();
    for group_entry in fs::read_dir(fixtures_dir)? {
        let group = group_entry?.path();
        if !group.is_dir() {
            continue;
        }
        let gname = group.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if let Some(ref gf) = group_filter {
            if gname != gf.as_str() {
                continue;
            }
        }
        for entry in fs::read_dir(&group)? {
            let path = entry?.path();
            if !path.is_dir() || !path.join("input.docx").exists() {
                continue;
            }
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if let Some(ref filter) = case_filter {
                if name == filter.as_str() {
                    fixtures.push(path);
                }
            } else if !skiplist.contains(name) && !skiplist.contains(gname) {
                fixtures.push(path);
            }
        }
    }
    fixtures.sort();
    Ok(fixtures)
}
