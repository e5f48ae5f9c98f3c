mod styles;
pub(crate) mod write;

use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::overrides::SectionField;
use crate::model::{
    Body, BodyNode, Document, Orientation, PackagePart, ParagraphNode, RawXml, SectionChild,
    SectionMarkup, SectionProperties, StyleCatalogue, XmlAttr,
};

pub(crate) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

pub(crate) const DOCUMENT_PART: &str = "word/document.xml";
pub(crate) const STYLES_PART: &str = "word/styles.xml";

/// Children of `w:sectPr` that precede `w:pgSz` in the schema sequence.
const BEFORE_PAGE_SIZE: &[&str] = &[
    "headerReference",
    "footerReference",
    "footnotePr",
    "endnotePr",
    "type",
];

/// Where a document is loaded from.
#[derive(Clone, Copy, Debug)]
pub enum DocumentSource<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

impl<'a> From<&'a Path> for DocumentSource<'a> {
    fn from(path: &'a Path) -> Self {
        DocumentSource::Path(path)
    }
}

impl<'a> From<&'a PathBuf> for DocumentSource<'a> {
    fn from(path: &'a PathBuf) -> Self {
        DocumentSource::Path(path.as_path())
    }
}

impl<'a> From<&'a [u8]> for DocumentSource<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        DocumentSource::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for DocumentSource<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        DocumentSource::Bytes(bytes.as_slice())
    }
}

pub(crate) fn twips_to_pts(twips: f32) -> f32 {
    twips / 20.0
}

pub(crate) fn wml<'a>(
    node: roxmltree::Node<'a, 'a>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(WML_NS))
}

pub(crate) fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

/// Parse a WML boolean toggle element (e.g., w:b, w:i).
/// Present with no val or val != "0"/"false" means true.
pub(crate) fn wml_bool(parent: roxmltree::Node, name: &str) -> Option<bool> {
    wml(parent, name).map(|n| {
        n.attribute((WML_NS, "val"))
            .is_none_or(|v| v != "0" && v != "false")
    })
}

pub(crate) fn twips_attr(node: roxmltree::Node, attr: &str) -> Option<f32> {
    node.attribute((WML_NS, attr))
        .and_then(|v| v.parse::<f32>().ok())
        .map(twips_to_pts)
}

/// Parse a twips measure. Accepts plain integers, decimals, and universal
/// measures with a unit suffix (`1in`, `72pt`, `25.4mm`).
pub(crate) fn parse_twips(val: &str) -> Option<i64> {
    let val = val.trim();
    if let Ok(v) = val.parse::<i64>() {
        return Some(v);
    }
    let split = val.len().saturating_sub(2);
    let (num, factor) = match val.get(split..) {
        Some("in") => (&val[..split], 1440.0),
        Some("pt") => (&val[..split], 20.0),
        Some("pc" | "pi") => (&val[..split], 240.0),
        Some("mm") => (&val[..split], 1440.0 / 25.4),
        Some("cm") => (&val[..split], 1440.0 / 2.54),
        _ => (val, 1.0),
    };
    num.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| (v * factor).round() as i64)
}

pub(crate) fn qname(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{prefix}:{local}")
    }
}

fn wml_prefix(node: roxmltree::Node) -> String {
    node.lookup_prefix(WML_NS).unwrap_or("").to_string()
}

/// Namespace declarations made on `node` itself rather than inherited.
fn namespace_decls(node: roxmltree::Node) -> Vec<XmlAttr> {
    let parent = node.parent_element();
    node.namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .filter(|ns| {
            parent.is_none_or(|p| p.lookup_namespace_uri(ns.name()) != Some(ns.uri()))
        })
        .map(|ns| XmlAttr {
            name: ns.name().map_or("xmlns".to_string(), |p| format!("xmlns:{p}")),
            value: ns.uri().to_string(),
        })
        .collect()
}

/// Namespace declarations and attributes of `node` with their qualified names,
/// skipping WML attributes named in `skip`.
fn collect_attrs(node: roxmltree::Node, skip: &[&str]) -> Vec<XmlAttr> {
    let mut attrs = namespace_decls(node);
    attrs.extend(node.attributes().filter_map(|a| {
        let name = match a.namespace() {
            None => a.name().to_string(),
            Some(WML_NS) if skip.contains(&a.name()) => return None,
            Some(XML_NS) => format!("xml:{}", a.name()),
            Some(ns) => match node.lookup_prefix(ns) {
                Some(p) if !p.is_empty() => format!("{p}:{}", a.name()),
                _ => {
                    log::debug!("Dropping attribute {} with unbound namespace {ns}", a.name());
                    return None;
                }
            },
        };
        Some(XmlAttr {
            name,
            value: a.value().to_string(),
        })
    }));
    attrs
}

/// Read one geometry attribute into `slot`. A missing or unreadable value
/// leaves the default in place and records `field` as defaulted.
fn geometry_attr<T: TryFrom<i64>>(
    node: roxmltree::Node,
    attr: &str,
    field: SectionField,
    slot: &mut T,
    defaulted: &mut Vec<SectionField>,
) {
    let tag = node.tag_name().name();
    let Some(raw) = node.attribute((WML_NS, attr)) else {
        log::debug!("{tag} has no {attr} attribute, using default");
        defaulted.push(field);
        return;
    };
    match parse_twips(raw).and_then(|v| T::try_from(v).ok()) {
        Some(v) => *slot = v,
        None => {
            log::warn!("Unreadable {tag}@{attr}=\"{raw}\", using default");
            defaulted.push(field);
        }
    }
}

pub(crate) fn parse_section_properties(node: roxmltree::Node, xml: &str) -> SectionProperties {
    let mut props = SectionProperties::fallback_with_prefix(&wml_prefix(node));
    let mut markup = SectionMarkup {
        prefix: props.markup.prefix.clone(),
        attrs: collect_attrs(node, &[]),
        ..SectionMarkup::default()
    };

    let mut page_size_at = 0;
    let mut has_page_size = false;
    let mut has_page_margins = false;

    for child in node.children().filter(|n| n.is_element()) {
        let is_wml = child.tag_name().namespace() == Some(WML_NS);
        match child.tag_name().name() {
            "pgSz" if is_wml && !has_page_size => {
                has_page_size = true;
                let d = &mut markup.defaulted;
                geometry_attr(child, "w", SectionField::PageWidth, &mut props.page_width, d);
                geometry_attr(child, "h", SectionField::PageHeight, &mut props.page_height, d);
                if let Some(orient) = child.attribute((WML_NS, "orient")) {
                    markup.explicit_orientation = true;
                    props.orientation = Orientation::parse(orient).unwrap_or_else(|| {
                        log::warn!("Unknown page orientation \"{orient}\", assuming portrait");
                        Orientation::Portrait
                    });
                }
                markup.page_size_attrs = collect_attrs(child, &["w", "h", "orient"]);
                markup.children.push(SectionChild::PageSize);
            }
            "pgMar" if is_wml && !has_page_margins => {
                has_page_margins = true;
                let margins = [
                    ("top", SectionField::MarginTop, &mut props.margin_top),
                    ("right", SectionField::MarginRight, &mut props.margin_right),
                    ("bottom", SectionField::MarginBottom, &mut props.margin_bottom),
                    ("left", SectionField::MarginLeft, &mut props.margin_left),
                ];
                for (attr, field, slot) in margins {
                    geometry_attr(child, attr, field, slot, &mut markup.defaulted);
                }
                markup.page_margin_attrs =
                    collect_attrs(child, &["top", "bottom", "left", "right"]);
                markup.children.push(SectionChild::PageMargins);
            }
            name => {
                markup
                    .children
                    .push(SectionChild::Raw(xml[child.range()].to_string()));
                if is_wml && BEFORE_PAGE_SIZE.contains(&name) {
                    page_size_at = markup.children.len();
                }
            }
        }
    }

    // A sectPr without pgSz/pgMar still gets explicit geometry, placed where
    // the schema sequence expects it.
    if !has_page_size {
        log::debug!("sectPr has no pgSz, using default page size");
        markup.children.insert(page_size_at, SectionChild::PageSize);
        markup
            .defaulted
            .extend([SectionField::PageWidth, SectionField::PageHeight]);
    }
    if !has_page_margins {
        log::debug!("sectPr has no pgMar, using default margins");
        let after_size = markup
            .children
            .iter()
            .position(|c| *c == SectionChild::PageSize)
            .map_or(page_size_at, |i| i + 1);
        markup.children.insert(after_size, SectionChild::PageMargins);
        markup.page_margin_attrs = props.markup.page_margin_attrs.clone();
        markup.defaulted.extend([
            SectionField::MarginTop,
            SectionField::MarginRight,
            SectionField::MarginBottom,
            SectionField::MarginLeft,
        ]);
    }

    props.markup = markup;
    props
}

fn parse_paragraph(node: roxmltree::Node, raw: String) -> ParagraphNode {
    let ppr = wml(node, "pPr");
    ParagraphNode {
        raw: RawXml(raw),
        style_id: ppr.and_then(|p| wml_attr(p, "pStyle")).map(str::to_string),
        section_break: ppr.and_then(|p| wml(p, "sectPr")).is_some(),
    }
}

pub(crate) fn parse_body(xml: &str) -> Result<Body, Error> {
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();
    let body = wml(root, "body")
        .ok_or_else(|| Error::InvalidDocx("missing w:body in word/document.xml".into()))?;
    let prefix = wml_prefix(body);

    let range = body.range();
    let (head, tail) = match (body.first_child(), body.last_child()) {
        (Some(first), Some(last)) => (
            xml[..first.range().start].to_string(),
            xml[last.range().end..].to_string(),
        ),
        _ => {
            let raw = &xml[range.clone()];
            if raw.ends_with("/>") {
                let name = qname(&prefix, "body");
                (
                    format!("{}<{name}>", &xml[..range.start]),
                    format!("</{name}>{}", &xml[range.end..]),
                )
            } else {
                let split = range.start + raw.rfind("</").unwrap_or(raw.len());
                (xml[..split].to_string(), xml[split..].to_string())
            }
        }
    };

    let mut nodes = Vec::new();
    for child in body.children() {
        if child.is_text() {
            continue;
        }
        let raw = xml[child.range()].to_string();
        if !child.is_element() || child.tag_name().namespace() != Some(WML_NS) {
            nodes.push(BodyNode::Other(RawXml(raw)));
            continue;
        }
        let node = match child.tag_name().name() {
            "p" => BodyNode::Paragraph(parse_paragraph(child, raw)),
            "tbl" => BodyNode::Table(RawXml(raw)),
            "sectPr" => BodyNode::SectionProperties(parse_section_properties(child, xml)),
            _ => BodyNode::Other(RawXml(raw)),
        };
        nodes.push(node);
    }

    log::debug!("Parsed body: {} nodes, WML prefix \"{prefix}\"", nodes.len());

    Ok(Body {
        prefix,
        head,
        nodes,
        tail,
    })
}

fn read_parts<R: Read + Seek>(zip: &mut zip::ZipArchive<R>) -> Result<Vec<PackagePart>, Error> {
    let mut parts = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| Error::InvalidDocx(format!("unreadable ZIP entry #{i}: {e}")))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|e| Error::InvalidDocx(format!("corrupt ZIP entry {name}: {e}")))?;
        parts.push(PackagePart { name, data });
    }
    Ok(parts)
}

fn part_text<'a>(parts: &'a [PackagePart], name: &str) -> Result<Option<&'a str>, Error> {
    let Some(part) = parts.iter().find(|p| p.name == name) else {
        return Ok(None);
    };
    let text = std::str::from_utf8(&part.data)
        .map_err(|e| Error::InvalidDocx(format!("{name} is not UTF-8: {e}")))?;
    Ok(Some(text.strip_prefix('\u{feff}').unwrap_or(text)))
}

fn parse_archive<R: Read + Seek>(mut zip: zip::ZipArchive<R>) -> Result<Document, Error> {
    let parts = read_parts(&mut zip)?;

    let xml = part_text(&parts, DOCUMENT_PART)?.ok_or_else(|| {
        Error::InvalidDocx("missing word/document.xml (is this a DOCX file?)".into())
    })?;
    let body = parse_body(xml)?;

    let styles = match part_text(&parts, STYLES_PART)? {
        Some(xml) => styles::parse_styles(xml)?,
        None => {
            log::debug!("No {STYLES_PART}; style catalogue is empty");
            StyleCatalogue::default()
        }
    };

    Ok(Document {
        parts,
        body,
        styles,
        diagnostics: Vec::new(),
    })
}

pub fn parse(path: &Path) -> Result<Document, Error> {
    let file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
            std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
        ),
        _ => Error::Io(e),
    })?;

    let zip = zip::ZipArchive::new(file)
        .map_err(|_| Error::InvalidDocx("file is not a ZIP archive".into()))?;
    parse_archive(zip)
}

pub fn parse_bytes(bytes: &[u8]) -> Result<Document, Error> {
    let zip = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|_| Error::InvalidDocx("input is not a ZIP archive".into()))?;
    parse_archive(zip)
}

pub fn load(source: DocumentSource) -> Result<Document, Error> {
    match source {
        DocumentSource::Path(path) => parse(path),
        DocumentSource::Bytes(bytes) => parse_bytes(bytes),
    }
}
