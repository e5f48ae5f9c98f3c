use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;

use crate::error::Error;
use crate::model::{
    Body, BodyNode, Document, Orientation, SectionChild, SectionProperties, XmlAttr,
};

use super::{DOCUMENT_PART, qname};

fn push_escaped(out: &mut String, val: &str) {
    for c in val.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(c),
        }
    }
}

fn push_attr(out: &mut String, name: &str, val: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    push_escaped(out, val);
    out.push('"');
}

fn push_attrs(out: &mut String, attrs: &[XmlAttr]) {
    for a in attrs {
        push_attr(out, &a.name, &a.value);
    }
}

pub(crate) fn write_section_properties(out: &mut String, sp: &SectionProperties) {
    let m = &sp.markup;
    let q = |local: &str| qname(&m.prefix, local);

    out.push('<');
    out.push_str(&q("sectPr"));
    push_attrs(out, &m.attrs);
    out.push('>');

    for child in &m.children {
        match child {
            SectionChild::PageSize => {
                out.push('<');
                out.push_str(&q("pgSz"));
                push_attr(out, &q("w"), &sp.page_width.to_string());
                push_attr(out, &q("h"), &sp.page_height.to_string());
                if m.explicit_orientation || sp.orientation != Orientation::Portrait {
                    push_attr(out, &q("orient"), sp.orientation.as_str());
                }
                push_attrs(out, &m.page_size_attrs);
                out.push_str("/>");
            }
            SectionChild::PageMargins => {
                out.push('<');
                out.push_str(&q("pgMar"));
                push_attr(out, &q("top"), &sp.margin_top.to_string());
                push_attr(out, &q("right"), &sp.margin_right.to_string());
                push_attr(out, &q("bottom"), &sp.margin_bottom.to_string());
                push_attr(out, &q("left"), &sp.margin_left.to_string());
                push_attrs(out, &m.page_margin_attrs);
                out.push_str("/>");
            }
            SectionChild::Raw(raw) => out.push_str(raw),
        }
    }

    out.push_str("</");
    out.push_str(&q("sectPr"));
    out.push('>');
}

pub(crate) fn document_xml(body: &Body) -> String {
    let raw_len: usize = body
        .nodes
        .iter()
        .map(|n| match n {
            BodyNode::Paragraph(p) => p.raw().len(),
            BodyNode::Table(r) | BodyNode::Other(r) => r.as_str().len(),
            BodyNode::SectionProperties(_) => 512,
        })
        .sum();
    let mut out = String::with_capacity(body.head.len() + raw_len + body.tail.len());

    out.push_str(&body.head);
    for node in &body.nodes {
        match node {
            BodyNode::Paragraph(p) => out.push_str(p.raw()),
            BodyNode::Table(r) | BodyNode::Other(r) => out.push_str(r.as_str()),
            BodyNode::SectionProperties(sp) => write_section_properties(&mut out, sp),
        }
    }
    out.push_str(&body.tail);
    out
}

pub(crate) fn to_bytes(doc: &Document) -> Result<Vec<u8>, Error> {
    let document_xml = document_xml(&doc.body);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for part in &doc.parts {
        zip.start_file(part.name.clone(), options)?;
        if part.name == DOCUMENT_PART {
            zip.write_all(document_xml.as_bytes())?;
        } else {
            zip.write_all(&part.data)?;
        }
    }
    Ok(zip.finish()?.into_inner())
}

pub(crate) fn save(doc: &Document, path: &Path) -> Result<(), Error> {
    let bytes = to_bytes(doc)?;
    std::fs::write(path, &bytes).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", e, path.display()),
        ))
    })?;
    log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
