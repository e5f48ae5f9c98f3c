use std::collections::HashMap;

use crate::error::Error;
use crate::model::{Alignment, StyleCatalogue, StyleDefaults, StyleDefinition, StyleKind};

use super::{WML_NS, twips_attr, wml, wml_attr, wml_bool};

pub(super) fn parse_alignment(val: &str) -> Alignment {
    match val {
        "center" => Alignment::Center,
        "right" | "end" => Alignment::Right,
        "both" => Alignment::Justify,
        _ => Alignment::Left,
    }
}

fn parse_kind(val: Option<&str>) -> StyleKind {
    match val {
        Some("character") => StyleKind::Character,
        Some("table") => StyleKind::Table,
        Some("numbering") => StyleKind::Numbering,
        _ => StyleKind::Paragraph,
    }
}

/// Font family from w:rFonts. Theme references are left unresolved.
fn font_name(rpr: roxmltree::Node) -> Option<String> {
    let rfonts = wml(rpr, "rFonts")?;
    rfonts
        .attribute((WML_NS, "ascii"))
        .or_else(|| rfonts.attribute((WML_NS, "hAnsi")))
        .map(str::to_string)
}

fn half_points(rpr: roxmltree::Node) -> Option<f32> {
    wml_attr(rpr, "sz")
        .and_then(|v| v.parse::<f32>().ok())
        .map(|hp| hp / 2.0)
}

fn parse_defaults(root: roxmltree::Node) -> StyleDefaults {
    let rpr = wml(root, "docDefaults")
        .and_then(|n| wml(n, "rPrDefault"))
        .and_then(|n| wml(n, "rPr"));
    StyleDefaults {
        font_name: rpr.and_then(font_name),
        font_size: rpr.and_then(half_points),
    }
}

fn parse_style(node: roxmltree::Node, xml: &str) -> StyleDefinition {
    let ppr = wml(node, "pPr");
    let rpr = wml(node, "rPr");
    let spacing = ppr.and_then(|n| wml(n, "spacing"));

    StyleDefinition {
        kind: parse_kind(node.attribute((WML_NS, "type"))),
        name: wml_attr(node, "name").map(str::to_string),
        based_on: wml_attr(node, "basedOn").map(str::to_string),
        is_default: node
            .attribute((WML_NS, "default"))
            .is_some_and(|v| v == "1" || v == "true"),
        font_name: rpr.and_then(font_name),
        font_size: rpr.and_then(half_points),
        bold: rpr.and_then(|n| wml_bool(n, "b")),
        italic: rpr.and_then(|n| wml_bool(n, "i")),
        alignment: ppr.and_then(|n| wml_attr(n, "jc")).map(parse_alignment),
        space_before: spacing.and_then(|n| twips_attr(n, "before")),
        space_after: spacing.and_then(|n| twips_attr(n, "after")),
        num_id: ppr
            .and_then(|n| wml(n, "numPr"))
            .and_then(|n| wml_attr(n, "numId"))
            .map(str::to_string),
        raw: xml[node.range()].to_string(),
    }
}

pub(super) fn parse_styles(xml: &str) -> Result<StyleCatalogue, Error> {
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();

    let mut styles = HashMap::new();
    for style_node in root.children() {
        if style_node.tag_name().name() != "style"
            || style_node.tag_name().namespace() != Some(WML_NS)
        {
            continue;
        }
        let Some(style_id) = style_node.attribute((WML_NS, "styleId")) else {
            log::debug!("Skipping w:style without styleId");
            continue;
        };
        styles.insert(style_id.to_string(), parse_style(style_node, xml));
    }

    log::debug!("Parsed {} styles", styles.len());

    Ok(StyleCatalogue {
        defaults: parse_defaults(root),
        styles,
    })
}
