use std::collections::HashMap;

use serde::Serialize;

use crate::overrides::SectionField;

pub const TWIPS_PER_INCH: i32 = 1440;
pub const TWIPS_PER_POINT: i32 = 20;

pub fn inches_to_twips(inches: f32) -> i32 {
    (inches * TWIPS_PER_INCH as f32).round() as i32
}

pub fn points_to_twips(points: f32) -> i32 {
    (points * TWIPS_PER_POINT as f32).round() as i32
}

pub fn mm_to_twips(mm: f32) -> i32 {
    (mm * TWIPS_PER_INCH as f32 / 25.4).round() as i32
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }

    pub(crate) fn parse(val: &str) -> Option<Self> {
        if val.eq_ignore_ascii_case("portrait") {
            Some(Orientation::Portrait)
        } else if val.eq_ignore_ascii_case("landscape") {
            Some(Orientation::Landscape)
        } else {
            None
        }
    }
}

/// Attribute with its qualified name as written in the source and its unescaped value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct XmlAttr {
    pub(crate) name: String,
    pub(crate) value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SectionChild {
    PageSize,
    PageMargins,
    /// Any other child element, kept verbatim.
    Raw(String),
}

/// Everything in a `w:sectPr` that is not page geometry.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub(crate) struct SectionMarkup {
    pub(crate) prefix: String,
    pub(crate) attrs: Vec<XmlAttr>,
    pub(crate) page_size_attrs: Vec<XmlAttr>,
    pub(crate) page_margin_attrs: Vec<XmlAttr>,
    pub(crate) explicit_orientation: bool,
    pub(crate) children: Vec<SectionChild>,
    /// Geometry fields the source did not state; their values are defaults.
    pub(crate) defaulted: Vec<SectionField>,
}

/// Page geometry of a section. All lengths are twips (1/20 pt).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionProperties {
    pub page_width: u32,
    pub page_height: u32,
    pub orientation: Orientation,
    pub margin_top: i32,
    pub margin_bottom: i32,
    pub margin_left: i32,
    pub margin_right: i32,
    #[serde(skip)]
    pub(crate) markup: SectionMarkup,
}

impl SectionProperties {
    /// US Letter portrait with one-inch margins, used when a body carries no sectPr.
    pub fn fallback() -> Self {
        Self::fallback_with_prefix("w")
    }

    pub(crate) fn fallback_with_prefix(prefix: &str) -> Self {
        let q = |local: &str| {
            if prefix.is_empty() {
                local.to_string()
            } else {
                format!("{prefix}:{local}")
            }
        };
        SectionProperties {
            page_width: 12240,
            page_height: 15840,
            orientation: Orientation::Portrait,
            margin_top: 1440,
            margin_bottom: 1440,
            margin_left: 1440,
            margin_right: 1440,
            markup: SectionMarkup {
                prefix: prefix.to_string(),
                page_margin_attrs: vec![
                    XmlAttr { name: q("header"), value: "720".into() },
                    XmlAttr { name: q("footer"), value: "720".into() },
                    XmlAttr { name: q("gutter"), value: "0".into() },
                ],
                children: vec![SectionChild::PageSize, SectionChild::PageMargins],
                ..SectionMarkup::default()
            },
        }
    }
}

impl Default for SectionProperties {
    fn default() -> Self {
        Self::fallback()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawXml(pub(crate) String);

impl RawXml {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParagraphNode {
    pub(crate) raw: RawXml,
    pub style_id: Option<String>,
    /// True when the paragraph's pPr ends a section (mid-document sectPr).
    pub section_break: bool,
}

impl ParagraphNode {
    pub fn raw(&self) -> &str {
        self.raw.as_str()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BodyNode {
    Paragraph(ParagraphNode),
    Table(RawXml),
    Other(RawXml),
    SectionProperties(SectionProperties),
}

/// `word/document.xml` split around the body's children.
#[derive(Clone, Debug)]
pub(crate) struct Body {
    /// Prefix bound to the WordprocessingML namespace ("w" in practice).
    pub(crate) prefix: String,
    pub(crate) head: String,
    pub(crate) nodes: Vec<BodyNode>,
    pub(crate) tail: String,
}

#[derive(Clone, Debug)]
pub struct PackagePart {
    pub name: String,
    pub data: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleKind {
    Paragraph,
    Character,
    Table,
    Numbering,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StyleDefinition {
    pub kind: StyleKind,
    pub name: Option<String>,
    pub based_on: Option<String>,
    pub is_default: bool,
    pub font_name: Option<String>,
    pub font_size: Option<f32>, // points
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub alignment: Option<Alignment>,
    pub space_before: Option<f32>, // points
    pub space_after: Option<f32>,  // points
    pub num_id: Option<String>,
    pub raw: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleDefaults {
    pub font_name: Option<String>,
    pub font_size: Option<f32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleCatalogue {
    pub defaults: StyleDefaults,
    pub styles: HashMap<String, StyleDefinition>,
}

impl StyleCatalogue {
    pub fn get(&self, id: &str) -> Option<&StyleDefinition> {
        self.styles.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.styles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Style ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.styles.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn default_style(&self, kind: StyleKind) -> Option<(&str, &StyleDefinition)> {
        self.styles
            .iter()
            .find(|(_, s)| s.kind == kind && s.is_default)
            .map(|(id, s)| (id.as_str(), s))
    }
}

/// Degraded-path records produced while loading or stripping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// The body had no sectPr; synthesized defaults were used.
    FallbackSectionProperties,
    /// Paragraph-level section breaks dropped along with their paragraphs.
    InnerSectionsDiscarded(usize),
    /// More than one body-level sectPr; only the last one was kept.
    DuplicateSectionProperties(usize),
    /// The retained sectPr lacked these geometry fields (missing pgSz/pgMar or
    /// unreadable attributes) and no override supplied them; defaults were used.
    FallbackPageGeometry(Vec<SectionField>),
}

#[derive(Clone, Debug)]
pub struct Document {
    pub(crate) parts: Vec<PackagePart>,
    pub(crate) body: Body,
    pub(crate) styles: StyleCatalogue,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl Document {
    pub fn body(&self) -> &[BodyNode] {
        &self.body.nodes
    }

    pub fn styles(&self) -> &StyleCatalogue {
        &self.styles
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn used_fallback_section(&self) -> bool {
        self.diagnostics
            .contains(&Diagnostic::FallbackSectionProperties)
    }

    pub fn parts(&self) -> &[PackagePart] {
        &self.parts
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    /// The last body-level section properties, which govern the final section.
    pub fn section_properties(&self) -> Option<&SectionProperties> {
        self.body.nodes.iter().rev().find_map(|n| match n {
            BodyNode::SectionProperties(sp) => Some(sp),
            _ => None,
        })
    }

    pub fn section_properties_mut(&mut self) -> Option<&mut SectionProperties> {
        self.body.nodes.iter_mut().rev().find_map(|n| match n {
            BodyNode::SectionProperties(sp) => Some(sp),
            _ => None,
        })
    }

    pub fn paragraph_count(&self) -> usize {
        self.count(|n| matches!(n, BodyNode::Paragraph(_)))
    }

    pub fn table_count(&self) -> usize {
        self.count(|n| matches!(n, BodyNode::Table(_)))
    }

    pub fn section_properties_count(&self) -> usize {
        self.count(|n| matches!(n, BodyNode::SectionProperties(_)))
    }

    fn count(&self, pred: impl Fn(&BodyNode) -> bool) -> usize {
        self.body.nodes.iter().filter(|n| pred(n)).count()
    }
}
