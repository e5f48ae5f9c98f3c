use crate::model::{BodyNode, Diagnostic, Document, SectionProperties};
use crate::overrides::{OverrideSpec, SectionField};

#[derive(Default)]
struct Removed {
    paragraphs: usize,
    tables: usize,
    other: usize,
    inner_sections: usize,
    section_nodes: usize,
}

/// Remove every body node except the governing sectPr, then merge `overrides`
/// onto that node. The retained sectPr is the one loaded from the document;
/// a synthesized one is used only when the body has none.
pub(crate) fn strip_document(doc: &mut Document, overrides: Option<&OverrideSpec>) {
    let mut removed = Removed::default();
    for node in &doc.body.nodes {
        match node {
            BodyNode::Paragraph(p) => {
                removed.paragraphs += 1;
                if p.section_break {
                    removed.inner_sections += 1;
                }
            }
            BodyNode::Table(_) => removed.tables += 1,
            BodyNode::Other(_) => removed.other += 1,
            BodyNode::SectionProperties(_) => removed.section_nodes += 1,
        }
    }

    let keep = doc
        .body
        .nodes
        .iter()
        .rposition(|n| matches!(n, BodyNode::SectionProperties(_)));
    let mut index = 0;
    doc.body.nodes.retain(|_| {
        let retained = Some(index) == keep;
        index += 1;
        retained
    });

    if keep.is_none() {
        log::warn!("Document body has no section properties; using fallback page geometry");
        doc.body
            .nodes
            .push(BodyNode::SectionProperties(SectionProperties::fallback_with_prefix(
                &doc.body.prefix,
            )));
        doc.diagnostics.push(Diagnostic::FallbackSectionProperties);
    }
    if removed.section_nodes > 1 {
        log::warn!(
            "Body has {} section property nodes; keeping the last",
            removed.section_nodes
        );
        doc.diagnostics
            .push(Diagnostic::DuplicateSectionProperties(removed.section_nodes));
    }
    if removed.inner_sections > 0 {
        log::warn!(
            "Discarded {} paragraph-level section break(s); only the final section's geometry is kept",
            removed.inner_sections
        );
        doc.diagnostics
            .push(Diagnostic::InnerSectionsDiscarded(removed.inner_sections));
    }

    let overridden = overrides.map(OverrideSpec::fields).unwrap_or_default();
    let defaulted: Vec<SectionField> = doc.section_properties().map_or_else(Vec::new, |sp| {
        sp.markup
            .defaulted
            .iter()
            .copied()
            .filter(|f| !overridden.contains(f))
            .collect()
    });
    if !defaulted.is_empty() {
        let diagnostic = Diagnostic::FallbackPageGeometry(defaulted);
        if !doc.diagnostics.contains(&diagnostic) {
            log::warn!("Section properties lack page geometry, using defaults: {diagnostic:?}");
            doc.diagnostics.push(diagnostic);
        }
    }

    log::debug!(
        "Stripped {} paragraphs, {} tables, {} other nodes",
        removed.paragraphs,
        removed.tables,
        removed.other
    );

    if let Some(spec) = overrides.filter(|s| !s.is_empty()) {
        if let Some(props) = doc.section_properties_mut() {
            spec.apply(props);
            log::debug!("Applied overrides for {:?}", spec.fields());
        }
    }
}
