mod docx;
mod error;
mod model;
mod overrides;
pub mod schema;
mod strip;

pub use docx::{DocumentSource, load, parse, parse_bytes};
pub use error::{Error, Stage};
pub use model::{
    Alignment, BodyNode, Diagnostic, Document, Orientation, PackagePart, ParagraphNode, RawXml,
    SectionProperties, StyleCatalogue, StyleDefaults, StyleDefinition, StyleKind, TWIPS_PER_INCH,
    TWIPS_PER_POINT, inches_to_twips, mm_to_twips, points_to_twips,
};
pub use overrides::{OverrideSpec, SectionField};

use std::path::Path;
use std::time::Instant;

/// Load `source` fresh and strip it down to a blank canvas that keeps the
/// original page geometry and style catalogue, with `overrides` merged on top.
pub fn strip<'a>(
    source: impl Into<DocumentSource<'a>>,
    overrides: Option<&OverrideSpec>,
) -> Result<Document, Error> {
    let t0 = Instant::now();

    let mut doc = docx::load(source.into())?;
    let t_load = t0.elapsed();

    strip::strip_document(&mut doc, overrides);
    let t_total = t0.elapsed();

    log::info!(
        "Timing: load={:.1}ms, strip={:.1}ms, total={:.1}ms ({} parts, {} styles)",
        t_load.as_secs_f64() * 1000.0,
        (t_total - t_load).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        doc.parts.len(),
        doc.styles.len(),
    );

    Ok(doc)
}

/// Like [`strip`], but takes the override as raw JSON. The override is
/// validated before the document is loaded.
pub fn strip_json<'a>(
    source: impl Into<DocumentSource<'a>>,
    overrides: Option<&serde_json::Value>,
) -> Result<Document, Error> {
    let spec = overrides.map(OverrideSpec::from_json).transpose()?;
    strip(source, spec.as_ref())
}

pub fn strip_path(input: &Path, overrides: Option<&OverrideSpec>) -> Result<Document, Error> {
    strip(input, overrides)
}

pub fn strip_bytes(input: &[u8], overrides: Option<&OverrideSpec>) -> Result<Document, Error> {
    strip(input, overrides)
}

/// Strip an already-loaded document in place.
pub fn strip_document(doc: &mut Document, overrides: Option<&OverrideSpec>) {
    strip::strip_document(doc, overrides);
}

impl Document {
    /// Serialized `word/document.xml` reflecting the current body.
    pub fn document_xml(&self) -> String {
        docx::write::document_xml(&self.body)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        docx::write::to_bytes(self)
    }

    pub fn save(&self, output: &Path) -> Result<(), Error> {
        docx::write::save(self, output)
    }
}
