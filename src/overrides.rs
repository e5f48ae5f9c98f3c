//! Caller-supplied page geometry that takes precedence over a loaded document's
//! section properties.
//!
//! Overrides arrive as JSON in either a nested form
//! (`{"page_size": {"width": ..}, "margins": {"left": ..}}`) or the older flat
//! form (`{"page_width": .., "left_margin": ..}`). When both name the same
//! field the nested value wins. Values are integers in twips.

use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::model::{Orientation, SectionProperties};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionField {
    PageWidth,
    PageHeight,
    Orientation,
    MarginLeft,
    MarginRight,
    MarginTop,
    MarginBottom,
}

struct FieldSource {
    field: SectionField,
    nested: (&'static str, &'static str),
    flat: &'static str,
}

/// Field resolution order: nested path first, then the flat key.
const FIELD_SOURCES: &[FieldSource] = &[
    FieldSource {
        field: SectionField::PageWidth,
        nested: ("page_size", "width"),
        flat: "page_width",
    },
    FieldSource {
        field: SectionField::PageHeight,
        nested: ("page_size", "height"),
        flat: "page_height",
    },
    FieldSource {
        field: SectionField::Orientation,
        nested: ("page_size", "orientation"),
        flat: "orientation",
    },
    FieldSource {
        field: SectionField::MarginLeft,
        nested: ("margins", "left"),
        flat: "left_margin",
    },
    FieldSource {
        field: SectionField::MarginRight,
        nested: ("margins", "right"),
        flat: "right_margin",
    },
    FieldSource {
        field: SectionField::MarginTop,
        nested: ("margins", "top"),
        flat: "top_margin",
    },
    FieldSource {
        field: SectionField::MarginBottom,
        nested: ("margins", "bottom"),
        flat: "bottom_margin",
    },
];

const CONTAINERS: &[&str] = &["page_size", "margins"];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OverrideSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(rename = "left_margin", skip_serializing_if = "Option::is_none")]
    pub margin_left: Option<i32>,
    #[serde(rename = "right_margin", skip_serializing_if = "Option::is_none")]
    pub margin_right: Option<i32>,
    #[serde(rename = "top_margin", skip_serializing_if = "Option::is_none")]
    pub margin_top: Option<i32>,
    #[serde(rename = "bottom_margin", skip_serializing_if = "Option::is_none")]
    pub margin_bottom: Option<i32>,
}

fn describe(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(n) if n.is_f64() => "a decimal number",
        Value::Number(_) => "an out-of-range integer",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn integer(path: &str, v: &Value) -> Result<i64, Error> {
    v.as_i64().ok_or_else(|| {
        Error::invalid_override(path, format!("expected an integer, got {}", describe(v)))
    })
}

fn page_length(path: &str, v: &Value) -> Result<u32, Error> {
    let n = integer(path, v)?;
    if n < 1 || n > i32::MAX as i64 {
        return Err(Error::invalid_override(
            path,
            format!("page dimension must be a positive number of twips, got {n}"),
        ));
    }
    Ok(n as u32)
}

fn margin(path: &str, v: &Value, signed: bool) -> Result<i32, Error> {
    let n = integer(path, v)?;
    if !signed && n < 0 {
        return Err(Error::invalid_override(
            path,
            format!("margin must not be negative, got {n}"),
        ));
    }
    i32::try_from(n).map_err(|_| Error::invalid_override(path, format!("{n} is out of range")))
}

fn orientation(path: &str, v: &Value) -> Result<Orientation, Error> {
    v.as_str().and_then(Orientation::parse).ok_or_else(|| {
        Error::invalid_override(path, "expected \"portrait\" or \"landscape\"")
    })
}

impl OverrideSpec {
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| Error::invalid_override("<document>", e.to_string()))?;
        Self::from_json(&value)
    }

    /// Validate and resolve an override object. Any malformed value, including
    /// one shadowed by a nested value, rejects the whole spec.
    pub fn from_json(value: &Value) -> Result<Self, Error> {
        let obj = value.as_object().ok_or_else(|| {
            Error::invalid_override(
                "<document>",
                format!("expected an object, got {}", describe(value)),
            )
        })?;

        for &name in CONTAINERS {
            match obj.get(name) {
                None | Some(Value::Null) | Some(Value::Object(_)) => {}
                Some(other) => {
                    return Err(Error::invalid_override(
                        name,
                        format!("expected an object, got {}", describe(other)),
                    ));
                }
            }
        }

        let mut spec = OverrideSpec::default();
        for src in FIELD_SOURCES {
            let (container, key) = src.nested;
            let nested = obj
                .get(container)
                .and_then(Value::as_object)
                .and_then(|o| o.get(key))
                .filter(|v| !v.is_null());
            let flat = obj.get(src.flat).filter(|v| !v.is_null());

            if let Some(v) = flat {
                spec.set(src.field, src.flat, v)?;
            }
            if let Some(v) = nested {
                spec.set(src.field, &format!("{container}.{key}"), v)?;
            }
        }

        for key in obj.keys() {
            let known = CONTAINERS.contains(&key.as_str())
                || FIELD_SOURCES.iter().any(|s| s.flat == key.as_str());
            if !known {
                log::debug!("Ignoring unrecognized override key `{key}`");
            }
        }

        Ok(spec)
    }

    fn set(&mut self, field: SectionField, path: &str, v: &Value) -> Result<(), Error> {
        match field {
            SectionField::PageWidth => self.page_width = Some(page_length(path, v)?),
            SectionField::PageHeight => self.page_height = Some(page_length(path, v)?),
            SectionField::Orientation => self.orientation = Some(orientation(path, v)?),
            SectionField::MarginLeft => self.margin_left = Some(margin(path, v, false)?),
            SectionField::MarginRight => self.margin_right = Some(margin(path, v, false)?),
            // Top and bottom margins may be negative: text is allowed to overlap
            // the header/footer.
            SectionField::MarginTop => self.margin_top = Some(margin(path, v, true)?),
            SectionField::MarginBottom => self.margin_bottom = Some(margin(path, v, true)?),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Fields this spec sets, in resolution-table order.
    pub fn fields(&self) -> Vec<SectionField> {
        let present = [
            (SectionField::PageWidth, self.page_width.is_some()),
            (SectionField::PageHeight, self.page_height.is_some()),
            (SectionField::Orientation, self.orientation.is_some()),
            (SectionField::MarginLeft, self.margin_left.is_some()),
            (SectionField::MarginRight, self.margin_right.is_some()),
            (SectionField::MarginTop, self.margin_top.is_some()),
            (SectionField::MarginBottom, self.margin_bottom.is_some()),
        ];
        present
            .into_iter()
            .filter_map(|(f, set)| set.then_some(f))
            .collect()
    }

    /// Field-wise combination where values in `self` win over `base`.
    pub fn merge_over(self, base: OverrideSpec) -> OverrideSpec {
        OverrideSpec {
            page_width: self.page_width.or(base.page_width),
            page_height: self.page_height.or(base.page_height),
            orientation: self.orientation.or(base.orientation),
            margin_left: self.margin_left.or(base.margin_left),
            margin_right: self.margin_right.or(base.margin_right),
            margin_top: self.margin_top.or(base.margin_top),
            margin_bottom: self.margin_bottom.or(base.margin_bottom),
        }
    }

    /// Write every present field onto `props`; absent fields keep their values.
    pub fn apply(&self, props: &mut SectionProperties) {
        if let Some(w) = self.page_width {
            props.page_width = w;
        }
        if let Some(h) = self.page_height {
            props.page_height = h;
        }
        if let Some(o) = self.orientation {
            props.orientation = o;
            props.markup.explicit_orientation = true;
        }
        if let Some(m) = self.margin_left {
            props.margin_left = m;
        }
        if let Some(m) = self.margin_right {
            props.margin_right = m;
        }
        if let Some(m) = self.margin_top {
            props.margin_top = m;
        }
        if let Some(m) = self.margin_bottom {
            props.margin_bottom = m;
        }
    }
}
