//! Resource resolution for the traversal engine.
//!
//! Builds the per-scope font and XObject maps from a page or form
//! resource dictionary, following references through the document, and
//! classifies drawn XObjects as images (with their stencil-mask flag) or
//! forms (with their declared bounding box and matrix).

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::geom::{MATRIX_IDENTITY, Matrix};

/// Follows reference chains to the referenced object.
pub fn resolve<'a>(doc: &'a Document, mut obj: &'a Object) -> &'a Object {
    // Bounded to avoid reference cycles in broken documents.
    for _ in 0..16 {
        match obj {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(target) => obj = target,
                Err(_) => return obj,
            },
            _ => return obj,
        }
    }
    obj
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, obj).as_dict().ok()
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(n) => Some(*n as f64),
        Object::Real(n) => Some(f64::from(*n)),
        _ => None,
    }
}

/// The resource dictionary in effect for a page, honoring inheritance
/// through the page tree.
pub fn page_resources(doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
    let mut node = doc.get_object(page_id).ok()?.as_dict().ok()?;
    for _ in 0..64 {
        if let Ok(res) = node.get(b"Resources") {
            return resolve_dict(doc, res).cloned();
        }
        match node.get(b"Parent") {
            Ok(parent) => node = resolve_dict(doc, parent)?,
            Err(_) => break,
        }
    }
    None
}

/// Width metrics for one font resource, enough to measure runs.
///
/// Full glyph decoding belongs to a font subsystem; these metrics cover
/// simple fonts with a `Widths` array and fall back to a nominal width
/// otherwise.
#[derive(Debug, Clone)]
pub struct FontInfo {
    pub base_font: String,
    first_char: i64,
    widths: Vec<f64>,
    missing_width: f64,
    pub ascent: f64,
    pub descent: f64,
}

impl Default for FontInfo {
    fn default() -> Self {
        Self {
            base_font: String::new(),
            first_char: 0,
            widths: Vec::new(),
            missing_width: 500.0,
            ascent: 750.0,
            descent: -250.0,
        }
    }
}

impl FontInfo {
    /// Glyph width for a one-byte character code, in thousandths of text
    /// space.
    pub fn width(&self, code: u8) -> f64 {
        let index = i64::from(code) - self.first_char;
        if index >= 0
            && let Some(w) = self.widths.get(index as usize)
        {
            return *w;
        }
        self.missing_width
    }

    fn from_dict(doc: &Document, spec: &Dictionary) -> Self {
        let mut info = Self::default();
        if let Ok(Object::Name(name)) = spec.get(b"BaseFont") {
            info.base_font = String::from_utf8_lossy(name).into_owned();
        }
        if let Ok(first) = spec.get(b"FirstChar").map(|o| resolve(doc, o))
            && let Object::Integer(n) = first
        {
            info.first_char = *n;
        }
        if let Ok(widths) = spec.get(b"Widths").map(|o| resolve(doc, o))
            && let Object::Array(values) = widths
        {
            info.widths = values.iter().filter_map(number).collect();
        }
        if let Ok(descriptor) = spec.get(b"FontDescriptor")
            && let Some(descriptor) = resolve_dict(doc, descriptor)
        {
            if let Ok(v) = descriptor.get(b"Ascent").map(|o| resolve(doc, o))
                && let Some(v) = number(v)
            {
                info.ascent = v;
            }
            if let Ok(v) = descriptor.get(b"Descent").map(|o| resolve(doc, o))
                && let Some(v) = number(v)
            {
                info.descent = v;
            }
            if let Ok(v) = descriptor.get(b"MissingWidth").map(|o| resolve(doc, o))
                && let Some(v) = number(v)
            {
                info.missing_width = v;
            }
        }
        info
    }
}

/// Classification of a drawn XObject.
#[derive(Debug, Clone)]
pub enum XObjectKind {
    /// Raster image; `stencil` marks images used purely as clipping
    /// masks, which have no independent visible bounds.
    Image { stencil: bool },
    /// Form XObject or transparency group.
    Form {
        bbox: (f64, f64, f64, f64),
        matrix: Matrix,
        /// Whether the form carries a /Group entry (transparency group).
        group: bool,
    },
}

/// Fonts and XObjects visible at one nesting level.
///
/// A form's own resources shadow the enclosing scope while the form is
/// open; absent a `Resources` entry the enclosing scope stays in effect.
#[derive(Debug, Clone, Default)]
pub struct ResourceScope {
    pub fonts: HashMap<String, FontInfo>,
    pub xobjects: HashMap<String, ObjectId>,
}

impl ResourceScope {
    pub fn from_resources(doc: &Document, resources: &Dictionary) -> Self {
        let mut scope = Self::default();

        if let Ok(fonts) = resources.get(b"Font")
            && let Some(fonts) = resolve_dict(doc, fonts)
        {
            for (name, spec) in fonts.iter() {
                let Some(spec) = resolve_dict(doc, spec) else {
                    continue;
                };
                scope.fonts.insert(
                    String::from_utf8_lossy(name).into_owned(),
                    FontInfo::from_dict(doc, spec),
                );
            }
        }

        if let Ok(xobjects) = resources.get(b"XObject")
            && let Some(xobjects) = resolve_dict(doc, xobjects)
        {
            for (name, entry) in xobjects.iter() {
                if let Object::Reference(id) = entry {
                    scope
                        .xobjects
                        .insert(String::from_utf8_lossy(name).into_owned(), *id);
                } else {
                    debug!(
                        name = %String::from_utf8_lossy(name),
                        "ignoring non-reference XObject resource entry"
                    );
                }
            }
        }

        scope
    }

    pub fn for_page(doc: &Document, page_id: ObjectId) -> Self {
        page_resources(doc, page_id)
            .map(|res| Self::from_resources(doc, &res))
            .unwrap_or_default()
    }
}

/// Classifies the XObject stream behind `id`.
pub fn classify_xobject(doc: &Document, id: ObjectId) -> Option<XObjectKind> {
    let stream = doc.get_object(id).ok()?.as_stream().ok()?;
    let subtype = match stream.dict.get(b"Subtype") {
        Ok(Object::Name(name)) => name.as_slice(),
        _ => b"",
    };
    match subtype {
        b"Image" => {
            let stencil = matches!(
                stream.dict.get(b"ImageMask").map(|o| resolve(doc, o)),
                Ok(Object::Boolean(true))
            );
            Some(XObjectKind::Image { stencil })
        }
        b"Form" => {
            let bbox = match stream.dict.get(b"BBox").map(|o| resolve(doc, o)) {
                Ok(Object::Array(values)) if values.len() == 4 => {
                    let nums: Vec<f64> = values.iter().filter_map(number).collect();
                    if nums.len() == 4 {
                        (nums[0], nums[1], nums[2], nums[3])
                    } else {
                        (0.0, 0.0, 0.0, 0.0)
                    }
                }
                _ => (0.0, 0.0, 0.0, 0.0),
            };
            let matrix = match stream.dict.get(b"Matrix").map(|o| resolve(doc, o)) {
                Ok(Object::Array(values)) if values.len() == 6 => {
                    let nums: Vec<f64> = values.iter().filter_map(number).collect();
                    if nums.len() == 6 {
                        (nums[0], nums[1], nums[2], nums[3], nums[4], nums[5])
                    } else {
                        MATRIX_IDENTITY
                    }
                }
                _ => MATRIX_IDENTITY,
            };
            let group = stream.dict.has(b"Group");
            Some(XObjectKind::Form {
                bbox,
                matrix,
                group,
            })
        }
        _ => None,
    }
}

/// The form's own resource dictionary, if it declares one.
pub fn form_resources(doc: &Document, id: ObjectId) -> Option<Dictionary> {
    let stream = doc.get_object(id).ok()?.as_stream().ok()?;
    stream
        .dict
        .get(b"Resources")
        .ok()
        .and_then(|res| resolve_dict(doc, res))
        .cloned()
}

/// Decoded content bytes of a form XObject stream.
pub fn form_content(doc: &Document, id: ObjectId) -> Option<Vec<u8>> {
    let stream = doc.get_object(id).ok()?.as_stream().ok()?;
    stream
        .decompressed_content()
        .ok()
        .or_else(|| Some(stream.content.clone()))
}
