//! Text state tracking and run resolution.
//!
//! Tracks the text-object state (text matrix, line position, font,
//! spacing) across instructions and turns show-text instructions into
//! positioned [`TextRun`]s for the censoring policy. Widths come from the
//! simple-font metrics in [`super::resources::FontInfo`]; one-byte codes
//! are mapped directly to characters, which is as much decoding as the
//! policy needs for regex matching.

use lopdf::Object;
use lopdf::content::Operation;

use super::resources::{FontInfo, ResourceScope};
use crate::geom::{MATRIX_IDENTITY, Matrix, Point, apply_matrix_bbox, mult_matrix, translate_matrix};
use crate::handler::TextRun;

/// Text-object state, the subset of the graphics state that show-text
/// instructions depend on.
#[derive(Debug, Clone)]
pub struct TextState {
    /// Current font resource name (e.g. "F1").
    pub font: Option<String>,
    /// Font size in text space units.
    pub fontsize: f64,
    /// Character spacing (Tc).
    pub charspace: f64,
    /// Word spacing (Tw), applied to byte 32.
    pub wordspace: f64,
    /// Horizontal scaling percentage (Tz, 100 = normal).
    pub scaling: f64,
    /// Text leading (TL).
    pub leading: f64,
    /// Text rise (Ts).
    pub rise: f64,
    /// Text matrix (Tm).
    pub matrix: Matrix,
    /// Offset within the current line, advanced by shown runs.
    pub linematrix: Point,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            fontsize: 0.0,
            charspace: 0.0,
            wordspace: 0.0,
            scaling: 100.0,
            leading: 0.0,
            rise: 0.0,
            matrix: MATRIX_IDENTITY,
            linematrix: (0.0, 0.0),
        }
    }
}

impl TextState {
    pub fn new() -> Self {
        Self::default()
    }

    /// BT - begin text object.
    pub fn begin_text(&mut self) {
        self.matrix = MATRIX_IDENTITY;
        self.linematrix = (0.0, 0.0);
    }

    /// Td - move to the start of the next line, offset by (tx, ty).
    pub fn next_line(&mut self, tx: f64, ty: f64) {
        self.matrix = translate_matrix(self.matrix, (tx, ty));
        self.linematrix = (0.0, 0.0);
    }

    /// TD - like Td but also sets the leading to -ty.
    pub fn next_line_set_leading(&mut self, tx: f64, ty: f64) {
        self.leading = -ty;
        self.next_line(tx, ty);
    }

    /// Tm - set the text matrix directly.
    pub fn set_matrix(&mut self, m: Matrix) {
        self.matrix = m;
        self.linematrix = (0.0, 0.0);
    }

    /// T* - move to the start of the next line using the current leading.
    pub fn next_line_leading(&mut self) {
        self.next_line(0.0, -self.leading);
    }

    /// Text rendering matrix at the current line position.
    fn render_matrix(&self, ctm: Matrix) -> Matrix {
        mult_matrix(translate_matrix(self.matrix, self.linematrix), ctm)
    }
}

/// One element of a show-text instruction's payload.
#[derive(Debug, Clone)]
pub enum ShowItem {
    /// String bytes to render.
    Text(Vec<u8>),
    /// Horizontal adjustment in thousandths of text space (TJ numbers).
    Adjust(f64),
}

/// Splits a show-text instruction's operands into show items.
///
/// `Tj`, `'` and `"` carry a single string (the last operand); `TJ`
/// carries an array mixing strings and adjustments. Instructions without
/// a usable payload yield no items.
pub fn show_items(op: &Operation) -> Vec<ShowItem> {
    match op.operator.as_str() {
        "TJ" => match op.operands.first() {
            Some(Object::Array(values)) => values
                .iter()
                .filter_map(|obj| match obj {
                    Object::String(bytes, _) => Some(ShowItem::Text(bytes.clone())),
                    Object::Integer(n) => Some(ShowItem::Adjust(*n as f64)),
                    Object::Real(n) => Some(ShowItem::Adjust(f64::from(*n))),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        },
        _ => match op.operands.last() {
            Some(Object::String(bytes, _)) => vec![ShowItem::Text(bytes.clone())],
            _ => Vec::new(),
        },
    }
}

/// Resolves the runs of one show-text instruction and advances the line
/// position past them.
pub fn build_runs(
    state: &mut TextState,
    scope: &ResourceScope,
    items: &[ShowItem],
    ctm: Matrix,
) -> Vec<TextRun> {
    let default_font = FontInfo::default();
    let font = state
        .font
        .as_ref()
        .and_then(|name| scope.fonts.get(name))
        .unwrap_or(&default_font);
    let scale = state.scaling / 100.0;

    let mut runs = Vec::new();
    for item in items {
        match item {
            ShowItem::Adjust(amount) => {
                state.linematrix.0 -= amount / 1000.0 * state.fontsize * scale;
            }
            ShowItem::Text(bytes) => {
                if bytes.is_empty() {
                    continue;
                }
                let mut width = 0.0;
                for &code in bytes {
                    width += font.width(code) / 1000.0 * state.fontsize + state.charspace;
                    if code == b' ' {
                        width += state.wordspace;
                    }
                }
                width *= scale;

                let matrix = state.render_matrix(ctm);
                let y0 = font.descent / 1000.0 * state.fontsize + state.rise;
                let y1 = font.ascent / 1000.0 * state.fontsize + state.rise;
                let bounds = apply_matrix_bbox(matrix, (0.0, y0, width, y1));

                runs.push(TextRun {
                    text: bytes.iter().map(|&b| char::from(b)).collect(),
                    font: state.font.clone(),
                    size: state.fontsize,
                    bounds,
                    matrix,
                });
                state.linematrix.0 += width;
            }
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;

    fn show(text: &str) -> Operation {
        Operation::new("Tj", vec![Object::string_literal(text)])
    }

    #[test]
    fn tj_yields_one_run() {
        let op = show("Hello");
        let items = show_items(&op);
        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], ShowItem::Text(t) if t == b"Hello"));
    }

    #[test]
    fn adjusted_show_splits_runs_on_numbers() {
        let op = Operation::new(
            "TJ",
            vec![Object::Array(vec![
                Object::string_literal("He"),
                Object::Integer(-120),
                Object::string_literal("llo"),
            ])],
        );
        let items = show_items(&op);
        assert_eq!(items.len(), 3);
        assert!(matches!(items[1], ShowItem::Adjust(a) if a == -120.0));
    }

    #[test]
    fn runs_advance_the_line_position() {
        let mut state = TextState::new();
        state.fontsize = 10.0;
        let scope = ResourceScope::default();
        let items = vec![ShowItem::Text(b"ab".to_vec())];
        let runs = build_runs(&mut state, &scope, &items, MATRIX_IDENTITY);
        assert_eq!(runs.len(), 1);
        // Two default-width (500/1000) glyphs at size 10.
        assert!((state.linematrix.0 - 10.0).abs() < 1e-9);
        assert!((runs[0].bounds.width - 10.0).abs() < 1e-9);
    }

    #[test]
    fn empty_show_instruction_yields_no_runs() {
        let mut state = TextState::new();
        let scope = ResourceScope::default();
        let op = Operation::new("Tj", vec![]);
        let runs = build_runs(&mut state, &scope, &show_items(&op), MATRIX_IDENTITY);
        assert!(runs.is_empty());
    }

    #[test]
    fn next_line_resets_line_offset() {
        let mut state = TextState::new();
        state.linematrix = (42.0, 0.0);
        state.next_line(5.0, -12.0);
        assert_eq!(state.linematrix, (0.0, 0.0));
        assert_eq!(state.matrix.4, 5.0);
        assert_eq!(state.matrix.5, -12.0);
    }
}
