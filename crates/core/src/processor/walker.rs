//! Shared content-stream traversal.
//!
//! One walker drives both the rewriter and the bounds extractor: it
//! interprets the graphics-state and text-state instructions itself and
//! hands everything of interest to a [`StreamVisitor`]. Form XObjects are
//! walked recursively with the form matrix composed onto the current
//! transformation matrix and the form's resources shadowing the
//! enclosing scope.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};
use tracing::warn;

use super::resources::{
    ResourceScope, XObjectKind, classify_xobject, form_content, form_resources,
};
use super::text::{TextState, build_runs, show_items};
use crate::error::{Error, Result};
use crate::geom::{Matrix, Rect, form_bounds, mult_matrix};
use crate::handler::TextRun;

/// Receives traversal events from [`Walker`].
///
/// Every instruction is reported exactly once, in stream order. Default
/// implementations ignore everything, so a visitor only overrides the
/// events it cares about.
pub trait StreamVisitor {
    /// An instruction passing through unchanged, including the `Do`
    /// instruction that invokes a nested XObject.
    fn instruction(&mut self, _op: &Operation) -> Result<()> {
        Ok(())
    }

    /// A show-text instruction with its resolved runs. `gated` is true
    /// for the instructions a censoring decision may suppress (`Tj` and
    /// `TJ`); the line-movement variants `'` and `"` are reported with
    /// `gated` false because dropping them would lose their cursor
    /// movement.
    fn show_text(&mut self, _op: &Operation, _runs: &[TextRun], _gated: bool) -> Result<()> {
        Ok(())
    }

    /// An image XObject drawn under the given transformation matrix.
    fn draw_image(&mut self, _name: &str, _id: ObjectId, _stencil: bool, _ctm: Matrix) -> Result<()> {
        Ok(())
    }

    /// A form XObject is about to be walked. `bounds` is its declared
    /// bounding box mapped through the effective transform.
    fn enter_form(&mut self, _id: ObjectId, _name: &str, _bounds: Rect, _group: bool) -> Result<()> {
        Ok(())
    }

    /// The form opened by the matching [`enter_form`](Self::enter_form)
    /// has been fully walked.
    fn leave_form(&mut self, _id: ObjectId) -> Result<()> {
        Ok(())
    }
}

/// Interprets one content stream (and the form streams it invokes),
/// reporting to a visitor.
pub struct Walker<'a, V: StreamVisitor> {
    doc: &'a Document,
    visitor: &'a mut V,
    ctm: Matrix,
    gstack: Vec<(Matrix, TextState)>,
    text: TextState,
    scope: ResourceScope,
    /// Forms currently open, to break invocation cycles.
    open_forms: Vec<ObjectId>,
}

impl<'a, V: StreamVisitor> Walker<'a, V> {
    pub fn new(doc: &'a Document, visitor: &'a mut V, ctm: Matrix, scope: ResourceScope) -> Self {
        Self {
            doc,
            visitor,
            ctm,
            gstack: Vec::new(),
            text: TextState::new(),
            scope,
            open_forms: Vec::new(),
        }
    }

    pub fn walk(&mut self, operations: &[Operation]) -> Result<()> {
        for op in operations {
            self.process(op)?;
        }
        Ok(())
    }

    fn process(&mut self, op: &Operation) -> Result<()> {
        match op.operator.as_str() {
            "q" => {
                self.gstack.push((self.ctm, self.text.clone()));
                self.visitor.instruction(op)
            }
            "Q" => {
                match self.gstack.pop() {
                    Some((ctm, text)) => {
                        self.ctm = ctm;
                        self.text = text;
                    }
                    None => warn!("restore without matching save, state left as is"),
                }
                self.visitor.instruction(op)
            }
            "cm" => {
                if let Some(m) = operand_matrix(&op.operands) {
                    self.ctm = mult_matrix(m, self.ctm);
                }
                self.visitor.instruction(op)
            }
            "BT" => {
                self.text.begin_text();
                self.visitor.instruction(op)
            }
            "Tc" => {
                self.text.charspace = operand_number(&op.operands, 0).unwrap_or(0.0);
                self.visitor.instruction(op)
            }
            "Tw" => {
                self.text.wordspace = operand_number(&op.operands, 0).unwrap_or(0.0);
                self.visitor.instruction(op)
            }
            "Tz" => {
                self.text.scaling = operand_number(&op.operands, 0).unwrap_or(100.0);
                self.visitor.instruction(op)
            }
            "TL" => {
                self.text.leading = operand_number(&op.operands, 0).unwrap_or(0.0);
                self.visitor.instruction(op)
            }
            "Ts" => {
                self.text.rise = operand_number(&op.operands, 0).unwrap_or(0.0);
                self.visitor.instruction(op)
            }
            "Tf" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    self.text.font = Some(String::from_utf8_lossy(name).into_owned());
                }
                self.text.fontsize = operand_number(&op.operands, 1).unwrap_or(0.0);
                self.visitor.instruction(op)
            }
            "Td" => {
                let tx = operand_number(&op.operands, 0).unwrap_or(0.0);
                let ty = operand_number(&op.operands, 1).unwrap_or(0.0);
                self.text.next_line(tx, ty);
                self.visitor.instruction(op)
            }
            "TD" => {
                let tx = operand_number(&op.operands, 0).unwrap_or(0.0);
                let ty = operand_number(&op.operands, 1).unwrap_or(0.0);
                self.text.next_line_set_leading(tx, ty);
                self.visitor.instruction(op)
            }
            "Tm" => {
                if let Some(m) = operand_matrix(&op.operands) {
                    self.text.set_matrix(m);
                }
                self.visitor.instruction(op)
            }
            "T*" => {
                self.text.next_line_leading();
                self.visitor.instruction(op)
            }
            "Tj" | "TJ" => self.show(op, true),
            "'" => {
                self.text.next_line_leading();
                self.show(op, false)
            }
            "\"" => {
                self.text.wordspace = operand_number(&op.operands, 0).unwrap_or(0.0);
                self.text.charspace = operand_number(&op.operands, 1).unwrap_or(0.0);
                self.text.next_line_leading();
                self.show(op, false)
            }
            "Do" => self.do_xobject(op),
            _ => self.visitor.instruction(op),
        }
    }

    fn show(&mut self, op: &Operation, gated: bool) -> Result<()> {
        let items = show_items(op);
        let runs = build_runs(&mut self.text, &self.scope, &items, self.ctm);
        self.visitor.show_text(op, &runs, gated)
    }

    fn do_xobject(&mut self, op: &Operation) -> Result<()> {
        let Some(Object::Name(raw)) = op.operands.first() else {
            return self.visitor.instruction(op);
        };
        let name = String::from_utf8_lossy(raw).into_owned();
        let Some(&id) = self.scope.xobjects.get(&name) else {
            return Err(Error::MissingObject(format!("XObject /{name}")));
        };

        match classify_xobject(self.doc, id) {
            Some(XObjectKind::Image { stencil }) => {
                self.visitor.instruction(op)?;
                self.visitor.draw_image(&name, id, stencil, self.ctm)
            }
            Some(XObjectKind::Form { bbox, matrix, group }) => {
                // The invoking instruction belongs to the enclosing
                // stream and passes through verbatim.
                self.visitor.instruction(op)?;
                if self.open_forms.contains(&id) {
                    warn!(name = %name, "recursive form invocation skipped");
                    return Ok(());
                }
                self.walk_form(id, &name, bbox, matrix, group)
            }
            None => {
                warn!(name = %name, "unrecognized XObject subtype, forwarding invocation only");
                self.visitor.instruction(op)
            }
        }
    }

    fn walk_form(
        &mut self,
        id: ObjectId,
        name: &str,
        bbox: (f64, f64, f64, f64),
        matrix: Matrix,
        group: bool,
    ) -> Result<()> {
        let content = form_content(self.doc, id)
            .ok_or_else(|| Error::NotAStream(format!("XObject /{name}")))?;
        let operations = Content::decode(&content)?.operations;

        let form_ctm = mult_matrix(matrix, self.ctm);
        self.visitor
            .enter_form(id, name, form_bounds(bbox, form_ctm), group)?;

        let saved_ctm = self.ctm;
        let saved_text = std::mem::take(&mut self.text);
        let saved_depth = self.gstack.len();
        let saved_scope = match form_resources(self.doc, id) {
            Some(res) => Some(std::mem::replace(
                &mut self.scope,
                ResourceScope::from_resources(self.doc, &res),
            )),
            None => None,
        };

        self.ctm = form_ctm;
        self.open_forms.push(id);
        let outcome = self.walk(&operations);
        self.open_forms.pop();

        self.ctm = saved_ctm;
        self.text = saved_text;
        self.gstack.truncate(saved_depth);
        if let Some(scope) = saved_scope {
            self.scope = scope;
        }

        // Close the frame even when the form's body failed, so the
        // visitor's bookkeeping stays balanced.
        self.visitor.leave_form(id)?;
        outcome
    }
}

fn operand_number(operands: &[Object], index: usize) -> Option<f64> {
    match operands.get(index)? {
        Object::Integer(n) => Some(*n as f64),
        Object::Real(n) => Some(f64::from(*n)),
        _ => None,
    }
}

fn operand_matrix(operands: &[Object]) -> Option<Matrix> {
    Some((
        operand_number(operands, 0)?,
        operand_number(operands, 1)?,
        operand_number(operands, 2)?,
        operand_number(operands, 3)?,
        operand_number(operands, 4)?,
        operand_number(operands, 5)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::MATRIX_IDENTITY;

    #[derive(Default)]
    struct Recorder {
        instructions: Vec<String>,
        runs: Vec<String>,
    }

    impl StreamVisitor for Recorder {
        fn instruction(&mut self, op: &Operation) -> Result<()> {
            self.instructions.push(op.operator.clone());
            Ok(())
        }

        fn show_text(&mut self, op: &Operation, runs: &[TextRun], _gated: bool) -> Result<()> {
            self.instructions.push(op.operator.clone());
            self.runs.extend(runs.iter().map(|r| r.text.clone()));
            Ok(())
        }
    }

    #[test]
    fn save_restore_rewinds_the_ctm() {
        let doc = Document::with_version("1.5");
        let mut visitor = Recorder::default();
        let mut walker = Walker::new(
            &doc,
            &mut visitor,
            MATRIX_IDENTITY,
            ResourceScope::default(),
        );
        let ops = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(2),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(2),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Q", vec![]),
        ];
        walker.walk(&ops).unwrap();
        assert_eq!(walker.ctm, MATRIX_IDENTITY);
        assert_eq!(visitor.instructions, vec!["q", "cm", "Q"]);
    }

    #[test]
    fn unbalanced_restore_is_tolerated() {
        let doc = Document::with_version("1.5");
        let mut visitor = Recorder::default();
        let mut walker = Walker::new(
            &doc,
            &mut visitor,
            MATRIX_IDENTITY,
            ResourceScope::default(),
        );
        walker.walk(&[Operation::new("Q", vec![])]).unwrap();
        assert_eq!(visitor.instructions, vec!["Q"]);
    }

    #[test]
    fn text_runs_reach_the_visitor() {
        let doc = Document::with_version("1.5");
        let mut visitor = Recorder::default();
        let mut walker = Walker::new(
            &doc,
            &mut visitor,
            MATRIX_IDENTITY,
            ResourceScope::default(),
        );
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
            ),
            Operation::new("Tj", vec![Object::string_literal("secret")]),
            Operation::new("ET", vec![]),
        ];
        walker.walk(&ops).unwrap();
        assert_eq!(visitor.runs, vec!["secret"]);
        assert_eq!(visitor.instructions, vec!["BT", "Tf", "Tj", "ET"]);
    }

    #[test]
    fn unknown_xobject_name_is_fatal() {
        let doc = Document::with_version("1.5");
        let mut visitor = Recorder::default();
        let mut walker = Walker::new(
            &doc,
            &mut visitor,
            MATRIX_IDENTITY,
            ResourceScope::default(),
        );
        let ops = vec![Operation::new("Do", vec![Object::Name(b"Gone".to_vec())])];
        assert!(matches!(
            walker.walk(&ops),
            Err(Error::MissingObject(_))
        ));
    }
}
