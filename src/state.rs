//! Ambient graphics state and the save/restore/reset stack machine.
//!
//! Attribute opcodes mutate the current state; geometry opcodes copy the
//! subset active at emission time into their primitive. Primitives never
//! hold a live reference to mutable state.
//!
//! The machine is owned by the pipeline invocation, not process-wide, so
//! independent streams can decode concurrently without locking.

use crate::types::{IntPoint, LineWeight, Rgba};
use std::fmt;

/// Reference to the active font, as declared by a font opcode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FontRef {
    /// Stream-scoped font id
    pub id: u16,
    /// Face name, when the record carried one
    pub name: Option<String>,
}

/// Clip rectangle in absolute source coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub min: IntPoint,
    pub max: IntPoint,
}

/// The ambient drawing attributes tracked across opcodes.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    /// Stroke color
    pub stroke_color: Rgba,
    /// Fill color
    pub fill_color: Rgba,
    /// Stroke weight (negative = hairline)
    pub line_weight: LineWeight,
    /// Dash pattern id (0 = solid)
    pub line_pattern: u16,
    /// Whether closed shapes are filled
    pub fill_mode: bool,
    /// Whether geometry is emitted at all
    pub visible: bool,
    /// Active layer id
    pub layer: u16,
    /// Active font reference, if any text has been configured
    pub font: Option<FontRef>,
    /// Active clip region, if any
    pub clip: Option<ClipRect>,
}

impl Default for GraphicsState {
    /// The documented defaults a reset re-establishes.
    fn default() -> Self {
        GraphicsState {
            stroke_color: Rgba::BLACK,
            fill_color: Rgba::BLACK,
            line_weight: LineWeight::HAIRLINE,
            line_pattern: 0,
            fill_mode: false,
            visible: true,
            layer: 0,
            font: None,
            clip: None,
        }
    }
}

/// A single attribute mutation decoded from an attribute opcode.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeChange {
    StrokeColor(Rgba),
    FillColor(Rgba),
    LineWeight(LineWeight),
    LinePattern(u16),
    FillMode(bool),
    Visibility(bool),
    Layer {
        id: u16,
        /// Present when the record also names the layer
        name: Option<String>,
    },
    Font(FontRef),
    /// `None` clears the clip region
    Clip(Option<ClipRect>),
}

/// Error from a restore with no matching save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackUnderflow;

impl fmt::Display for StackUnderflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "restore with empty state stack")
    }
}

/// Holds the current attributes and the save/restore stack.
#[derive(Debug, Clone, Default)]
pub struct GraphicsStateMachine {
    current: GraphicsState,
    stack: Vec<GraphicsState>,
}

impl GraphicsStateMachine {
    /// Create a machine with default attributes and an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current ambient state.
    pub fn current(&self) -> &GraphicsState {
        &self.current
    }

    /// Copy of the current state for a primitive to carry.
    pub fn snapshot(&self) -> GraphicsState {
        self.current.clone()
    }

    /// Depth of the save stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Apply an attribute mutation to the current top-of-stack state.
    pub fn apply(&mut self, change: AttributeChange) {
        match change {
            AttributeChange::StrokeColor(c) => self.current.stroke_color = c,
            AttributeChange::FillColor(c) => self.current.fill_color = c,
            AttributeChange::LineWeight(w) => self.current.line_weight = w,
            AttributeChange::LinePattern(p) => self.current.line_pattern = p,
            AttributeChange::FillMode(on) => self.current.fill_mode = on,
            AttributeChange::Visibility(on) => self.current.visible = on,
            AttributeChange::Layer { id, name } => {
                self.current.layer = id;
                // The name registration lives in the scene's layer table;
                // the ambient state only tracks the id.
                let _ = name;
            }
            AttributeChange::Font(font) => self.current.font = Some(font),
            AttributeChange::Clip(clip) => self.current.clip = clip,
        }
    }

    /// Push a copy of the current state.
    pub fn save(&mut self) {
        self.stack.push(self.current.clone());
    }

    /// Pop the most recent save. A restore with an empty stack is a
    /// reported error, never a silent no-op; the caller chooses the
    /// recovery policy.
    pub fn restore(&mut self) -> Result<(), StackUnderflow> {
        match self.stack.pop() {
            Some(state) => {
                self.current = state;
                Ok(())
            }
            None => Err(StackUnderflow),
        }
    }

    /// Clear the stack and reinitialize to the documented defaults.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.current = GraphicsState::default();
    }
}
