
use std::sync::Arc;

use egui::{Pos2, Vec2};

use crate::common::uuid::ElementUuid;
use crate::fields::field::{Field, FieldType, FieldValue};
use crate::fields::holder::{FieldError, FieldHolder, FieldSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Line,
    Arrow,
    Obfuscate,
}

impl ShapeKind {
    /// Scope string of this kind's fields in the defaults store.
    pub fn scope(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Line => "line",
            ShapeKind::Arrow => "arrow",
            ShapeKind::Obfuscate => "obfuscate",
        }
    }

    pub fn field_types(&self) -> &'static [FieldType] {
        match self {
            ShapeKind::Rectangle | ShapeKind::Ellipse => &[
                FieldType::LineColor,
                FieldType::FillColor,
                FieldType::LineThickness,
                FieldType::Shadow,
            ],
            ShapeKind::Line => &[
                FieldType::LineColor,
                FieldType::LineThickness,
                FieldType::Shadow,
            ],
            ShapeKind::Arrow => &[
                FieldType::LineColor,
                FieldType::LineThickness,
                FieldType::Shadow,
                FieldType::Arrowheads,
            ],
            ShapeKind::Obfuscate => &[
                FieldType::BlurRadius,
                FieldType::PixelSize,
                FieldType::MagnificationFactor,
            ],
        }
    }
}

/// A plain vector shape.
pub struct ShapeElement {
    pub uuid: Arc<ElementUuid>,
    pub kind: ShapeKind,
    pub location: Pos2,
    pub size: Vec2,
    pub selected: bool,
    pub parent: Option<ElementUuid>,
    pub(crate) fields: FieldSet,
}

impl ShapeElement {
    pub fn new(uuid: ElementUuid, kind: ShapeKind, location: Pos2, size: Vec2) -> Self {
        let scope = Arc::new(kind.scope().to_owned());
        Self {
            uuid: Arc::new(uuid),
            kind,
            location,
            size,
            selected: false,
            parent: None,
            fields: FieldSet::with_types(kind.field_types(), &scope),
        }
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldSet {
        &mut self.fields
    }
}

impl FieldHolder for ShapeElement {
    fn get_fields(&self) -> Vec<Field> {
        self.fields.get_fields()
    }

    fn has_field(&self, field_type: FieldType) -> bool {
        self.fields.has_field(field_type)
    }

    fn get_field(&self, field_type: FieldType) -> Result<Field, FieldError> {
        self.fields.get_field(field_type)
    }

    fn set_field_value(
        &mut self,
        field_type: FieldType,
        value: FieldValue,
    ) -> Result<(), FieldError> {
        self.fields.set_value(field_type, Some(value)).map(|_| ())
    }
}
