
use std::sync::Arc;

use egui::{Pos2, Vec2};

use crate::common::uuid::ElementUuid;
use crate::fields::field::{Field, FieldType, FieldValue};
use crate::fields::holder::{FieldError, FieldHolder, FieldSet};

const TEXT_FIELD_TYPES: [FieldType; 7] = [
    FieldType::LineColor,
    FieldType::FillColor,
    FieldType::LineThickness,
    FieldType::FontFamily,
    FieldType::FontSize,
    FieldType::FontBold,
    FieldType::FontItalic,
];

/// A text-bearing element. Text changes that should be undoable are routed
/// through the surface; [`TextElement::set_text`] writes without capture.
pub struct TextElement {
    pub uuid: Arc<ElementUuid>,
    pub location: Pos2,
    pub size: Vec2,
    pub selected: bool,
    pub parent: Option<ElementUuid>,
    pub(crate) fields: FieldSet,
    text: Arc<String>,
}

impl TextElement {
    pub const SCOPE: &'static str = "text";

    pub fn new(uuid: ElementUuid, location: Pos2, size: Vec2, text: String) -> Self {
        let scope = Arc::new(Self::SCOPE.to_owned());
        Self {
            uuid: Arc::new(uuid),
            location,
            size,
            selected: false,
            parent: None,
            fields: FieldSet::with_types(&TEXT_FIELD_TYPES, &scope),
            text: Arc::new(text),
        }
    }

    pub fn text(&self) -> &Arc<String> {
        &self.text
    }

    pub fn set_text(&mut self, text: Arc<String>) {
        self.text = text;
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldSet {
        &mut self.fields
    }
}

impl FieldHolder for TextElement {
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

#[cfg(test)]
mod tests {
    use egui::{pos2, vec2};

    use super::*;

    #[test]
    fn test_set_text_replaces() {
        let mut text = TextElement::new(
            ElementUuid::now_v7(),
            pos2(0.0, 0.0),
            vec2(40.0, 12.0),
            "first".to_owned(),
        );
        text.set_text(Arc::new("second".to_owned()));
        assert_eq!(text.text().as_str(), "second");
    }

    #[test]
    fn test_declares_font_fields() {
        let text = TextElement::new(
            ElementUuid::now_v7(),
            pos2(0.0, 0.0),
            vec2(40.0, 12.0),
            "".to_owned(),
        );
        assert!(text.has_field(FieldType::FontSize));
        assert!(!text.has_field(FieldType::Arrowheads));
    }
}
