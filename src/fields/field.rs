
use std::sync::Arc;

use egui::Color32;
use serde::{Deserialize, Serialize};

/// Value kind a field type accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Color,
    Float,
    Int,
    Bool,
    Text,
    Arrowheads,
}

/// Identity of an editable property. One variant per known property;
/// equality and hashing are by variant.
#[derive(Clone, Copy, Debug, Hash, PartialOrd, Ord, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    LineColor,
    FillColor,
    LineThickness,
    Shadow,
    Arrowheads,
    FontFamily,
    FontSize,
    FontBold,
    FontItalic,
    BlurRadius,
    PixelSize,
    MagnificationFactor,
}

impl FieldType {
    pub const ALL: [FieldType; 12] = [
        FieldType::LineColor,
        FieldType::FillColor,
        FieldType::LineThickness,
        FieldType::Shadow,
        FieldType::Arrowheads,
        FieldType::FontFamily,
        FieldType::FontSize,
        FieldType::FontBold,
        FieldType::FontItalic,
        FieldType::BlurRadius,
        FieldType::PixelSize,
        FieldType::MagnificationFactor,
    ];

    /// Stable name, used as the key in the defaults store.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::LineColor => "LINE_COLOR",
            FieldType::FillColor => "FILL_COLOR",
            FieldType::LineThickness => "LINE_THICKNESS",
            FieldType::Shadow => "SHADOW",
            FieldType::Arrowheads => "ARROWHEADS",
            FieldType::FontFamily => "FONT_FAMILY",
            FieldType::FontSize => "FONT_SIZE",
            FieldType::FontBold => "FONT_BOLD",
            FieldType::FontItalic => "FONT_ITALIC",
            FieldType::BlurRadius => "BLUR_RADIUS",
            FieldType::PixelSize => "PIXEL_SIZE",
            FieldType::MagnificationFactor => "MAGNIFICATION_FACTOR",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldType::LineColor | FieldType::FillColor => FieldKind::Color,
            FieldType::LineThickness
            | FieldType::FontSize
            | FieldType::BlurRadius
            | FieldType::MagnificationFactor => FieldKind::Float,
            FieldType::PixelSize => FieldKind::Int,
            FieldType::Shadow | FieldType::FontBold | FieldType::FontItalic => FieldKind::Bool,
            FieldType::FontFamily => FieldKind::Text,
            FieldType::Arrowheads => FieldKind::Arrowheads,
        }
    }
}

/// Which ends of a line carry an arrowhead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arrowheads {
    None,
    StartPoint,
    EndPoint,
    Both,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, derive_more::From, derive_more::TryInto)]
pub enum FieldValue {
    Color(Color32),
    Float(f32),
    Int(i32),
    Bool(bool),
    Text(Arc<String>),
    Arrowheads(Arrowheads),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Color(..) => FieldKind::Color,
            FieldValue::Float(..) => FieldKind::Float,
            FieldValue::Int(..) => FieldKind::Int,
            FieldValue::Bool(..) => FieldKind::Bool,
            FieldValue::Text(..) => FieldKind::Text,
            FieldValue::Arrowheads(..) => FieldKind::Arrowheads,
        }
    }

    pub fn as_color(&self) -> Option<Color32> {
        match self {
            FieldValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            FieldValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// A single named, typed, optionally scoped editable value. Owned by
/// exactly one holder.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    field_type: FieldType,
    value: Option<FieldValue>,
    scope: Arc<String>,
}

impl Field {
    pub fn new(field_type: FieldType, scope: Arc<String>) -> Self {
        Self {
            field_type,
            value: None,
            scope,
        }
    }

    pub fn with_value(field_type: FieldType, value: FieldValue, scope: Arc<String>) -> Self {
        Self {
            field_type,
            value: Some(value),
            scope,
        }
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn value(&self) -> Option<&FieldValue> {
        self.value.as_ref()
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    pub fn scope(&self) -> &Arc<String> {
        &self.scope
    }

    pub(crate) fn replace_value(&mut self, value: Option<FieldValue>) -> Option<FieldValue> {
        std::mem::replace(&mut self.value, value)
    }
}
