
use std::collections::HashMap;
use std::sync::Arc;

use crate::common::observer::EventHub;

use super::field::{Field, FieldKind, FieldType, FieldValue};

/// Raised after a field's value assignment.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldChange {
    pub field_type: FieldType,
    pub previous: Option<FieldValue>,
    pub new: Option<FieldValue>,
}

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum FieldError {
    #[error("field {} is not declared by this holder", .0.name())]
    Undeclared(FieldType),
    #[error("field {} holds {expected:?} values, got {actual:?}", .field_type.name())]
    KindMismatch {
        field_type: FieldType,
        expected: FieldKind,
        actual: FieldKind,
    },
}

/// Unordered field collection, keyed by [`FieldType`] (keys unique), with
/// change notification on value assignment.
pub struct FieldSet {
    fields: HashMap<FieldType, Field>,
    changes: EventHub<FieldChange>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self {
            fields: HashMap::new(),
            changes: EventHub::new(),
        }
    }

    /// Empty fields for every given type, all sharing one scope.
    pub fn with_types(types: &[FieldType], scope: &Arc<String>) -> Self {
        let mut set = Self::new();
        for t in types {
            set.add_field(Field::new(*t, scope.clone()));
        }
        set
    }

    /// Replaces any previous field of the same type.
    pub fn add_field(&mut self, field: Field) {
        self.fields.insert(field.field_type(), field);
    }

    pub fn remove_field(&mut self, field_type: FieldType) -> Option<Field> {
        self.fields.remove(&field_type)
    }

    pub fn get_fields(&self) -> Vec<Field> {
        self.fields.values().cloned().collect()
    }

    pub fn has_field(&self, field_type: FieldType) -> bool {
        self.fields.contains_key(&field_type)
    }

    pub fn get_field(&self, field_type: FieldType) -> Result<Field, FieldError> {
        self.fields
            .get(&field_type)
            .cloned()
            .ok_or(FieldError::Undeclared(field_type))
    }

    /// Current value, `None` when the field is missing or unset.
    pub fn value(&self, field_type: FieldType) -> Option<FieldValue> {
        self.fields.get(&field_type).and_then(|f| f.value().cloned())
    }

    pub fn set_value(
        &mut self,
        field_type: FieldType,
        value: Option<FieldValue>,
    ) -> Result<FieldChange, FieldError> {
        let field = self
            .fields
            .get_mut(&field_type)
            .ok_or(FieldError::Undeclared(field_type))?;
        if let Some(value) = &value {
            if value.kind() != field_type.kind() {
                return Err(FieldError::KindMismatch {
                    field_type,
                    expected: field_type.kind(),
                    actual: value.kind(),
                });
            }
        }
        let previous = field.replace_value(value.clone());
        let change = FieldChange {
            field_type,
            previous,
            new: value,
        };
        self.changes.emit(&change);
        Ok(change)
    }

    /// Empties every field, emitting a change per field that had a value.
    pub fn clear_values(&mut self) {
        let types: Vec<FieldType> = self.fields.keys().copied().collect();
        for t in types {
            let _ = self.set_value(t, None);
        }
    }

    pub fn changes(&self) -> &EventHub<FieldChange> {
        &self.changes
    }
}

impl Default for FieldSet {
    fn default() -> Self {
        Self::new()
    }
}

/// An entity owning a set of Fields.
pub trait FieldHolder {
    fn get_fields(&self) -> Vec<Field>;
    fn has_field(&self, field_type: FieldType) -> bool;
    fn get_field(&self, field_type: FieldType) -> Result<Field, FieldError>;
    fn set_field_value(&mut self, field_type: FieldType, value: FieldValue)
    -> Result<(), FieldError>;
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, RwLock};

    use egui::Color32;

    use super::*;

    fn rect_fields() -> FieldSet {
        FieldSet::with_types(
            &[FieldType::LineColor, FieldType::LineThickness],
            &Arc::new("rect".to_owned()),
        )
    }

    #[test]
    fn test_set_value_on_undeclared_type_fails() {
        let mut set = rect_fields();
        let r = set.set_value(FieldType::FontSize, Some(FieldValue::Float(12.0)));
        assert_eq!(r, Err(FieldError::Undeclared(FieldType::FontSize)));
    }

    #[test]
    fn test_set_value_kind_mismatch_fails() {
        let mut set = rect_fields();
        let r = set.set_value(FieldType::LineColor, Some(FieldValue::Float(1.0)));
        assert_eq!(
            r,
            Err(FieldError::KindMismatch {
                field_type: FieldType::LineColor,
                expected: FieldKind::Color,
                actual: FieldKind::Float,
            })
        );
    }

    #[test]
    fn test_set_value_emits_previous_and_new() {
        let mut set = rect_fields();
        let seen = Arc::new(RwLock::new(Vec::new()));
        let sink = seen.clone();
        let _sub = set
            .changes()
            .subscribe(Box::new(move |c: &FieldChange| sink.write().unwrap().push(c.clone())));

        set.set_value(FieldType::LineColor, Some(Color32::RED.into()))
            .unwrap();
        set.set_value(FieldType::LineColor, Some(Color32::BLUE.into()))
            .unwrap();

        let seen = seen.read().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].previous, None);
        assert_eq!(seen[0].new, Some(FieldValue::Color(Color32::RED)));
        assert_eq!(seen[1].previous, Some(FieldValue::Color(Color32::RED)));
        assert_eq!(seen[1].new, Some(FieldValue::Color(Color32::BLUE)));
    }

    #[test]
    fn test_clear_values_empties_all() {
        let mut set = rect_fields();
        set.set_value(FieldType::LineColor, Some(Color32::RED.into()))
            .unwrap();
        set.set_value(FieldType::LineThickness, Some(FieldValue::Float(2.0)))
            .unwrap();
        set.clear_values();
        assert!(set.value(FieldType::LineColor).is_none());
        assert!(set.value(FieldType::LineThickness).is_none());
        assert!(set.has_field(FieldType::LineColor));
    }

    #[test]
    fn test_add_field_replaces_same_type() {
        let mut set = rect_fields();
        let scope = Arc::new("rect".to_owned());
        set.add_field(Field::with_value(
            FieldType::LineColor,
            Color32::GREEN.into(),
            scope,
        ));
        assert_eq!(set.get_fields().len(), 2);
        assert_eq!(
            set.value(FieldType::LineColor),
            Some(FieldValue::Color(Color32::GREEN))
        );
    }
}
