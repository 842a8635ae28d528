
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::field::{FieldType, FieldValue};
use super::holder::FieldSet;

/// Last-used field values, keyed by scope and then by field name.
///
/// Every value pushed through the aggregator is recorded here under the
/// target field's scope, and newly created elements seed their empty
/// fields from it.
#[derive(Default, Serialize, Deserialize)]
pub struct FieldDefaults {
    scopes: HashMap<String, HashMap<String, FieldValue>>,
}

impl FieldDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_last_used(&mut self, scope: &str, field_type: FieldType, value: FieldValue) {
        if value.kind() != field_type.kind() {
            return;
        }
        self.scopes
            .entry(scope.to_owned())
            .or_default()
            .insert(field_type.name().to_owned(), value);
    }

    pub fn last_used(&self, scope: &str, field_type: FieldType) -> Option<&FieldValue> {
        self.scopes
            .get(scope)
            .and_then(|m| m.get(field_type.name()))
            // a hand-edited config file may carry a value of the wrong kind
            .filter(|v| v.kind() == field_type.kind())
    }

    /// Fills every unset field of the set from its scope's last-used value.
    pub fn apply_defaults(&self, fields: &mut FieldSet) {
        for field in fields.get_fields() {
            if field.has_value() {
                continue;
            }
            if let Some(value) = self.last_used(field.scope(), field.field_type()) {
                let _ = fields.set_value(field.field_type(), Some(value.clone()));
            }
        }
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}
