
use std::sync::Arc;

use egui::{Pos2, Rect, Vec2};

use crate::common::eref::ERef;
use crate::common::observer::EventHub;
use crate::common::uuid::ElementUuid;
use crate::fields::defaults::FieldDefaults;
use crate::fields::field::{Field, FieldType, FieldValue};
use crate::fields::holder::{FieldError, FieldHolder};
use crate::history::memento::Memento;

pub mod group;
pub mod shape;
pub mod text;

pub use group::{ChildrenChanged, GroupElement};
pub use shape::{ShapeElement, ShapeKind};
pub use text::TextElement;

/// A drawable element of the editing surface.
#[derive(Clone, Debug, derive_more::From, derive_more::TryInto)]
pub enum Element {
    Shape(ERef<ShapeElement>),
    Text(ERef<TextElement>),
    Group(ERef<GroupElement>),
}

impl Element {
    pub fn uuid(&self) -> ElementUuid {
        match self {
            Element::Shape(inner) => *inner.read().uuid,
            Element::Text(inner) => *inner.read().uuid,
            Element::Group(inner) => *inner.read().uuid,
        }
    }

    pub fn selected(&self) -> bool {
        match self {
            Element::Shape(inner) => inner.read().selected,
            Element::Text(inner) => inner.read().selected,
            Element::Group(inner) => inner.read().selected,
        }
    }

    pub fn set_selected(&self, selected: bool) {
        match self {
            Element::Shape(inner) => inner.write().selected = selected,
            Element::Text(inner) => inner.write().selected = selected,
            Element::Group(inner) => inner.write().selected = selected,
        }
    }

    pub fn location(&self) -> Pos2 {
        match self {
            Element::Shape(inner) => inner.read().location,
            Element::Text(inner) => inner.read().location,
            Element::Group(inner) => inner.read().location,
        }
    }

    pub fn size(&self) -> Vec2 {
        match self {
            Element::Shape(inner) => inner.read().size,
            Element::Text(inner) => inner.read().size,
            Element::Group(inner) => inner.read().size,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_min_size(self.location(), self.size())
    }

    pub fn set_bounds(&self, location: Pos2, size: Vec2) {
        match self {
            Element::Shape(inner) => {
                let mut shape = inner.write();
                shape.location = location;
                shape.size = size;
            }
            Element::Text(inner) => {
                let mut text = inner.write();
                text.location = location;
                text.size = size;
            }
            Element::Group(inner) => GroupElement::set_bounds(inner, location, size),
        }
    }

    pub fn parent(&self) -> Option<ElementUuid> {
        match self {
            Element::Shape(inner) => inner.read().parent,
            Element::Text(inner) => inner.read().parent,
            Element::Group(inner) => inner.read().parent,
        }
    }

    pub fn set_parent(&self, parent: Option<ElementUuid>) {
        match self {
            Element::Shape(inner) => inner.write().parent = parent,
            Element::Text(inner) => inner.write().parent = parent,
            Element::Group(inner) => inner.write().parent = parent,
        }
    }

    pub fn get_fields(&self) -> Vec<Field> {
        match self {
            Element::Shape(inner) => inner.read().get_fields(),
            Element::Text(inner) => inner.read().get_fields(),
            Element::Group(inner) => inner.read().get_fields(),
        }
    }

    pub fn has_field(&self, field_type: FieldType) -> bool {
        match self {
            Element::Shape(inner) => inner.read().has_field(field_type),
            Element::Text(inner) => inner.read().has_field(field_type),
            Element::Group(inner) => inner.read().has_field(field_type),
        }
    }

    pub fn get_field(&self, field_type: FieldType) -> Result<Field, FieldError> {
        match self {
            Element::Shape(inner) => inner.read().get_field(field_type),
            Element::Text(inner) => inner.read().get_field(field_type),
            Element::Group(inner) => inner.read().get_field(field_type),
        }
    }

    pub fn set_field_value(
        &self,
        field_type: FieldType,
        value: FieldValue,
    ) -> Result<(), FieldError> {
        match self {
            Element::Shape(inner) => inner.write().set_field_value(field_type, value),
            Element::Text(inner) => inner.write().set_field_value(field_type, value),
            Element::Group(inner) => inner.write().set_field_value(field_type, value),
        }
    }

    pub(crate) fn set_field_value_raw(
        &self,
        field_type: FieldType,
        value: Option<FieldValue>,
    ) -> Result<(), FieldError> {
        match self {
            Element::Shape(inner) => inner
                .write()
                .fields
                .set_value(field_type, value)
                .map(|_| ()),
            Element::Text(inner) => inner
                .write()
                .fields
                .set_value(field_type, value)
                .map(|_| ()),
            Element::Group(inner) => inner.write().set_field_value_raw(field_type, value),
        }
    }

    /// Pre-change hook: snapshot of this element's field, to be handed to
    /// the history before the field is mutated.
    pub fn before_field_change(&self, field_type: FieldType) -> Result<Memento, FieldError> {
        Memento::field_change(self, field_type)
    }

    /// Composite elements notify here when their child list changes.
    pub fn children_changed_hub(&self) -> Option<EventHub<ChildrenChanged>> {
        match self {
            Element::Group(inner) => Some(inner.read().children_changed().clone()),
            Element::Shape(..) | Element::Text(..) => None,
        }
    }

    pub fn text(&self) -> Option<Arc<String>> {
        match self {
            Element::Text(inner) => Some(inner.read().text().clone()),
            Element::Shape(..) | Element::Group(..) => None,
        }
    }

    /// Fills unset fields from the per-scope defaults store, recursively
    /// for composites.
    pub fn seed_defaults(&self, defaults: &FieldDefaults) {
        match self {
            Element::Shape(inner) => defaults.apply_defaults(&mut inner.write().fields),
            Element::Text(inner) => defaults.apply_defaults(&mut inner.write().fields),
            Element::Group(inner) => {
                let children: Vec<Element> = {
                    let mut group = inner.write();
                    defaults.apply_defaults(&mut group.fields);
                    group.children().to_vec()
                };
                for child in children {
                    child.seed_defaults(defaults);
                }
            }
        }
    }
}
