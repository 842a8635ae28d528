
use std::sync::Arc;

use egui::{Pos2, Rect, Vec2};

use crate::common::eref::ERef;
use crate::common::observer::EventHub;
use crate::common::uuid::ElementUuid;
use crate::fields::field::{Field, FieldType, FieldValue};
use crate::fields::holder::{FieldError, FieldHolder, FieldSet};

use super::Element;

/// Raised after a group's child list changed.
#[derive(Clone, Copy, Debug)]
pub struct ChildrenChanged {
    pub group: ElementUuid,
}

/// A composite element owning an ordered child list. Field lookups and
/// assignments that miss locally cascade to the children in insertion
/// order; the first declaring holder wins.
pub struct GroupElement {
    pub uuid: Arc<ElementUuid>,
    pub location: Pos2,
    pub size: Vec2,
    pub selected: bool,
    pub parent: Option<ElementUuid>,
    pub(crate) fields: FieldSet,
    children: Vec<Element>,
    children_changed: EventHub<ChildrenChanged>,
}

impl GroupElement {
    pub const SCOPE: &'static str = "group";

    pub fn new(uuid: ElementUuid) -> Self {
        Self {
            uuid: Arc::new(uuid),
            location: Pos2::ZERO,
            size: Vec2::ZERO,
            selected: false,
            parent: None,
            fields: FieldSet::new(),
            children: Vec::new(),
            children_changed: EventHub::new(),
        }
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn children_changed(&self) -> &EventHub<ChildrenChanged> {
        &self.children_changed
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldSet {
        &mut self.fields
    }

    /// The event fires after the group's own borrow ends, so listeners may
    /// read the group again.
    pub fn add_child(this: &ERef<Self>, child: Element) {
        let event = {
            let mut group = this.write();
            child.set_parent(Some(*group.uuid));
            group.children.push(child);
            group.recompute_bounds();
            ChildrenChanged { group: *group.uuid }
        };
        let hub = this.read().children_changed.clone();
        hub.emit(&event);
    }

    pub fn remove_child(this: &ERef<Self>, uuid: &ElementUuid) -> Option<Element> {
        let (removed, event) = {
            let mut group = this.write();
            let index = group.children.iter().position(|c| c.uuid() == *uuid)?;
            let removed = group.children.remove(index);
            removed.set_parent(None);
            group.recompute_bounds();
            (removed, ChildrenChanged { group: *group.uuid })
        };
        let hub = this.read().children_changed.clone();
        hub.emit(&event);
        Some(removed)
    }

    /// Moves every child by the location delta; the size is taken as given.
    pub fn set_bounds(this: &ERef<Self>, location: Pos2, size: Vec2) {
        let mut group = this.write();
        let delta = location - group.location;
        for child in &group.children {
            child.set_bounds(child.location() + delta, child.size());
        }
        group.location = location;
        group.size = size;
    }

    fn recompute_bounds(&mut self) {
        let mut bounds: Option<Rect> = None;
        for child in &self.children {
            let child_bounds = child.bounds();
            bounds = Some(match bounds {
                Some(b) => b.union(child_bounds),
                None => child_bounds,
            });
        }
        if let Some(bounds) = bounds {
            self.location = bounds.min;
            self.size = bounds.size();
        }
    }

    pub(crate) fn set_field_value_raw(
        &mut self,
        field_type: FieldType,
        value: Option<FieldValue>,
    ) -> Result<(), FieldError> {
        if self.fields.has_field(field_type) {
            return self.fields.set_value(field_type, value).map(|_| ());
        }
        for child in &self.children {
            if child.has_field(field_type) {
                return child.set_field_value_raw(field_type, value);
            }
        }
        Err(FieldError::Undeclared(field_type))
    }
}

impl FieldHolder for GroupElement {
    /// Local fields first, then every child's, in insertion order.
    fn get_fields(&self) -> Vec<Field> {
        let mut fields = self.fields.get_fields();
        for child in &self.children {
            fields.extend(child.get_fields());
        }
        fields
    }

    fn has_field(&self, field_type: FieldType) -> bool {
        self.fields.has_field(field_type) || self.children.iter().any(|c| c.has_field(field_type))
    }

    fn get_field(&self, field_type: FieldType) -> Result<Field, FieldError> {
        if let Ok(field) = self.fields.get_field(field_type) {
            return Ok(field);
        }
        for child in &self.children {
            if child.has_field(field_type) {
                return child.get_field(field_type);
            }
        }
        Err(FieldError::Undeclared(field_type))
    }

    fn set_field_value(
        &mut self,
        field_type: FieldType,
        value: FieldValue,
    ) -> Result<(), FieldError> {
        self.set_field_value_raw(field_type, Some(value))
    }
}
