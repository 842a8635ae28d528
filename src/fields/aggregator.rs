
use std::collections::HashMap;
use std::sync::Arc;

use crate::common::eref::ERef;
use crate::common::observer::Subscription;
use crate::common::uuid::ElementUuid;
use crate::elements::{ChildrenChanged, Element};
use crate::history::History;

use super::defaults::FieldDefaults;
use super::field::{Field, FieldType, FieldValue};
use super::holder::{FieldError, FieldHolder, FieldSet};

/// What the aggregator is currently doing to its own fields. Pulling and
/// pushing both assign through the ordinary field setter; the state keeps
/// those assignments from re-entering the propagation path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SyncState {
    Idle,
    PullingFromElements,
    PushingToElements,
}

/// A synthetic field holder over the current selection.
///
/// Holds one field per known [`FieldType`]; after any public operation the
/// set of non-empty fields equals the fields common to all bound elements,
/// valued from the most-recently-bound element. Values assigned through
/// [`FieldAggregator::set_field_value`] are pushed onto every bound element
/// declaring the type, with an undo snapshot captured per element first.
pub struct FieldAggregator {
    fields: FieldSet,
    bound_elements: Vec<Element>,
    common: Vec<Field>,
    state: SyncState,
    history: ERef<History>,
    defaults: ERef<FieldDefaults>,
    child_subscriptions: HashMap<ElementUuid, Subscription<ChildrenChanged>>,
}

impl FieldAggregator {
    pub const SCOPE: &'static str = "editor";

    pub fn new(history: ERef<History>, defaults: ERef<FieldDefaults>) -> ERef<Self> {
        let scope = Arc::new(Self::SCOPE.to_owned());
        ERef::new(Self {
            fields: FieldSet::with_types(&FieldType::ALL, &scope),
            bound_elements: Vec::new(),
            common: Vec::new(),
            state: SyncState::Idle,
            history,
            defaults,
            child_subscriptions: HashMap::new(),
        })
    }

    pub fn bound_count(&self) -> usize {
        self.bound_elements.len()
    }

    pub fn is_bound(&self, uuid: &ElementUuid) -> bool {
        self.bound_elements.iter().any(|e| e.uuid() == *uuid)
    }

    /// Fields the whole selection has in common, as of the last recompute.
    pub fn common_fields(&self) -> Vec<Field> {
        self.common.clone()
    }

    /// Registers an element for two-way synchronization. Idempotent. For
    /// composite elements this also subscribes to their child-list changes,
    /// so the common-field set follows grouping edits.
    pub fn bind_element(this: &ERef<Self>, element: &Element) {
        if this.read().is_bound(&element.uuid()) {
            return;
        }
        let subscription = element.children_changed_hub().map(|hub| {
            let weak = this.downgrade();
            hub.subscribe(Box::new(move |_| {
                if let Some(aggregator) = weak.upgrade() {
                    aggregator.write().recompute();
                }
            }))
        });
        let mut aggregator = this.write();
        if let Some(subscription) = subscription {
            aggregator
                .child_subscriptions
                .insert(element.uuid(), subscription);
        }
        aggregator.bound_elements.push(element.clone());
        aggregator.recompute();
    }

    pub fn bind_elements(this: &ERef<Self>, elements: &[Element]) {
        for element in elements {
            Self::bind_element(this, element);
        }
    }

    /// Applies the current shared values to a newly selected element, then
    /// starts tracking it.
    pub fn bind_and_update_element(this: &ERef<Self>, element: &Element) {
        this.write().update_element(element);
        Self::bind_element(this, element);
    }

    /// Deregisters an element, revoking its child-list subscription.
    pub fn unbind_element(&mut self, uuid: &ElementUuid) {
        self.child_subscriptions.remove(uuid);
        self.bound_elements.retain(|e| e.uuid() != *uuid);
        self.recompute();
    }

    /// Unbinds everything; the common-field set becomes empty.
    pub fn clear(&mut self) {
        self.child_subscriptions.clear();
        self.bound_elements.clear();
        self.recompute();
    }

    /// One-shot push of every currently held value onto one element, for
    /// the fields it declares. Not captured for undo.
    pub fn update_element(&mut self, element: &Element) {
        debug_assert_eq!(self.state, SyncState::Idle);
        self.state = SyncState::PushingToElements;
        for field in self.fields.get_fields() {
            if let Some(value) = field.value() {
                if element.has_field(field.field_type()) {
                    let _ = element.set_field_value(field.field_type(), value.clone());
                }
            }
        }
        self.state = SyncState::Idle;
    }

    /// Assigns a value to the shared view and propagates it to the bound
    /// elements declaring the type.
    pub fn set_field_value(
        &mut self,
        field_type: FieldType,
        value: FieldValue,
    ) -> Result<(), FieldError> {
        self.fields.set_value(field_type, Some(value.clone()))?;
        self.own_property_changed(field_type, Some(value));
        Ok(())
    }

    /// Runs when a value is set through the aggregator's own API. Inert
    /// while pulling or pushing (those paths assign through the same
    /// setter) and for empty values.
    fn own_property_changed(&mut self, field_type: FieldType, value: Option<FieldValue>) {
        if self.state != SyncState::Idle {
            return;
        }
        let Some(value) = value else {
            return;
        };
        self.state = SyncState::PushingToElements;
        for element in &self.bound_elements {
            if !element.has_field(field_type) {
                continue;
            }
            if let Ok(memento) = element.before_field_change(field_type) {
                self.history.write().make_undoable(memento, true);
            }
            let _ = element.set_field_value(field_type, value.clone());
            if let Ok(field) = element.get_field(field_type) {
                self.defaults
                    .write()
                    .record_last_used(field.scope(), field_type, value.clone());
            }
        }
        self.state = SyncState::Idle;
    }

    /// Clears the shared view and refills it from the bound elements, all
    /// without propagation.
    fn recompute(&mut self) {
        debug_assert_eq!(self.state, SyncState::Idle);
        self.state = SyncState::PullingFromElements;
        self.fields.clear_values();
        self.common = self.find_common_fields();
        for field in &self.common {
            let _ = self
                .fields
                .set_value(field.field_type(), field.value().cloned());
        }
        self.state = SyncState::Idle;
    }

    /// Fields declared by every bound element. Candidates come from the
    /// last-bound element, and so do the resulting values; earlier-bound
    /// elements only veto, they are never consulted for values ("last
    /// bound wins").
    fn find_common_fields(&self) -> Vec<Field> {
        let Some(last) = self.bound_elements.last() else {
            return Vec::new();
        };
        let mut candidates = last.get_fields();
        for element in &self.bound_elements[..self.bound_elements.len() - 1] {
            candidates.retain(|f| element.has_field(f.field_type()));
        }
        candidates
    }
}

impl FieldHolder for FieldAggregator {
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
        FieldAggregator::set_field_value(self, field_type, value)
    }
}

#[cfg(test)]
mod tests {
    use egui::{Color32, pos2, vec2};

    use crate::elements::group::GroupElement;
    use crate::elements::shape::{ShapeElement, ShapeKind};

    use super::*;

    fn new_aggregator() -> (ERef<FieldAggregator>, ERef<History>, ERef<FieldDefaults>) {
        let history = ERef::new(History::new());
        let defaults = ERef::new(FieldDefaults::new());
        let aggregator = FieldAggregator::new(history.clone(), defaults.clone());
        (aggregator, history, defaults)
    }

    fn new_shape(kind: ShapeKind) -> Element {
        ERef::new(ShapeElement::new(
            ElementUuid::now_v7(),
            kind,
            pos2(0.0, 0.0),
            vec2(10.0, 10.0),
        ))
        .into()
    }

    /// Element A: LINE_COLOR=red, LINE_THICKNESS=2.
    fn element_a() -> Element {
        let a = new_shape(ShapeKind::Line);
        a.set_field_value(FieldType::LineColor, Color32::RED.into())
            .unwrap();
        a.set_field_value(FieldType::LineThickness, FieldValue::Float(2.0))
            .unwrap();
        a
    }

    /// Element B: declares LINE_COLOR only, value blue.
    fn element_b() -> Element {
        let b = new_shape(ShapeKind::Line);
        let Element::Shape(inner) = &b else {
            unreachable!()
        };
        inner.write().fields_mut().remove_field(FieldType::LineThickness);
        inner.write().fields_mut().remove_field(FieldType::Shadow);
        b.set_field_value(FieldType::LineColor, Color32::BLUE.into())
            .unwrap();
        b
    }

    fn common_types(aggregator: &ERef<FieldAggregator>) -> Vec<FieldType> {
        let mut types: Vec<FieldType> = aggregator
            .read()
            .common_fields()
            .iter()
            .map(|f| f.field_type())
            .collect();
        types.sort();
        types
    }

    #[test]
    fn test_zero_bound_elements_empty_common_set() {
        let (aggregator, ..) = new_aggregator();
        assert!(aggregator.read().common_fields().is_empty());
    }

    #[test]
    fn test_last_bound_wins() {
        let (aggregator, ..) = new_aggregator();
        let a = element_a();
        let b = element_b();
        FieldAggregator::bind_element(&aggregator, &a);
        FieldAggregator::bind_element(&aggregator, &b);

        assert_eq!(common_types(&aggregator), vec![FieldType::LineColor]);
        assert_eq!(
            aggregator.read().get_field(FieldType::LineColor).unwrap().value().cloned(),
            Some(FieldValue::Color(Color32::BLUE))
        );

        // unbinding B restores A's full field list and values
        aggregator.write().unbind_element(&b.uuid());
        assert_eq!(
            common_types(&aggregator),
            vec![
                FieldType::LineColor,
                FieldType::LineThickness,
                FieldType::Shadow
            ]
        );
        assert_eq!(
            aggregator.read().get_field(FieldType::LineColor).unwrap().value().cloned(),
            Some(FieldValue::Color(Color32::RED))
        );
        assert_eq!(
            aggregator.read().get_field(FieldType::LineThickness).unwrap().value().cloned(),
            Some(FieldValue::Float(2.0))
        );
    }

    #[test]
    fn test_bind_is_idempotent() {
        let (aggregator, ..) = new_aggregator();
        let a = element_a();
        FieldAggregator::bind_element(&aggregator, &a);
        FieldAggregator::bind_element(&aggregator, &a);
        assert_eq!(aggregator.read().bound_count(), 1);
    }

    #[test]
    fn test_propagation_writes_declared_fields_only() {
        let (aggregator, ..) = new_aggregator();
        let a = element_a();
        let b = element_b();
        FieldAggregator::bind_element(&aggregator, &a);
        FieldAggregator::bind_element(&aggregator, &b);

        aggregator
            .write()
            .set_field_value(FieldType::LineColor, Color32::GREEN.into())
            .unwrap();
        assert_eq!(
            a.get_field(FieldType::LineColor).unwrap().value().and_then(|v| v.as_color()),
            Some(Color32::GREEN)
        );
        assert_eq!(
            b.get_field(FieldType::LineColor).unwrap().value().and_then(|v| v.as_color()),
            Some(Color32::GREEN)
        );

        // LINE_THICKNESS is not common, but A declares it, so A is written
        aggregator
            .write()
            .set_field_value(FieldType::LineThickness, FieldValue::Float(5.0))
            .unwrap();
        assert_eq!(
            a.get_field(FieldType::LineThickness).unwrap().value().and_then(|v| v.as_float()),
            Some(5.0)
        );
        assert!(!b.has_field(FieldType::LineThickness));
    }

    #[test]
    fn test_propagation_captures_undo_per_element() {
        let (aggregator, history, _) = new_aggregator();
        let a = element_a();
        let b = element_b();
        FieldAggregator::bind_element(&aggregator, &a);
        FieldAggregator::bind_element(&aggregator, &b);
        assert_eq!(history.read().undo_depth(), 0);

        aggregator
            .write()
            .set_field_value(FieldType::LineColor, Color32::GREEN.into())
            .unwrap();
        // one entry per written element
        assert_eq!(history.read().undo_depth(), 2);

        // merging only consults the top entry, so alternating targets do
        // not coalesce across a multi-selection
        aggregator
            .write()
            .set_field_value(FieldType::LineColor, Color32::GOLD.into())
            .unwrap();
        assert_eq!(history.read().undo_depth(), 4);
    }

    #[test]
    fn test_recompute_does_not_propagate() {
        let (aggregator, history, _) = new_aggregator();
        let a = element_a();
        let b = element_b();
        // binding assigns values through the shared setter; none of that
        // may reach the elements' history path
        FieldAggregator::bind_element(&aggregator, &a);
        FieldAggregator::bind_element(&aggregator, &b);
        aggregator.write().clear();
        assert_eq!(history.read().undo_depth(), 0);
    }

    #[test]
    fn test_update_element_applies_shared_values_without_undo() {
        let (aggregator, history, _) = new_aggregator();
        let a = element_a();
        FieldAggregator::bind_element(&aggregator, &a);

        let late = new_shape(ShapeKind::Line);
        FieldAggregator::bind_and_update_element(&aggregator, &late);
        assert_eq!(
            late.get_field(FieldType::LineColor).unwrap().value().and_then(|v| v.as_color()),
            Some(Color32::RED)
        );
        assert_eq!(history.read().undo_depth(), 0);
        assert_eq!(aggregator.read().bound_count(), 2);
    }

    #[test]
    fn test_propagation_records_scope_defaults() {
        let (aggregator, _, defaults) = new_aggregator();
        let a = element_a();
        FieldAggregator::bind_element(&aggregator, &a);
        aggregator
            .write()
            .set_field_value(FieldType::LineColor, Color32::GREEN.into())
            .unwrap();
        assert_eq!(
            defaults.read().last_used("line", FieldType::LineColor),
            Some(&FieldValue::Color(Color32::GREEN))
        );
    }

    #[test]
    fn test_children_changed_triggers_recompute() {
        let (aggregator, ..) = new_aggregator();
        let group = ERef::new(GroupElement::new(ElementUuid::now_v7()));
        let group_element: Element = group.clone().into();
        FieldAggregator::bind_element(&aggregator, &group_element);
        assert!(aggregator.read().common_fields().is_empty());

        GroupElement::add_child(&group, element_a());
        assert_eq!(
            common_types(&aggregator),
            vec![
                FieldType::LineColor,
                FieldType::LineThickness,
                FieldType::Shadow
            ]
        );
    }

    #[test]
    fn test_unbind_revokes_child_subscription() {
        let (aggregator, ..) = new_aggregator();
        let group = ERef::new(GroupElement::new(ElementUuid::now_v7()));
        let group_element: Element = group.clone().into();
        FieldAggregator::bind_element(&aggregator, &group_element);
        assert_eq!(group.read().children_changed().listener_count(), 1);

        aggregator.write().unbind_element(&group_element.uuid());
        assert_eq!(group.read().children_changed().listener_count(), 0);
    }

    #[test]
    fn test_dropping_aggregator_releases_subscriptions() {
        let group = ERef::new(GroupElement::new(ElementUuid::now_v7()));
        {
            let (aggregator, ..) = new_aggregator();
            FieldAggregator::bind_element(&aggregator, &group.clone().into());
            assert_eq!(group.read().children_changed().listener_count(), 1);
        }
        assert_eq!(group.read().children_changed().listener_count(), 0);
    }
}
