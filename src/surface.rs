
use std::collections::HashMap;
use std::sync::Arc;

use egui::emath::TSTransform;
use egui::{ColorImage, Pos2, Vec2};

use crate::common::eref::ERef;
use crate::common::uuid::ElementUuid;
use crate::elements::Element;
use crate::fields::aggregator::FieldAggregator;
use crate::fields::defaults::FieldDefaults;
use crate::history::History;
use crate::history::memento::{Memento, RestoreError};

/// Insertion-ordered element table keyed by element id.
pub struct OrderedElements {
    order: Vec<ElementUuid>,
    elements: HashMap<ElementUuid, Element>,
}

impl OrderedElements {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            elements: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, uuid: &ElementUuid) -> bool {
        self.elements.contains_key(uuid)
    }

    pub fn get(&self, uuid: &ElementUuid) -> Option<&Element> {
        self.elements.get(uuid)
    }

    pub fn push(&mut self, element: Element) {
        let uuid = element.uuid();
        if self.elements.insert(uuid, element).is_none() {
            self.order.push(uuid);
        }
    }

    pub fn remove(&mut self, uuid: &ElementUuid) -> Option<Element> {
        let removed = self.elements.remove(uuid);
        if removed.is_some() {
            self.order.retain(|e| e != uuid);
        }
        removed
    }

    pub fn iter_order(&self) -> impl Iterator<Item = &Element> {
        self.order.iter().flat_map(|k| self.elements.get(k))
    }
}

impl Default for OrderedElements {
    fn default() -> Self {
        Self::new()
    }
}

/// The editing surface: the live document's element table, selection,
/// background, history and the field aggregator over the selection.
pub struct Surface {
    elements: OrderedElements,
    selection: Vec<ElementUuid>,
    aggregator: ERef<FieldAggregator>,
    history: ERef<History>,
    defaults: ERef<FieldDefaults>,
    background: Arc<ColorImage>,
    background_transform: TSTransform,
    modified: bool,
    invalidations: u64,
}

impl Surface {
    pub fn new(background: Arc<ColorImage>) -> Self {
        Self::with_defaults(background, ERef::new(FieldDefaults::new()))
    }

    /// Use when the editor carries loaded per-scope defaults.
    pub fn with_defaults(background: Arc<ColorImage>, defaults: ERef<FieldDefaults>) -> Self {
        let history = ERef::new(History::new());
        let aggregator = FieldAggregator::new(history.clone(), defaults.clone());
        Self {
            elements: OrderedElements::new(),
            selection: Vec::new(),
            aggregator,
            history,
            defaults,
            background,
            background_transform: TSTransform::IDENTITY,
            modified: false,
            invalidations: 0,
        }
    }

    pub fn history(&self) -> &ERef<History> {
        &self.history
    }

    pub fn field_aggregator(&self) -> &ERef<FieldAggregator> {
        &self.aggregator
    }

    pub fn defaults(&self) -> &ERef<FieldDefaults> {
        &self.defaults
    }

    pub fn background(&self) -> Arc<ColorImage> {
        self.background.clone()
    }

    pub fn background_transform(&self) -> TSTransform {
        self.background_transform
    }

    pub fn modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    /// Repaint-request counter; rendering itself lives elsewhere.
    pub fn invalidate(&mut self) {
        self.invalidations += 1;
    }

    pub fn invalidations(&self) -> u64 {
        self.invalidations
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn contains(&self, uuid: &ElementUuid) -> bool {
        self.elements.contains(uuid)
    }

    pub fn get_element(&self, uuid: &ElementUuid) -> Option<Element> {
        self.elements.get(uuid).cloned()
    }

    pub fn elements_in_order(&self) -> Vec<Element> {
        self.elements.iter_order().cloned().collect()
    }

    pub fn selection(&self) -> &[ElementUuid] {
        &self.selection
    }

    /// Adds an element, seeding its unset fields from the per-scope
    /// defaults. Returns the element when its id is already taken.
    pub fn add_element(&mut self, element: Element, make_undoable: bool) -> Result<(), Element> {
        if self.elements.contains(&element.uuid()) {
            return Err(element);
        }
        if make_undoable {
            self.history
                .write()
                .make_undoable(Memento::add_element(&element), false);
        }
        element.seed_defaults(&self.defaults.read());
        self.elements.push(element);
        self.modified = true;
        self.invalidate();
        Ok(())
    }

    /// Bulk add; all-or-nothing on id collisions.
    pub fn add_elements(
        &mut self,
        elements: Vec<Element>,
        make_undoable: bool,
    ) -> Result<(), Vec<Element>> {
        if elements.iter().any(|e| self.elements.contains(&e.uuid())) {
            return Err(elements);
        }
        if make_undoable {
            self.history
                .write()
                .make_undoable(Memento::add_elements(&elements), false);
        }
        for element in elements {
            element.seed_defaults(&self.defaults.read());
            self.elements.push(element);
        }
        self.modified = true;
        self.invalidate();
        Ok(())
    }

    pub fn remove_element(&mut self, uuid: &ElementUuid, make_undoable: bool) -> Option<Element> {
        let element = self.elements.get(uuid).cloned()?;
        if make_undoable {
            self.history
                .write()
                .make_undoable(Memento::delete_element(element.clone()), false);
        }
        self.selection.retain(|e| e != uuid);
        self.aggregator.write().unbind_element(uuid);
        let removed = self.elements.remove(uuid);
        self.modified = true;
        self.invalidate();
        removed
    }

    /// Bulk remove in the given order; unknown ids are skipped.
    pub fn remove_elements(&mut self, uuids: &[ElementUuid], make_undoable: bool) -> Vec<Element> {
        let targets: Vec<Element> = uuids
            .iter()
            .flat_map(|id| self.elements.get(id).cloned())
            .collect();
        if targets.is_empty() {
            return targets;
        }
        if make_undoable {
            self.history
                .write()
                .make_undoable(Memento::delete_elements(targets.clone()), false);
        }
        for element in &targets {
            let uuid = element.uuid();
            self.selection.retain(|e| *e != uuid);
            self.aggregator.write().unbind_element(&uuid);
            self.elements.remove(&uuid);
        }
        self.modified = true;
        self.invalidate();
        targets
    }

    /// Marks the element selected, adds it to the selection and binds it to
    /// the aggregator (applying the current shared values first). Returns
    /// false for unknown ids.
    pub fn select_element(&mut self, uuid: &ElementUuid) -> bool {
        let Some(element) = self.elements.get(uuid).cloned() else {
            return false;
        };
        element.set_selected(true);
        if !self.selection.contains(uuid) {
            self.selection.push(*uuid);
        }
        FieldAggregator::bind_and_update_element(&self.aggregator, &element);
        self.invalidate();
        true
    }

    pub fn deselect_all(&mut self) {
        for uuid in std::mem::take(&mut self.selection) {
            if let Some(element) = self.elements.get(&uuid) {
                element.set_selected(false);
            }
        }
        self.aggregator.write().clear();
        self.invalidate();
    }

    /// Writes new bounds onto the listed elements, capturing one bounds
    /// memento for the whole set first. Consecutive changes to the same
    /// set merge, so a drag costs one history entry.
    pub fn apply_bounds_change(
        &mut self,
        changes: &[(ElementUuid, Pos2, Vec2)],
        make_undoable: bool,
    ) -> Result<(), RestoreError> {
        let mut targets = Vec::with_capacity(changes.len());
        for (uuid, location, size) in changes {
            let element = self
                .elements
                .get(uuid)
                .cloned()
                .ok_or(RestoreError::MissingElement(*uuid))?;
            targets.push((element, *location, *size));
        }
        if make_undoable {
            self.history.write().make_undoable(
                Memento::bounds_change(targets.iter().map(|(e, ..)| e)),
                true,
            );
        }
        for (element, location, size) in targets {
            self.invalidate();
            element.set_bounds(location, size);
            self.invalidate();
        }
        self.modified = true;
        Ok(())
    }

    /// Replaces a text element's text, capturing the old text first.
    /// Consecutive edits to the same element merge into one entry.
    pub fn change_text(
        &mut self,
        uuid: &ElementUuid,
        text: Arc<String>,
        make_undoable: bool,
    ) -> Result<(), RestoreError> {
        let element = self
            .elements
            .get(uuid)
            .cloned()
            .ok_or(RestoreError::MissingElement(*uuid))?;
        let Element::Text(target) = element else {
            return Err(RestoreError::NotATextElement(*uuid));
        };
        if make_undoable {
            let old_text = target.read().text().clone();
            self.history
                .write()
                .make_undoable(Memento::text_change(*uuid, old_text), true);
        }
        self.invalidate();
        target.write().set_text(text);
        self.invalidate();
        self.modified = true;
        Ok(())
    }

    /// Replaces the background under `matrix`, capturing the outgoing image
    /// and the applied transform.
    pub fn change_background(
        &mut self,
        image: Arc<ColorImage>,
        matrix: TSTransform,
        make_undoable: bool,
    ) {
        if make_undoable {
            self.history.write().make_undoable(
                Memento::background_change(self.background.clone(), matrix),
                false,
            );
        }
        self.background = image;
        self.background_transform = matrix * self.background_transform;
        self.modified = true;
        self.invalidate();
    }

    /// Replay path for background mementos: install the stored image and
    /// compose the stored (already inverted) matrix.
    pub fn undo_background_change(&mut self, image: Arc<ColorImage>, matrix: TSTransform) {
        self.background = image;
        self.background_transform = matrix * self.background_transform;
        self.invalidate();
    }

    /// Restores the top undo entry and moves its inverse to the redo stack.
    /// Ok(false) when there is nothing to undo. A failed restore reports
    /// the error and drops the entry; the document is not touched.
    pub fn undo(&mut self) -> Result<bool, RestoreError> {
        let memento = self.history.write().pop_undo();
        let Some(memento) = memento else {
            return Ok(false);
        };
        match memento.restore(self) {
            Ok(inverse) => {
                self.history.write().push_redo(inverse);
                Ok(true)
            }
            Err(e) => {
                log::warn!("undo failed, dropping history entry: {e}");
                Err(e)
            }
        }
    }

    pub fn redo(&mut self) -> Result<bool, RestoreError> {
        let memento = self.history.write().pop_redo();
        let Some(memento) = memento else {
            return Ok(false);
        };
        match memento.restore(self) {
            Ok(inverse) => {
                self.history.write().push_undo(inverse);
                Ok(true)
            }
            Err(e) => {
                log::warn!("redo failed, dropping history entry: {e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use egui::{Color32, pos2, vec2};

    use crate::elements::shape::{ShapeElement, ShapeKind};
    use crate::fields::field::{FieldType, FieldValue};

    use super::*;

    fn new_surface() -> Surface {
        Surface::new(Arc::new(ColorImage::default()))
    }

    fn new_rect() -> Element {
        ERef::new(ShapeElement::new(
            ElementUuid::now_v7(),
            ShapeKind::Rectangle,
            pos2(0.0, 0.0),
            vec2(10.0, 10.0),
        ))
        .into()
    }

    #[test]
    fn test_ordered_elements_keep_insertion_order() {
        let mut table = OrderedElements::new();
        let a = new_rect();
        let b = new_rect();
        let c = new_rect();
        let ids = [a.uuid(), b.uuid(), c.uuid()];
        table.push(a);
        table.push(b);
        table.push(c);
        table.remove(&ids[1]);

        let remaining: Vec<ElementUuid> = table.iter_order().map(|e| e.uuid()).collect();
        assert_eq!(remaining, vec![ids[0], ids[2]]);
    }

    #[test]
    fn test_duplicate_add_returns_the_element() {
        let mut surface = new_surface();
        let element = new_rect();
        surface.add_element(element.clone(), false).unwrap();
        assert!(surface.add_element(element, false).is_err());
        assert_eq!(surface.element_count(), 1);
    }

    #[test]
    fn test_add_seeds_fields_from_scope_defaults() {
        let mut surface = new_surface();
        surface.defaults().write().record_last_used(
            "rectangle",
            FieldType::LineColor,
            Color32::GOLD.into(),
        );

        let element = new_rect();
        surface.add_element(element.clone(), false).unwrap();
        assert_eq!(
            element
                .get_field(FieldType::LineColor)
                .unwrap()
                .value()
                .cloned(),
            Some(FieldValue::Color(Color32::GOLD))
        );
    }

    #[test]
    fn test_select_binds_and_deselect_clears_aggregator() {
        let mut surface = new_surface();
        let a = new_rect();
        let b = new_rect();
        let a_uuid = a.uuid();
        let b_uuid = b.uuid();
        surface.add_element(a.clone(), false).unwrap();
        surface.add_element(b, false).unwrap();

        assert!(surface.select_element(&a_uuid));
        assert!(surface.select_element(&b_uuid));
        assert_eq!(surface.field_aggregator().read().bound_count(), 2);
        assert!(a.selected());

        surface.deselect_all();
        assert_eq!(surface.field_aggregator().read().bound_count(), 0);
        assert!(surface.selection().is_empty());
        assert!(!a.selected());

        assert!(!surface.select_element(&ElementUuid::now_v7()));
    }

    #[test]
    fn test_removal_drops_selection_and_binding() {
        let mut surface = new_surface();
        let element = new_rect();
        let uuid = element.uuid();
        surface.add_element(element, false).unwrap();
        surface.select_element(&uuid);

        surface.remove_element(&uuid, false);
        assert!(surface.selection().is_empty());
        assert_eq!(surface.field_aggregator().read().bound_count(), 0);
    }

    #[test]
    fn test_new_action_clears_redo_stack() {
        let mut surface = new_surface();
        let a = new_rect();
        surface.add_element(a, true).unwrap();
        surface.undo().unwrap();
        assert!(surface.history().read().can_redo());

        let b = new_rect();
        surface.add_element(b, true).unwrap();
        assert!(!surface.history().read().can_redo());
    }

    #[test]
    fn test_undo_of_empty_history_is_a_noop() {
        let mut surface = new_surface();
        assert_eq!(surface.undo(), Ok(false));
        assert_eq!(surface.redo(), Ok(false));
    }

    #[test]
    fn test_mutations_mark_modified_and_invalidate() {
        let mut surface = new_surface();
        assert!(!surface.modified());
        let before = surface.invalidations();

        surface.add_element(new_rect(), false).unwrap();
        assert!(surface.modified());
        assert!(surface.invalidations() > before);

        surface.set_modified(false);
        surface.change_background(
            Arc::new(ColorImage::default()),
            TSTransform::IDENTITY,
            false,
        );
        assert!(surface.modified());
    }

    #[test]
    fn test_bulk_add_is_all_or_nothing() {
        let mut surface = new_surface();
        let a = new_rect();
        let b = new_rect();
        surface.add_element(a.clone(), false).unwrap();

        let rejected = surface.add_elements(vec![a, b], false).unwrap_err();
        assert_eq!(rejected.len(), 2);
        assert_eq!(surface.element_count(), 1);
    }
}
