
use std::collections::HashSet;
use std::sync::Arc;

use egui::emath::TSTransform;
use egui::{ColorImage, Pos2, Vec2};

use crate::common::uuid::ElementUuid;
use crate::elements::Element;
use crate::fields::field::{FieldType, FieldValue};
use crate::fields::holder::FieldError;
use crate::surface::Surface;

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum RestoreError {
    #[error("element {0} is no longer on the surface")]
    MissingElement(ElementUuid),
    #[error("element {0} is already on the surface")]
    AlreadyPresent(ElementUuid),
    #[error("element {0} does not carry text")]
    NotATextElement(ElementUuid),
    #[error("element {element}: {source}")]
    Field {
        element: ElementUuid,
        source: FieldError,
    },
}

/// One undoable action. Restoring consumes the memento, performs the
/// inverse mutation on the surface and returns the inverse memento, so
/// redo is symmetric with undo.
///
/// Element references are non-owning ids resolved through the surface's
/// element table at restore time; only the Delete variants own the removed
/// element(s), because the table no longer does.
pub enum Memento {
    /// An element was added; restoring removes it again.
    AddElement { element: ElementUuid },
    /// Several elements were added; restoring removes them in order.
    AddElements { elements: Vec<ElementUuid> },
    /// An element was removed; restoring puts it back and re-selects it if
    /// it was selected when captured.
    DeleteElement {
        element: Element,
        was_selected: bool,
    },
    /// Several elements were removed; restoring re-adds them in the
    /// captured order.
    DeleteElements { elements: Vec<Element> },
    /// Location/size snapshot of a set of elements, taken before a move or
    /// resize.
    BoundsChange {
        bounds: Vec<(ElementUuid, Pos2, Vec2)>,
    },
    /// Background image replaced under `matrix`; the matrix is stored
    /// inverted so that replaying it reverses the original transform.
    BackgroundChange {
        image: Arc<ColorImage>,
        matrix: TSTransform,
    },
    /// Text snapshot of a text element, taken before an edit.
    TextChange {
        element: ElementUuid,
        text: Arc<String>,
    },
    /// Value snapshot of a single field, taken before an assignment.
    FieldChange {
        element: ElementUuid,
        field_type: FieldType,
        value: Option<FieldValue>,
    },
}

impl Memento {
    pub fn add_element(element: &Element) -> Memento {
        Memento::AddElement {
            element: element.uuid(),
        }
    }

    pub fn add_elements<'a>(elements: impl IntoIterator<Item = &'a Element>) -> Memento {
        Memento::AddElements {
            elements: elements.into_iter().map(|e| e.uuid()).collect(),
        }
    }

    pub fn delete_element(element: Element) -> Memento {
        let was_selected = element.selected();
        Memento::DeleteElement {
            element,
            was_selected,
        }
    }

    pub fn delete_elements(elements: Vec<Element>) -> Memento {
        Memento::DeleteElements { elements }
    }

    pub fn bounds_change<'a>(elements: impl IntoIterator<Item = &'a Element>) -> Memento {
        Memento::BoundsChange {
            bounds: elements
                .into_iter()
                .map(|e| (e.uuid(), e.location(), e.size()))
                .collect(),
        }
    }

    /// `matrix` is the transform the action applied; it is stored inverted.
    pub fn background_change(image: Arc<ColorImage>, matrix: TSTransform) -> Memento {
        Memento::BackgroundChange {
            image,
            matrix: matrix.inverse(),
        }
    }

    pub fn text_change(element: ElementUuid, text: Arc<String>) -> Memento {
        Memento::TextChange { element, text }
    }

    pub fn field_change(element: &Element, field_type: FieldType) -> Result<Memento, FieldError> {
        let field = element.get_field(field_type)?;
        Ok(Memento::FieldChange {
            element: element.uuid(),
            field_type,
            value: field.value().cloned(),
        })
    }

    /// Decides whether `newer`, about to be pushed while `self` is the top
    /// of the history, is already represented by this entry. On `true` the
    /// caller discards `newer`; this entry keeps its earlier snapshot.
    pub fn try_merge(&self, newer: &Memento) -> bool {
        match (self, newer) {
            (
                Memento::BoundsChange { bounds: own },
                Memento::BoundsChange { bounds: other },
            ) => {
                let own: HashSet<ElementUuid> = own.iter().map(|(id, ..)| *id).collect();
                let other: HashSet<ElementUuid> = other.iter().map(|(id, ..)| *id).collect();
                own == other
            }
            (
                Memento::TextChange { element: own, .. },
                Memento::TextChange { element: other, .. },
            ) => own == other,
            (
                Memento::FieldChange {
                    element: own,
                    field_type: own_type,
                    ..
                },
                Memento::FieldChange {
                    element: other,
                    field_type: other_type,
                    ..
                },
            ) => own == other && own_type == other_type,
            _ => false,
        }
    }

    /// Performs the inverse action and returns its own inverse.
    ///
    /// Preconditions are checked before anything is mutated; on error the
    /// surface is left untouched.
    pub fn restore(self, surface: &mut Surface) -> Result<Memento, RestoreError> {
        match self {
            Memento::AddElement { element } => {
                let element = surface
                    .get_element(&element)
                    .ok_or(RestoreError::MissingElement(element))?;
                surface.invalidate();
                let inverse = Memento::delete_element(element.clone());
                surface.remove_element(&element.uuid(), false);
                element.set_selected(true);
                surface.invalidate();
                Ok(inverse)
            }
            Memento::AddElements { elements } => {
                for id in &elements {
                    if !surface.contains(id) {
                        return Err(RestoreError::MissingElement(*id));
                    }
                }
                let mut removed = Vec::with_capacity(elements.len());
                for id in &elements {
                    // present per the precondition check above
                    if let Some(element) = surface.remove_element(id, false) {
                        removed.push(element);
                    }
                }
                surface.invalidate();
                Ok(Memento::delete_elements(removed))
            }
            Memento::DeleteElement {
                element,
                was_selected,
            } => {
                let uuid = element.uuid();
                if surface.contains(&uuid) {
                    return Err(RestoreError::AlreadyPresent(uuid));
                }
                surface.invalidate();
                let inverse = Memento::add_element(&element);
                surface
                    .add_element(element, false)
                    .map_err(|e| RestoreError::AlreadyPresent(e.uuid()))?;
                if was_selected {
                    surface.select_element(&uuid);
                }
                surface.invalidate();
                Ok(inverse)
            }
            Memento::DeleteElements { elements } => {
                for element in &elements {
                    if surface.contains(&element.uuid()) {
                        return Err(RestoreError::AlreadyPresent(element.uuid()));
                    }
                }
                let inverse = Memento::add_elements(&elements);
                for element in elements {
                    let _ = surface.add_element(element, false);
                }
                surface.invalidate();
                Ok(inverse)
            }
            Memento::BoundsChange { bounds } => {
                let mut targets = Vec::with_capacity(bounds.len());
                for (id, location, size) in &bounds {
                    let element = surface
                        .get_element(id)
                        .ok_or(RestoreError::MissingElement(*id))?;
                    targets.push((element, *location, *size));
                }
                let inverse = Memento::bounds_change(targets.iter().map(|(e, ..)| e));
                for (element, location, size) in targets {
                    surface.invalidate();
                    element.set_bounds(location, size);
                    surface.invalidate();
                }
                surface.set_modified(true);
                Ok(inverse)
            }
            Memento::BackgroundChange { image, matrix } => {
                // the stored matrix is already inverted; the constructor
                // inverts again, yielding the original transform
                let inverse = Memento::background_change(surface.background(), matrix);
                surface.undo_background_change(image, matrix);
                Ok(inverse)
            }
            Memento::TextChange { element, text } => {
                let target = surface
                    .get_element(&element)
                    .ok_or(RestoreError::MissingElement(element))?;
                let Element::Text(target) = target else {
                    return Err(RestoreError::NotATextElement(element));
                };
                surface.invalidate();
                let previous = target.read().text().clone();
                target.write().set_text(text);
                surface.invalidate();
                Ok(Memento::text_change(element, previous))
            }
            Memento::FieldChange {
                element,
                field_type,
                value,
            } => {
                let target = surface
                    .get_element(&element)
                    .ok_or(RestoreError::MissingElement(element))?;
                let previous = target
                    .get_field(field_type)
                    .map_err(|source| RestoreError::Field { element, source })?;
                surface.invalidate();
                target
                    .set_field_value_raw(field_type, value)
                    .map_err(|source| RestoreError::Field { element, source })?;
                surface.invalidate();
                Ok(Memento::FieldChange {
                    element,
                    field_type,
                    value: previous.value().cloned(),
                })
            }
        }
    }
}
