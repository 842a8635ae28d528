//! Editing-state core of a vector-graphics screenshot editor: per-action
//! undo/redo mementos over an element surface, and a field aggregator
//! keeping a shared property view synchronized with the current selection.

pub mod common;
pub mod elements;
pub mod fields;
pub mod history;
pub mod surface;

pub use common::eref::ERef;
pub use common::uuid::ElementUuid;
pub use elements::{ChildrenChanged, Element, GroupElement, ShapeElement, ShapeKind, TextElement};
pub use fields::aggregator::FieldAggregator;
pub use fields::defaults::FieldDefaults;
pub use fields::field::{Arrowheads, Field, FieldKind, FieldType, FieldValue};
pub use fields::holder::{FieldChange, FieldError, FieldHolder, FieldSet};
pub use history::History;
pub use history::memento::{Memento, RestoreError};
pub use surface::Surface;
