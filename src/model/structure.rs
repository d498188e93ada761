//! Named, typed aggregates of elements and the operation replay rules.
//!
//! A [`DataStructure`] is one tagged container; the `{Array, Tree,
//! IndependentElement}` shapes share one struct and are dispatched through
//! explicit matches in the apply logic rather than a trait hierarchy.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::LogError;
use crate::model::element::{Address, Element, OpKind, OperationCounter};
use crate::wrapper::operation::Operation;
use crate::wrapper::root::{AnnotatedVariable, Locator};

/// The raw shape of a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawType {
    /// Linear ordered sequence with contiguous integer addresses.
    Array,
    /// Elements addressed by hierarchical path. The abstract shape
    /// (binary/general) is a declaration attribute, not enforced here.
    Tree,
    /// A free-standing single variable, e.g. a swap temporary. Degenerate
    /// array holding zero or one element.
    IndependentElement,
}

impl RawType {
    /// Wire token.
    pub fn as_str(&self) -> &'static str {
        match self {
            RawType::Array => "array",
            RawType::Tree => "tree",
            RawType::IndependentElement => "independentElement",
        }
    }

    /// Display name.
    pub fn pretty(&self) -> &'static str {
        match self {
            RawType::Array => "Array",
            RawType::Tree => "Tree",
            RawType::IndependentElement => "Orphan",
        }
    }

    /// Parse a wire token. Unknown tokens yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "array" => Some(RawType::Array),
            "tree" => Some(RawType::Tree),
            "independentElement" => Some(RawType::IndependentElement),
            _ => None,
        }
    }
}

impl std::fmt::Display for RawType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.pretty())
    }
}

/// Rendering hint resolved from the structure shape. Opaque to replay;
/// consumed by a downstream renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualHint {
    Bar,
    Tree,
    Single,
}

impl VisualHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualHint::Bar => "bar",
            VisualHint::Tree => "tree",
            VisualHint::Single => "single",
        }
    }
}

/// A named aggregate of elements, replaying operations against itself.
#[derive(Debug, Clone, PartialEq)]
pub struct DataStructure {
    identifier: String,
    raw_type: RawType,
    abstract_type: String,
    visual: String,
    attributes: BTreeMap<String, serde_json::Value>,
    elements: BTreeMap<Address, Element>,
    /// Aggregate operation counter for the whole structure.
    oc: OperationCounter,
    /// Addresses touched since the consumer last called [`clear_dirty`].
    /// Never auto-cleared by replay.
    ///
    /// [`clear_dirty`]: DataStructure::clear_dirty
    modified: BTreeSet<Address>,
    repaint_all: bool,
    resolved_visual: Option<VisualHint>,
}

impl DataStructure {
    pub fn new(
        identifier: impl Into<String>,
        raw_type: RawType,
        abstract_type: impl Into<String>,
        visual: impl Into<String>,
        attributes: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            raw_type,
            abstract_type: abstract_type.into(),
            visual: visual.into(),
            attributes,
            elements: BTreeMap::new(),
            oc: OperationCounter::default(),
            modified: BTreeSet::new(),
            repaint_all: false,
            resolved_visual: None,
        }
    }

    /// Parse a wire declaration into a structure.
    pub fn from_declaration(av: &AnnotatedVariable) -> Result<Self, LogError> {
        let raw_type = RawType::parse(&av.raw_type).ok_or_else(|| {
            LogError::UnknownStructure(format!(
                "\"{}\" declares raw type \"{}\"",
                av.identifier, av.raw_type
            ))
        })?;
        Ok(Self::new(
            av.identifier.clone(),
            raw_type,
            av.abstract_type.clone(),
            av.visual.clone(),
            av.attributes.clone(),
        ))
    }

    /// The wire declaration for this structure.
    pub fn declaration(&self) -> AnnotatedVariable {
        AnnotatedVariable {
            identifier: self.identifier.clone(),
            raw_type: self.raw_type.as_str().to_string(),
            abstract_type: self.abstract_type.clone(),
            visual: self.visual.clone(),
            attributes: self.attributes.clone(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn raw_type(&self) -> RawType {
        self.raw_type
    }

    pub fn abstract_type(&self) -> &str {
        &self.abstract_type
    }

    pub fn counter(&self) -> &OperationCounter {
        &self.oc
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    /// Insert an element at `address`. Addresses are unique per structure.
    pub fn create_element(&mut self, address: Address, value: f64) -> Result<(), LogError> {
        if self.elements.contains_key(&address) {
            return Err(LogError::AddressConflict {
                identifier: self.identifier.clone(),
                address,
            });
        }
        self.elements
            .insert(address.clone(), Element::new(value, address));
        Ok(())
    }

    /// Pure lookup: absent (not an error) when the address is unpopulated.
    /// For an independent element the address is ignored and the sole held
    /// element is returned, if any.
    pub fn element(&self, locator: &Locator) -> Option<&Element> {
        if locator.identifier != self.identifier {
            return None;
        }
        match self.raw_type {
            RawType::IndependentElement => self.elements.values().next(),
            RawType::Array | RawType::Tree => self.elements.get(&locator.address),
        }
    }

    /// Value shorthand used by tests and renderers.
    pub fn value_at(&self, address: &[i32]) -> Option<f64> {
        self.elements.get(address).map(Element::value)
    }

    /// The value of the sole held element, or 0.0 when empty. Only
    /// meaningful for independent elements.
    pub fn numeric_value(&self) -> f64 {
        self.elements.values().next().map_or(0.0, Element::value)
    }

    /// Replace the held element. Only meaningful for independent elements.
    pub fn set_element(&mut self, element: Element) {
        self.elements.clear();
        self.elements.insert(element.address().to_vec(), element);
    }

    /// Lazily create the sole element at address `[0]`.
    fn init_element(&mut self, value: f64) {
        self.elements.clear();
        self.elements.insert(vec![0], Element::new(value, vec![0]));
    }

    /// Replay one operation against this structure.
    ///
    /// Each locator side is matched against this structure's identifier
    /// independently; sides naming other structures are ignored. Replaying
    /// the same `Read` twice leaves contents unchanged; replaying a `Write`
    /// or `Swap` twice double-counts by design; deduplication is the
    /// delivery layer's concern.
    pub fn apply(&mut self, op: &Operation) {
        match self.raw_type {
            RawType::IndependentElement => self.apply_independent(op),
            RawType::Array | RawType::Tree => self.apply_indexed(op),
        }
    }

    fn apply_indexed(&mut self, op: &Operation) {
        match op {
            Operation::Read { source, .. } => self.read_indexed(source),
            Operation::Write { target, value } => {
                self.write_indexed(target, value.first().copied().unwrap_or_default());
            }
            Operation::ReadWrite {
                source,
                target,
                value,
            } => {
                // Both sides may resolve into this one structure; each is an
                // independent element mutation.
                if let Some(target) = target {
                    self.write_indexed(target, value.first().copied().unwrap_or_default());
                }
                if let Some(source) = source {
                    self.read_indexed(source);
                }
            }
            Operation::Swap { var1, var2, value } => {
                self.swap_side_indexed(var1, value[0]);
                self.swap_side_indexed(var2, value[1]);
            }
        }
    }

    fn read_indexed(&mut self, source: &Locator) {
        if source.identifier != self.identifier {
            return;
        }
        // Observing an unpopulated address is a no-op.
        if let Some(e) = self.elements.get_mut(&source.address) {
            e.count(OpKind::Read);
            self.oc.count(OpKind::Read);
            self.modified.insert(source.address.clone());
        }
    }

    fn write_indexed(&mut self, target: &Locator, value: f64) {
        if target.identifier != self.identifier {
            return;
        }
        // The write defines the element if the address was unpopulated.
        let e = self
            .elements
            .entry(target.address.clone())
            .or_insert_with(|| Element::new(value, target.address.clone()));
        e.set_value(value);
        e.count(OpKind::Write);
        self.oc.count(OpKind::Write);
        self.modified.insert(target.address.clone());
    }

    fn swap_side_indexed(&mut self, var: &Locator, value: f64) {
        if var.identifier != self.identifier {
            return;
        }
        // Like a write, a swap side defines the element when replaying
        // against a mirror whose declaration carried no values.
        let e = self
            .elements
            .entry(var.address.clone())
            .or_insert_with(|| Element::new(value, var.address.clone()));
        e.set_value(value);
        e.count(OpKind::Swap);
        self.oc.count(OpKind::Swap);
        self.modified.insert(var.address.clone());
    }

    fn apply_independent(&mut self, op: &Operation) {
        match op {
            Operation::Read { source, value } => {
                self.rw_independent(Some(source), None, value.first().copied().unwrap_or_default());
            }
            Operation::Write { target, value } => {
                self.rw_independent(None, Some(target), value.first().copied().unwrap_or_default());
            }
            Operation::ReadWrite {
                source,
                target,
                value,
            } => {
                self.rw_independent(
                    source.as_ref(),
                    target.as_ref(),
                    value.first().copied().unwrap_or_default(),
                );
            }
            Operation::Swap { var1, var2, value } => {
                if var1.identifier == self.identifier {
                    self.swap_independent(value[0]);
                } else if var2.identifier == self.identifier {
                    self.swap_independent(value[1]);
                }
            }
        }
        // Single-element holders always repaint whole.
        self.repaint_all = true;
    }

    /// The sole element is addressed regardless of the locator's address
    /// field. If both sides match, the write wins.
    fn rw_independent(&mut self, source: Option<&Locator>, target: Option<&Locator>, value: f64) {
        let source_matches = source.is_some_and(|l| l.identifier == self.identifier);
        let target_matches = target.is_some_and(|l| l.identifier == self.identifier);
        if !source_matches && !target_matches {
            return;
        }
        if self.elements.is_empty() {
            self.init_element(value);
        }
        let e = self.elements.values_mut().next().expect("just initialised");
        if target_matches {
            e.set_value(value);
            e.count(OpKind::Write);
            self.oc.count(OpKind::Write);
        } else {
            e.count(OpKind::Read);
            self.oc.count(OpKind::Read);
        }
        self.modified.insert(vec![0]);
    }

    fn swap_independent(&mut self, value: f64) {
        if self.elements.is_empty() {
            self.init_element(0.0);
        }
        let e = self.elements.values_mut().next().expect("just initialised");
        e.set_value(value);
        e.count(OpKind::Swap);
        self.oc.count(OpKind::Swap);
        self.modified.insert(vec![0]);
    }

    /// Wipe all elements, reset counters, mark everything for re-render.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.oc.reset();
        self.modified.clear();
        self.repaint_all = true;
    }

    /// Addresses modified since the consumer's last [`clear_dirty`] call.
    ///
    /// [`clear_dirty`]: DataStructure::clear_dirty
    pub fn modified(&self) -> &BTreeSet<Address> {
        &self.modified
    }

    pub fn needs_full_repaint(&self) -> bool {
        self.repaint_all
    }

    /// Reset the dirty state. The rendering consumer must call this once per
    /// consumption cycle.
    pub fn clear_dirty(&mut self) {
        self.modified.clear();
        self.repaint_all = false;
    }

    /// Rendering hint for this structure's shape. Pure apart from caching
    /// the chosen hint.
    pub fn resolve_visual(&mut self) -> VisualHint {
        if let Some(hint) = self.resolved_visual {
            return hint;
        }
        let hint = match self.raw_type {
            RawType::Array => VisualHint::Bar,
            RawType::Tree => VisualHint::Tree,
            RawType::IndependentElement => VisualHint::Single,
        };
        self.resolved_visual = Some(hint);
        hint
    }
}

impl std::fmt::Display for DataStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\": {}", self.identifier, self.raw_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wrapper::root::Locator;

    fn array(id: &str, values: &[f64]) -> DataStructure {
        let mut ds = DataStructure::new(id, RawType::Array, "", "", BTreeMap::new());
        for (i, v) in values.iter().enumerate() {
            ds.create_element(vec![i as i32], *v).unwrap();
        }
        ds
    }

    fn orphan(id: &str) -> DataStructure {
        DataStructure::new(id, RawType::IndependentElement, "", "", BTreeMap::new())
    }

    #[test]
    fn write_then_swap_scenario() {
        let mut a = array("A", &[0.0, 0.0, 0.0]);

        a.apply(&Operation::Write {
            target: Locator::new("A", vec![1]),
            value: vec![5.0],
        });
        assert_eq!(a.value_at(&[1]), Some(5.0));
        let e = a.element(&Locator::new("A", vec![1])).unwrap();
        assert_eq!(e.counter().writes, 1);
        assert!(a.modified().contains(&vec![1]));

        a.apply(&Operation::Swap {
            var1: Locator::new("A", vec![1]),
            var2: Locator::new("A", vec![2]),
            value: [7.0, 5.0],
        });
        assert_eq!(a.value_at(&[1]), Some(7.0));
        assert_eq!(a.value_at(&[2]), Some(5.0));
        for idx in [1, 2] {
            let e = a.element(&Locator::new("A", vec![idx])).unwrap();
            assert_eq!(e.counter().swaps, 1);
        }
    }

    #[test]
    fn read_is_idempotent_on_contents() {
        let mut a = array("A", &[3.0, 4.0]);
        let read = Operation::Read {
            source: Locator::new("A", vec![0]),
            value: vec![3.0],
        };
        a.apply(&read);
        a.apply(&read);
        assert_eq!(a.value_at(&[0]), Some(3.0));
        assert_eq!(a.value_at(&[1]), Some(4.0));
        // Counters increase by exactly one per application.
        let e = a.element(&Locator::new("A", vec![0])).unwrap();
        assert_eq!(e.counter().reads, 2);
        assert_eq!(a.counter().reads, 2);
    }

    #[test]
    fn swap_between_two_structures() {
        let mut a = array("A", &[9.0]);
        let mut tmp = orphan("tmp");
        tmp.apply(&Operation::Write {
            target: Locator::new("tmp", vec![0]),
            value: vec![2.0],
        });

        let swap = Operation::Swap {
            var1: Locator::new("A", vec![0]),
            var2: Locator::new("tmp", vec![0]),
            value: [2.0, 9.0],
        };
        a.apply(&swap);
        tmp.apply(&swap);

        assert_eq!(a.value_at(&[0]), Some(2.0));
        assert_eq!(tmp.numeric_value(), 9.0);
        assert_eq!(a.element(&Locator::new("A", vec![0])).unwrap().counter().swaps, 1);
        assert_eq!(
            tmp.element(&Locator::new("tmp", vec![5])).unwrap().counter().swaps,
            1,
            "orphan address field is ignored on lookup"
        );
    }

    #[test]
    fn create_element_rejects_occupied_address() {
        let mut a = array("A", &[1.0]);
        let err = a.create_element(vec![0], 2.0).unwrap_err();
        assert!(matches!(err, LogError::AddressConflict { .. }));
        assert_eq!(a.value_at(&[0]), Some(1.0));
    }

    #[test]
    fn write_defines_unpopulated_array_address() {
        let mut a = array("A", &[]);
        a.apply(&Operation::Write {
            target: Locator::new("A", vec![4]),
            value: vec![8.0],
        });
        assert_eq!(a.value_at(&[4]), Some(8.0));
    }

    #[test]
    fn orphan_lazily_initialises_on_write() {
        let mut tmp = orphan("tmp");
        assert_eq!(tmp.numeric_value(), 0.0);
        tmp.apply(&Operation::Write {
            target: Locator::new("tmp", vec![]),
            value: vec![6.0],
        });
        assert_eq!(tmp.numeric_value(), 6.0);
        assert!(tmp.needs_full_repaint());
    }

    #[test]
    fn orphan_write_wins_when_both_sides_match() {
        let mut tmp = orphan("tmp");
        tmp.apply(&Operation::ReadWrite {
            source: Some(Locator::new("tmp", vec![0])),
            target: Some(Locator::new("tmp", vec![0])),
            value: vec![3.0],
        });
        assert_eq!(tmp.numeric_value(), 3.0);
        assert_eq!(tmp.counter().writes, 1);
        assert_eq!(tmp.counter().reads, 0);
    }

    #[test]
    fn read_write_both_sides_in_one_structure() {
        let mut a = array("A", &[1.0, 0.0]);
        a.apply(&Operation::ReadWrite {
            source: Some(Locator::new("A", vec![0])),
            target: Some(Locator::new("A", vec![1])),
            value: vec![1.0],
        });
        assert_eq!(a.value_at(&[1]), Some(1.0));
        assert_eq!(a.counter().reads, 1);
        assert_eq!(a.counter().writes, 1);
    }

    #[test]
    fn operations_for_other_structures_are_ignored() {
        let mut a = array("A", &[1.0]);
        a.apply(&Operation::Write {
            target: Locator::new("B", vec![0]),
            value: vec![9.0],
        });
        assert_eq!(a.value_at(&[0]), Some(1.0));
        assert_eq!(a.counter().writes, 0);
        assert!(a.modified().is_empty());
    }

    #[test]
    fn clear_resets_counters_and_marks_repaint() {
        let mut a = array("A", &[1.0]);
        a.apply(&Operation::Write {
            target: Locator::new("A", vec![0]),
            value: vec![2.0],
        });
        a.clear();
        assert!(a.is_empty());
        assert_eq!(a.counter(), &OperationCounter::default());
        assert!(a.needs_full_repaint());

        a.clear_dirty();
        assert!(!a.needs_full_repaint());
        assert!(a.modified().is_empty());
    }

    #[test]
    fn declaration_roundtrip_and_unknown_raw_type() {
        let a = array("A", &[]);
        let av = a.declaration();
        assert_eq!(av.raw_type, "array");
        let back = DataStructure::from_declaration(&av).unwrap();
        assert_eq!(back.identifier(), "A");
        assert_eq!(back.raw_type(), RawType::Array);

        let mut bad = av.clone();
        bad.raw_type = "matrix".to_string();
        assert!(matches!(
            DataStructure::from_declaration(&bad),
            Err(LogError::UnknownStructure(_))
        ));
    }

    #[test]
    fn visual_hint_follows_shape() {
        assert_eq!(array("A", &[]).resolve_visual(), VisualHint::Bar);
        assert_eq!(orphan("t").resolve_visual(), VisualHint::Single);
        let mut t = DataStructure::new("t", RawType::Tree, "binaryTree", "", BTreeMap::new());
        assert_eq!(t.resolve_visual(), VisualHint::Tree);
    }
}
