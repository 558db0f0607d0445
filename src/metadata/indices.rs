//! Per-run tables of cross-cutting method facts.
//!
//! Some facts about a method are discovered by the classfile scanner but are not part of the
//! method's own immutable metadata: whether it unconditionally throws, whether it is an
//! "unsupported operation" stub, whether it simply returns one of its parameters, and whether it
//! is a compiler-generated accessor for another member. [`AuxiliaryIndices`] keeps these facts in
//! identity-keyed tables so that a whole run can be forgotten with a single [`AuxiliaryIndices::clear`]
//! without touching any [`MethodInfo`].
//!
//! # Lifecycle
//!
//! - Entries are only added by [`crate::metadata::method::MethodInfoBuilder::build`]
//! - Within a run the tables only grow
//! - [`AuxiliaryIndices::clear`] empties every table at once; afterwards all queries answer
//!   `false` / `None`
//!
//! The indices also hold the annotation listeners that are told when a method's annotations
//! change after it was built (see [`MethodInfo::add_annotation`]).
//!
//! # Thread Safety
//!
//! All tables are `DashMap` / `DashSet`, so registration and queries may come from any thread.

use std::sync::{Arc, RwLock, Weak};

use dashmap::{DashMap, DashSet};

use crate::metadata::{
    descriptor::{DescriptorId, FieldDescriptor, MethodDescriptor},
    method::MethodInfo,
};

/// Receiver of annotation change notifications.
///
/// Implemented by databases that derive facts from method annotations and must react when
/// annotations are added to an already built method.
pub trait AnnotationListener: Send + Sync {
    /// Called after `method` gained a method or parameter annotation
    fn annotations_updated(&self, method: &MethodInfo);
}

/// Identity-keyed fact tables for one analysis run.
#[derive(Default)]
pub struct AuxiliaryIndices {
    unconditional_throwers: DashSet<DescriptorId>,
    unsupported: DashSet<DescriptorId>,
    identity: DashSet<DescriptorId>,
    access_for_method: DashMap<DescriptorId, MethodDescriptor>,
    access_for_field: DashMap<DescriptorId, FieldDescriptor>,
    listeners: RwLock<Vec<Weak<dyn AnnotationListener>>>,
}

impl AuxiliaryIndices {
    /// Creates empty indices
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn mark_unconditional_thrower(&self, method: DescriptorId) {
        self.unconditional_throwers.insert(method);
    }

    pub(crate) fn mark_unsupported(&self, method: DescriptorId) {
        self.unsupported.insert(method);
    }

    pub(crate) fn mark_identity(&self, method: DescriptorId) {
        self.identity.insert(method);
    }

    pub(crate) fn set_access_method_for_method(&self, method: DescriptorId, target: MethodDescriptor) {
        self.access_for_method.insert(method, target);
    }

    pub(crate) fn set_access_method_for_field(&self, method: DescriptorId, target: FieldDescriptor) {
        self.access_for_field.insert(method, target);
    }

    /// Returns `true` if the method always throws
    #[must_use]
    pub fn is_unconditional_thrower(&self, method: DescriptorId) -> bool {
        self.unconditional_throwers.contains(&method)
    }

    /// Returns `true` if the method only throws `UnsupportedOperationException`
    #[must_use]
    pub fn is_unsupported(&self, method: DescriptorId) -> bool {
        self.unsupported.contains(&method)
    }

    /// Returns `true` if the method returns one of its parameters unchanged
    #[must_use]
    pub fn is_identity(&self, method: DescriptorId) -> bool {
        self.identity.contains(&method)
    }

    /// The method that `method` is an access method for
    #[must_use]
    pub fn access_method_for_method(&self, method: DescriptorId) -> Option<MethodDescriptor> {
        self.access_for_method
            .get(&method)
            .map(|entry| entry.value().clone())
    }

    /// The field that `method` is an access method for
    #[must_use]
    pub fn access_method_for_field(&self, method: DescriptorId) -> Option<FieldDescriptor> {
        self.access_for_field
            .get(&method)
            .map(|entry| entry.value().clone())
    }

    /// Total number of recorded facts
    #[must_use]
    pub fn len(&self) -> usize {
        self.unconditional_throwers.len()
            + self.unsupported.len()
            + self.identity.len()
            + self.access_for_method.len()
            + self.access_for_field.len()
    }

    /// Returns `true` if no fact is recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every fact.
    ///
    /// Must run before a new analysis run starts; partially cleared indices would leak facts
    /// from the previous run. Registered listeners stay registered.
    pub fn clear(&self) {
        self.unconditional_throwers.clear();
        self.unsupported.clear();
        self.identity.clear();
        self.access_for_method.clear();
        self.access_for_field.clear();
    }

    /// Unregisters every listener; used when the databases behind them are dropped
    pub(crate) fn remove_annotation_listeners(&self) {
        write_lock!(self.listeners).clear();
    }

    /// Number of registered listeners that are still alive
    #[must_use]
    pub fn annotation_listener_count(&self) -> usize {
        read_lock!(self.listeners)
            .iter()
            .filter(|listener| listener.strong_count() > 0)
            .count()
    }

    /// Registers a listener for annotation changes.
    ///
    /// Only a weak reference is kept; listeners that were dropped are pruned here.
    pub fn add_annotation_listener(&self, listener: &Arc<dyn AnnotationListener>) {
        let mut listeners = write_lock!(self.listeners);
        listeners.retain(|existing| existing.strong_count() > 0);
        listeners.push(Arc::downgrade(listener));
    }

    /// Tells every live listener that `method` gained an annotation
    pub fn notify_annotations_updated(&self, method: &MethodInfo) {
        let live: Vec<Arc<dyn AnnotationListener>> = read_lock!(self.listeners)
            .iter()
            .filter_map(Weak::upgrade)
            .collect();

        for listener in live {
            listener.annotations_updated(method);
        }
    }
}
