//! Extension points the host engine calls during a generation run.
//!
//! A run calls [`PreprocessHook::preprocess`] once before any operation
//! descriptors exist, then [`OperationsHook::postprocess_operations`] once per
//! operation set, then [`OperationsHook::publish`] once to write run-level
//! results into the template properties.

use crate::decode::DecodedConfig;
use crate::operation::OperationSet;
use crate::properties::{GenerationProperties, PropertyMap};
use crate::resolve::ResolvedTarget;

/// Runs before the host builds operation descriptors.
pub trait PreprocessHook {
    fn preprocess(&self, properties: GenerationProperties) -> crate::Result<DecodedConfig>;
}

/// Runs after the host has built each operation set.
pub trait OperationsHook {
    /// Inspect and annotate one operation set.
    fn postprocess_operations(&mut self, set: &mut OperationSet);

    /// Write whatever the hook derived across the run into `properties`.
    fn publish(&self, properties: &mut PropertyMap);

    /// Target call shape derived during the run, for hooks that derive one.
    fn resolved_target(&self) -> Option<&ResolvedTarget> {
        None
    }
}
