//! This module contains a stub dictionary.

use super::VrDictionary;
use crate::header::{Tag, VR};

/// An empty dictionary, which knows no attribute.
///
/// Implicit VR readers using it fall back to UN
/// for every element other than group lengths and private creators.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoDictionary;

impl VrDictionary for NoDictionary {
    fn vr_of(&self, _: Tag) -> Option<VR> {
        None
    }
}
