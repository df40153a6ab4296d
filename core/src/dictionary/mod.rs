//! The Tag to VR dictionary boundary.
//!
//! Under implicit VR encodings the value representation is not on the
//! wire, so readers ask a [`VrDictionary`] for it.
//! The semantic dictionary of attributes is not part of this library:
//! callers bring their own, or use the map-backed [`TagVrMap`].

pub mod stub;

pub use self::stub::NoDictionary;

use crate::header::{Tag, VR};
use crate::vm::VM;
use std::collections::HashMap;
use std::fmt::Debug;

/// Type trait for a lookup of the typical value representation
/// of an attribute by its tag.
///
/// The methods herein have no generic parameters,
/// so as to enable being used as a trait object.
pub trait VrDictionary: Debug {
    /// Fetch the value representation of the attribute with this tag.
    fn vr_of(&self, tag: Tag) -> Option<VR>;

    /// Fetch the declared value multiplicity of the attribute,
    /// if known.
    fn vm_of(&self, _tag: Tag) -> Option<VM> {
        None
    }
}

impl<D: VrDictionary + ?Sized> VrDictionary for &D {
    fn vr_of(&self, tag: Tag) -> Option<VR> {
        (**self).vr_of(tag)
    }

    fn vm_of(&self, tag: Tag) -> Option<VM> {
        (**self).vm_of(tag)
    }
}

impl<D: VrDictionary + ?Sized> VrDictionary for Box<D> {
    fn vr_of(&self, tag: Tag) -> Option<VR> {
        (**self).vr_of(tag)
    }

    fn vm_of(&self, tag: Tag) -> Option<VM> {
        (**self).vm_of(tag)
    }
}

/// Resolve the value representation of an implicit VR element.
///
/// The dictionary is consulted first.
/// When it does not know the tag,
/// group lengths are UL, private creators are LO,
/// and everything else is UN.
pub fn implicit_vr<D>(dict: &D, tag: Tag) -> VR
where
    D: VrDictionary + ?Sized,
{
    if tag.group() == 0xFFFE {
        return VR::UN;
    }
    if let Some(vr) = dict.vr_of(tag) {
        return vr;
    }
    if tag.is_group_length() {
        VR::UL
    } else if tag.is_private_creator() {
        VR::LO
    } else {
        VR::UN
    }
}

/// A dictionary backed by an in-memory map,
/// typically filled in by the caller with the attributes it cares about.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TagVrMap {
    entries: HashMap<Tag, (VR, Option<VM>)>,
}

impl TagVrMap {
    /// Create an empty map.
    pub fn new() -> Self {
        TagVrMap::default()
    }

    /// Register an attribute's value representation.
    pub fn insert(&mut self, tag: Tag, vr: VR) -> &mut Self {
        self.entries.insert(tag, (vr, None));
        self
    }

    /// Register an attribute's value representation and multiplicity.
    pub fn insert_with_vm(&mut self, tag: Tag, vr: VR, vm: VM) -> &mut Self {
        self.entries.insert(tag, (vr, Some(vm)));
        self
    }

    /// The number of registered attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no attributes are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl VrDictionary for TagVrMap {
    fn vr_of(&self, tag: Tag) -> Option<VR> {
        self.entries.get(&tag).map(|(vr, _)| *vr)
    }

    fn vm_of(&self, tag: Tag) -> Option<VM> {
        self.entries.get(&tag).and_then(|(_, vm)| *vm)
    }
}

impl<T: Into<Tag>> FromIterator<(T, VR)> for TagVrMap {
    fn from_iter<I: IntoIterator<Item = (T, VR)>>(iter: I) -> Self {
        TagVrMap {
            entries: iter
                .into_iter()
                .map(|(tag, vr)| (tag.into(), (vr, None)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_rules() {
        let dict = NoDictionary;
        assert_eq!(implicit_vr(&dict, Tag(0x0008, 0x0000)), VR::UL);
        assert_eq!(implicit_vr(&dict, Tag(0x0009, 0x0010)), VR::LO);
        assert_eq!(implicit_vr(&dict, Tag(0x0009, 0x00FF)), VR::LO);
        assert_eq!(implicit_vr(&dict, Tag(0x0009, 0x1010)), VR::UN);
        assert_eq!(implicit_vr(&dict, Tag(0x0010, 0x0010)), VR::UN);
        assert_eq!(implicit_vr(&dict, Tag::ITEM), VR::UN);
    }

    #[test]
    fn map_lookup_wins() {
        let dict: TagVrMap = [((0x0010, 0x0010), VR::PN), ((0x0028, 0x0010), VR::US)]
            .into_iter()
            .collect();
        assert_eq!(dict.len(), 2);
        assert_eq!(implicit_vr(&dict, Tag(0x0010, 0x0010)), VR::PN);
        assert_eq!(implicit_vr(&dict, Tag(0x0010, 0x0020)), VR::UN);

        let mut dict = TagVrMap::new();
        dict.insert_with_vm(Tag(0x0028, 0x0030), VR::DS, VM::Fixed(2));
        assert_eq!(dict.vm_of(Tag(0x0028, 0x0030)), Some(VM::Fixed(2)));
        let boxed: Box<dyn VrDictionary> = Box::new(dict);
        assert_eq!(implicit_vr(&boxed, Tag(0x0028, 0x0030)), VR::DS);
    }
}
