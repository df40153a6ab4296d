//! In-place byte order conversion of a decoded data set.

use dcmio_core::{DataElement, DataSet, Value};
use dcmio_encoding::swap::swap_in_place;

/// Swap every binary value of the data set in place,
/// by the swap width of its value representation,
/// recursing through sequence items.
///
/// Text, single byte data, UN values and pixel data fragments
/// are left untouched.
/// With `swap_tags`, the group and element numbers of every tag
/// are byte swapped as well, at every nesting level.
pub fn byte_swap_dataset(dataset: &mut DataSet, swap_tags: bool) {
    if !swap_tags {
        for element in dataset.iter_mut() {
            swap_element_value(element, false);
        }
        return;
    }
    *dataset = std::mem::take(dataset)
        .into_iter()
        .map(|mut element| {
            swap_element_value(&mut element, true);
            let tag = element.tag().swapped();
            let vr = element.vr();
            DataElement::new(tag, vr, element.into_value())
        })
        .collect();
}

fn swap_element_value(element: &mut DataElement, swap_tags: bool) {
    let width = element.vr().swap_width() as usize;
    match element.value_mut() {
        Value::Bytes(bytes) => swap_in_place(bytes.as_bytes_mut(), width),
        Value::Items(items) => {
            for item in items.items_mut() {
                byte_swap_dataset(item.nested_mut(), swap_tags);
            }
        }
        Value::Fragments(_) => {}
    }
}
