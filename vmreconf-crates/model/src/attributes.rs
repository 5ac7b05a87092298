use std::collections::BTreeMap;

use crate::Element;

/// Integer attributes attached to elements, e.g. the duration of a VM's migration under the key
/// `"migrate"`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    values: BTreeMap<(Element, String), i64>,
}

impl Attributes {
    /// Sets the attribute and returns the previous value, if any.
    pub fn put(&mut self, element: impl Into<Element>, key: &str, value: i64) -> Option<i64> {
        self.values.insert((element.into(), key.to_owned()), value)
    }

    pub fn get(&self, element: impl Into<Element>, key: &str) -> Option<i64> {
        self.values.get(&(element.into(), key.to_owned())).copied()
    }

    pub fn remove(&mut self, element: impl Into<Element>, key: &str) -> Option<i64> {
        self.values.remove(&(element.into(), key.to_owned()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
