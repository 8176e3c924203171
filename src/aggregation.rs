use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::slice::Iter;

use crate::datum::{Datum, NameHasher};

// ------------- Aggregation -------------
/// Buckets keyed by grain label. Labels are kept in the order they were first
/// seen, which is the order reports render them in.
#[derive(Debug, Default)]
pub struct Aggregation {
    order: Vec<String>,
    buckets: HashMap<String, Datum, NameHasher>,
}

impl Aggregation {
    pub fn new() -> Self {
        Self::default()
    }
    /// Get-or-create. The same label always yields the same datum.
    pub fn bucket(&mut self, label: &str) -> &mut Datum {
        match self.buckets.entry(label.to_owned()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                self.order.push(label.to_owned());
                e.insert(Datum::new(label))
            }
        }
    }
    pub fn get(&self, label: &str) -> Option<&Datum> {
        self.buckets.get(label)
    }
    pub fn labels(&self) -> Labels<'_> {
        Labels { inner: self.order.iter() }
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Datum)> {
        self.order
            .iter()
            .filter_map(|label| self.buckets.get(label).map(|datum| (label.as_str(), datum)))
    }
    pub fn len(&self) -> usize {
        self.order.len()
    }
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct Labels<'a> {
    inner: Iter<'a, String>,
}
impl<'a> Iterator for Labels<'a> {
    type Item = &'a str;
    fn next(&mut self) -> Option<&'a str> {
        self.inner.next().map(String::as_str)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
impl ExactSizeIterator for Labels<'_> {}
