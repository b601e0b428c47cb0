use std::{cmp::Ordering, fmt::Display};

use crate::error::{Error, Result};

/// Namespace of a resource name, also the resource dictionary it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    GraphicState,
    Pattern,
    XObject,
    Font,
}

impl ResourceKind {
    pub fn tag(self) -> char {
        match self {
            ResourceKind::GraphicState => 'G',
            ResourceKind::Pattern => 'P',
            ResourceKind::XObject => 'X',
            ResourceKind::Font => 'F',
        }
    }

    /// Key of the resource dictionary for this kind.
    pub fn dictionary_key(self) -> &'static str {
        match self {
            ResourceKind::GraphicState => "ExtGState",
            ResourceKind::Pattern => "Pattern",
            ResourceKind::XObject => "XObject",
            ResourceKind::Font => "Font",
        }
    }
}

/// The name a content stream uses to refer to a resource, e.g. `/X3`.
///
/// The page tree's resource dictionaries map these names to object numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceName {
    kind: ResourceKind,
    index: u32,
}

impl ResourceName {
    pub fn new(kind: ResourceKind, index: u32) -> Result<Self> {
        if index == 0 {
            return Err(Error::InvalidResourceIndex);
        }
        Ok(Self { kind, index })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

impl Display for ResourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}{}", self.kind.tag(), self.index)
    }
}

impl Ord for ResourceName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index
            .cmp(&other.index)
            .then_with(|| self.kind.tag().cmp(&other.kind.tag()))
    }
}

impl PartialOrd for ResourceName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Identity of an image: equal keys are embedded once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageKey {
    pub generation_id: u32,
    /// Position of the image inside the pixel buffer it was cut from.
    pub origin: (i32, i32),
    pub dimensions: (u32, u32),
}

/// Association list that keeps insertion order.
///
/// Documents only have a handful of resources per kind, so lookups scan
/// linearly.
#[derive(Debug, Clone)]
pub struct ResourceMap<K, V> {
    entries: Vec<(K, V)>,
}

impl<K, V> Default for ResourceMap<K, V> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<K: PartialEq, V> ResourceMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new entry. Adding a key twice is a programming error.
    pub fn add(&mut self, key: K, value: V) -> Result<()> {
        if self.find(&key).is_some() {
            return Err(Error::DuplicateResource);
        }
        self.entries.push((key, value));
        Ok(())
    }

    pub fn find(&self, key: &K) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn reset(&mut self) {
        self.entries = Vec::new();
    }

    pub fn sort_by_key(&mut self)
    where
        K: Ord,
    {
        self.entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_format() {
        assert_eq!(ResourceName::new(ResourceKind::GraphicState, 3).unwrap().to_string(), "/G3");
        assert_eq!(ResourceName::new(ResourceKind::Pattern, 12).unwrap().to_string(), "/P12");
        assert_eq!(ResourceName::new(ResourceKind::XObject, 1).unwrap().to_string(), "/X1");
        assert_eq!(ResourceName::new(ResourceKind::Font, 40).unwrap().to_string(), "/F40");
    }

    #[test]
    fn index_zero_is_rejected() {
        assert!(matches!(
            ResourceName::new(ResourceKind::XObject, 0),
            Err(Error::InvalidResourceIndex)
        ));
    }

    #[test]
    fn names_order_by_index_then_tag() {
        let x2 = ResourceName::new(ResourceKind::XObject, 2).unwrap();
        let f2 = ResourceName::new(ResourceKind::Font, 2).unwrap();
        let g10 = ResourceName::new(ResourceKind::GraphicState, 10).unwrap();
        let mut names = vec![g10, x2, f2];
        names.sort();
        assert_eq!(names, vec![f2, x2, g10]);
    }

    #[test]
    fn map_keeps_insertion_order() {
        let mut map = ResourceMap::new();
        map.add("b", 1).unwrap();
        map.add("a", 2).unwrap();
        map.add("c", 3).unwrap();
        let keys: Vec<_> = map.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(map.find(&"a"), Some(&2));
        assert_eq!(map.find(&"d"), None);

        map.sort_by_key();
        let keys: Vec<_> = map.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn duplicate_key_is_an_error() {
        let mut map = ResourceMap::new();
        map.add(ImageKey {
            generation_id: 1,
            origin: (0, 0),
            dimensions: (2, 2),
        }, 4)
        .unwrap();
        let err = map.add(
            ImageKey {
                generation_id: 1,
                origin: (0, 0),
                dimensions: (2, 2),
            },
            5,
        );
        assert!(matches!(err, Err(Error::DuplicateResource)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn reset_clears() {
        let mut map = ResourceMap::new();
        map.add(1u32, 1u32).unwrap();
        map.reset();
        assert!(map.is_empty());
        map.add(1, 2).unwrap();
    }
}
