/// A decoded bencode value.
///
/// Byte strings are owned copies of the source buffer, so a tree outlives the
/// buffer it was decoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bencode {
    Int(i64),
    Bytes(Vec<u8>),
    List(Vec<Bencode>),
    Dict(Dict),
}

impl Bencode {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Bencode::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Bencode::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the byte string as text when it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Bencode::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Dictionary lookup; `None` for missing keys and non-dictionary values.
    pub fn get(&self, key: &[u8]) -> Option<&Bencode> {
        self.as_dict().and_then(|d| d.get(key))
    }
}

/// A bencode dictionary in the order its entries were decoded.
///
/// Keys are not checked for uniqueness. When a key repeats, lookups see the
/// last entry, which is also the one that survives conversion to a map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dict {
    entries: Vec<(Vec<u8>, Bencode)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: Vec<u8>, value: Bencode) {
        self.entries.push((key, value));
    }

    pub fn get(&self, key: &[u8]) -> Option<&Bencode> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k.as_slice() == key)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in decode order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &Bencode)> {
        self.entries.iter().map(|(k, v)| (k.as_slice(), v))
    }

    /// Entries ordered by key bytes, keeping only the last entry for a repeated key.
    pub fn sorted(&self) -> Vec<(&[u8], &Bencode)> {
        let mut map = std::collections::BTreeMap::new();
        for (k, v) in self.iter() {
            map.insert(k, v);
        }
        map.into_iter().collect()
    }
}

impl FromIterator<(Vec<u8>, Bencode)> for Dict {
    fn from_iter<I: IntoIterator<Item = (Vec<u8>, Bencode)>>(iter: I) -> Self {
        Dict {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dict_keeps_decode_order() {
        let dict: Dict = vec![
            (b"zeta".to_vec(), Bencode::Int(1)),
            (b"alpha".to_vec(), Bencode::Int(2)),
        ]
        .into_iter()
        .collect();

        let keys: Vec<&[u8]> = dict.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![&b"zeta"[..], &b"alpha"[..]]);

        let sorted: Vec<&[u8]> = dict.sorted().into_iter().map(|(k, _)| k).collect();
        assert_eq!(sorted, vec![&b"alpha"[..], &b"zeta"[..]]);
    }

    #[test]
    fn test_repeated_key_last_wins() {
        let mut dict = Dict::new();
        dict.insert(b"k".to_vec(), Bencode::Int(1));
        dict.insert(b"k".to_vec(), Bencode::Int(2));

        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get(b"k"), Some(&Bencode::Int(2)));
        assert_eq!(dict.sorted(), vec![(&b"k"[..], &Bencode::Int(2))]);
    }

    #[test]
    fn test_accessors() {
        let value = Bencode::Dict(
            vec![(b"name".to_vec(), Bencode::Bytes(b"test".to_vec()))]
                .into_iter()
                .collect(),
        );
        assert_eq!(value.get(b"name").and_then(Bencode::as_str), Some("test"));
        assert!(value.get(b"missing").is_none());
        assert!(Bencode::Int(3).get(b"name").is_none());
        assert_eq!(Bencode::Int(3).as_int(), Some(3));
        assert!(Bencode::Bytes(vec![0xff]).as_str().is_none());
    }
}
