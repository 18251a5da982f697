use crate::allocator::MapAllocator;
use crate::policy::KeyEqual;
use crate::DenseHashMap;

use serde::de::{Deserialize, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserializer;

use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;

// Upper bound on entries reserved from an untrusted size hint.
const MAX_PREALLOCATED: usize = 4096;

pub struct DenseHashMapVisitor<K, V, S, E, A: MapAllocator> {
    #[allow(clippy::type_complexity)]
    marker: PhantomData<fn() -> DenseHashMap<K, V, S, E, A>>,
}

impl<K, V, S, E, A: MapAllocator> DenseHashMapVisitor<K, V, S, E, A> {
    fn new() -> Self {
        DenseHashMapVisitor {
            marker: PhantomData,
        }
    }
}

impl<'de, K, V, S, E, A> Visitor<'de> for DenseHashMapVisitor<K, V, S, E, A>
where
    K: Deserialize<'de> + Hash,
    V: Deserialize<'de>,
    S: BuildHasher + Default,
    E: KeyEqual<K> + Default,
    A: MapAllocator + Default,
{
    type Value = DenseHashMap<K, V, S, E, A>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a DenseHashMap")
    }

    fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut map = DenseHashMap::default();
        map.reserve(access.size_hint().unwrap_or(0).min(MAX_PREALLOCATED));

        // Later duplicates win, matching how the pairs were written.
        while let Some((key, value)) = access.next_entry()? {
            map.insert_or_assign(key, value);
        }

        Ok(map)
    }
}

impl<'de, K, V, S, E, A> Deserialize<'de> for DenseHashMap<K, V, S, E, A>
where
    K: Deserialize<'de> + Hash,
    V: Deserialize<'de>,
    S: BuildHasher + Default,
    E: KeyEqual<K> + Default,
    A: MapAllocator + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(DenseHashMapVisitor::<K, V, S, E, A>::new())
    }
}

/// Entries are written in dense order.
impl<K, V, S, E, A> Serialize for DenseHashMap<K, V, S, E, A>
where
    K: Serialize,
    V: Serialize,
    A: MapAllocator,
{
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use crate::DenseHashMap;
    use serde_test::{assert_de_tokens, assert_tokens, Token};

    #[test]
    fn tokens_follow_dense_order() {
        let mut m: DenseHashMap<u32, &str> = DenseHashMap::new();
        m.insert(7, "seven");
        m.insert(3, "three");
        assert_tokens(
            &m,
            &[
                Token::Map { len: Some(2) },
                Token::U32(7),
                Token::BorrowedStr("seven"),
                Token::U32(3),
                Token::BorrowedStr("three"),
                Token::MapEnd,
            ],
        );
    }

    #[test]
    fn duplicate_keys_keep_the_last_value() {
        let expected: DenseHashMap<u32, u32> = [(1, 20)].into();
        assert_de_tokens(
            &expected,
            &[
                Token::Map { len: Some(2) },
                Token::U32(1),
                Token::U32(10),
                Token::U32(1),
                Token::U32(20),
                Token::MapEnd,
            ],
        );
    }
}
