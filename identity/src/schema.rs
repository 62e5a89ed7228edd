//! Attribute layout shared by the hasher, the circuit and the witness builder.

use core::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{IdentityError, IdentityResult};
use crate::field::Felt;

/// Slot names of the identity schema, in hashing order.
pub const IDENTITY_SLOTS: [&str; IDENTITY_SLOT_COUNT] = [
    "owner",
    "is_github",
    "github_stars",
    "is_twitter",
    "twitter_followers",
    "total_staked",
    "balance",
    "txn_frequency",
    "last_updated",
];

pub const IDENTITY_SLOT_COUNT: usize = 9;

const SCHEMA_DIGEST_CONTEXT: &str = "identity-zk 2025 attribute schema";

/// An ordered list of named attribute slots.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeSchema {
    name: String,
    slots: Vec<String>,
}

impl AttributeSchema {
    /// The nine-slot identity schema.
    pub fn identity() -> Self {
        Self {
            name: "identity".into(),
            slots: IDENTITY_SLOTS.iter().map(|slot| (*slot).to_owned()).collect(),
        }
    }

    /// Declares a custom schema. Slot names must be non-empty and unique.
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        slots: impl IntoIterator<Item = S>,
    ) -> IdentityResult<Self> {
        let slots: Vec<String> = slots.into_iter().map(Into::into).collect();
        if slots.is_empty() {
            return Err(IdentityError::arity(1, 0));
        }
        for (index, slot) in slots.iter().enumerate() {
            if slot.is_empty() {
                return Err(IdentityError::InvalidAttribute(format!(
                    "slot {index} has an empty name"
                )));
            }
            if slots[..index].contains(slot) {
                return Err(IdentityError::InvalidAttribute(format!(
                    "slot `{slot}` is declared twice"
                )));
            }
        }
        Ok(Self {
            name: name.into(),
            slots,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn index_of(&self, slot: &str) -> Option<usize> {
        self.slots.iter().position(|s| s == slot)
    }

    /// BLAKE3 digest over the schema name and the ordered slot names.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new_derive_key(SCHEMA_DIGEST_CONTEXT);
        hasher.update(&(self.name.len() as u64).to_le_bytes());
        hasher.update(self.name.as_bytes());
        for slot in &self.slots {
            hasher.update(&(slot.len() as u64).to_le_bytes());
            hasher.update(slot.as_bytes());
        }
        *hasher.finalize().as_bytes()
    }

    pub fn builder(&self) -> AttributeTupleBuilder<'_> {
        AttributeTupleBuilder {
            schema: self,
            values: vec![None; self.len()],
        }
    }
}

/// Attribute values in schema order. Wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AttributeTuple {
    values: Vec<Felt>,
    schema_digest: [u8; 32],
}

impl AttributeTuple {
    /// Wraps `values`, which must already be in the order of `schema`.
    pub fn new(schema: &AttributeSchema, values: Vec<Felt>) -> IdentityResult<Self> {
        if values.len() != schema.len() {
            return Err(IdentityError::arity(schema.len(), values.len()));
        }
        Ok(Self {
            values,
            schema_digest: schema.digest(),
        })
    }

    pub fn values(&self) -> &[Felt] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn schema_digest(&self) -> &[u8; 32] {
        &self.schema_digest
    }

    pub fn get(&self, schema: &AttributeSchema, slot: &str) -> Option<Felt> {
        self.ensure_schema(schema).ok()?;
        schema.index_of(slot).map(|index| self.values[index])
    }

    /// Copy of the tuple with one slot replaced.
    pub fn with_value(
        &self,
        schema: &AttributeSchema,
        slot: &str,
        value: impl Into<Felt>,
    ) -> IdentityResult<Self> {
        self.ensure_schema(schema)?;
        let index = schema
            .index_of(slot)
            .ok_or_else(|| IdentityError::InvalidAttribute(format!("unknown slot `{slot}`")))?;
        let mut updated = self.clone();
        updated.values[index] = value.into();
        Ok(updated)
    }

    pub(crate) fn ensure_schema(&self, schema: &AttributeSchema) -> IdentityResult<()> {
        if self.values.len() != schema.len() {
            return Err(IdentityError::arity(schema.len(), self.values.len()));
        }
        if self.schema_digest != schema.digest() {
            return Err(IdentityError::mismatch(format!(
                "attributes were not built for schema `{}`",
                schema.name()
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for AttributeTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeTuple")
            .field("slots", &self.values.len())
            .finish_non_exhaustive()
    }
}

/// Slot-by-name builder for [`AttributeTuple`].
///
/// ```
/// use identity_zk::AttributeSchema;
///
/// let schema = AttributeSchema::new("pair", ["a", "b"]).unwrap();
/// let tuple = schema
///     .builder()
///     .set("b", 2u64)
///     .and_then(|b| b.set("a", true))
///     .and_then(|b| b.build())
///     .unwrap();
/// assert_eq!(tuple.len(), 2);
/// ```
pub struct AttributeTupleBuilder<'a> {
    schema: &'a AttributeSchema,
    values: Vec<Option<Felt>>,
}

impl AttributeTupleBuilder<'_> {
    pub fn set(mut self, slot: &str, value: impl Into<Felt>) -> IdentityResult<Self> {
        let index = self
            .schema
            .index_of(slot)
            .ok_or_else(|| IdentityError::InvalidAttribute(format!("unknown slot `{slot}`")))?;
        self.values[index] = Some(value.into());
        Ok(self)
    }

    pub fn build(mut self) -> IdentityResult<AttributeTuple> {
        let mut values = Vec::with_capacity(self.values.len());
        for (slot, value) in self.schema.slots().iter().zip(self.values.iter_mut()) {
            match value.take() {
                Some(value) => values.push(value),
                None => {
                    values.zeroize();
                    return Err(IdentityError::InvalidAttribute(format!(
                        "slot `{slot}` was never set"
                    )));
                }
            }
        }
        AttributeTuple::new(self.schema, values)
    }
}

impl Drop for AttributeTupleBuilder<'_> {
    fn drop(&mut self) {
        for value in self.values.iter_mut().flatten() {
            value.zeroize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_schema_order() {
        let schema = AttributeSchema::identity();
        assert_eq!(schema.len(), IDENTITY_SLOT_COUNT);
        assert_eq!(schema.index_of("owner"), Some(0));
        assert_eq!(schema.index_of("github_stars"), Some(2));
        assert_eq!(schema.index_of("last_updated"), Some(8));
        assert_eq!(schema.index_of("nickname"), None);
    }

    #[test]
    fn schema_rejects_duplicates_and_empty() {
        assert!(matches!(
            AttributeSchema::new("dup", ["a", "a"]),
            Err(IdentityError::InvalidAttribute(_))
        ));
        assert!(matches!(
            AttributeSchema::new("none", Vec::<String>::new()),
            Err(IdentityError::InvalidArity { .. })
        ));
    }

    #[test]
    fn digest_depends_on_order() {
        let ab = AttributeSchema::new("s", ["a", "b"]).unwrap();
        let ba = AttributeSchema::new("s", ["b", "a"]).unwrap();
        assert_ne!(ab.digest(), ba.digest());
        assert_eq!(ab.digest(), ab.clone().digest());
    }

    #[test]
    fn builder_places_values_by_slot() {
        let schema = AttributeSchema::new("pair", ["x", "y"]).unwrap();
        let tuple = schema
            .builder()
            .set("y", 7u64)
            .unwrap()
            .set("x", 3u64)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(tuple.values(), &[Felt::from_u64(3), Felt::from_u64(7)]);
        assert_eq!(tuple.get(&schema, "y"), Some(Felt::from_u64(7)));
    }

    #[test]
    fn builder_rejects_unknown_and_missing_slots() {
        let schema = AttributeSchema::new("pair", ["x", "y"]).unwrap();
        assert!(matches!(
            schema.builder().set("z", 1u64),
            Err(IdentityError::InvalidAttribute(_))
        ));
        assert!(matches!(
            schema.builder().set("x", 1u64).unwrap().build(),
            Err(IdentityError::InvalidAttribute(_))
        ));
    }

    #[test]
    fn tuple_arity_is_checked() {
        let schema = AttributeSchema::identity();
        assert_eq!(
            AttributeTuple::new(&schema, vec![Felt::ONE; 8]),
            Err(IdentityError::InvalidArity {
                expected: 9,
                actual: 8
            })
        );
    }

    #[test]
    fn tuple_is_bound_to_its_schema() {
        let pair = AttributeSchema::new("pair", ["x", "y"]).unwrap();
        let other = AttributeSchema::new("other", ["x", "y"]).unwrap();
        let tuple = AttributeTuple::new(&pair, vec![Felt::ONE, Felt::ZERO]).unwrap();
        assert!(tuple.ensure_schema(&pair).is_ok());
        assert!(matches!(
            tuple.ensure_schema(&other),
            Err(IdentityError::KeyCircuitMismatch(_))
        ));
    }

    #[test]
    fn debug_hides_values() {
        let schema = AttributeSchema::identity();
        let tuple = AttributeTuple::new(&schema, vec![Felt::from_u64(424242); 9]).unwrap();
        let rendered = format!("{tuple:?}");
        assert!(!rendered.contains("424242"));
        assert!(!rendered.contains("67932"));
    }
}
