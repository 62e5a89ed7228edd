//! Typed ingestion of identity records.

use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, IdentityResult};
use crate::field::Felt;
use crate::schema::{AttributeSchema, AttributeTuple};

/// A raw identity record as it arrives from an attestation request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Hex-encoded owner address, `0x` prefix optional.
    pub owner: String,
    pub is_github: bool,
    pub github_stars: u64,
    pub is_twitter: bool,
    pub twitter_followers: u64,
    pub total_staked: u64,
    pub balance: u64,
    pub txn_frequency: u64,
    pub last_updated: u64,
}

impl IdentityRecord {
    /// Converts the record into a tuple laid out by `schema`.
    ///
    /// Every slot of `schema` must name a record field.
    pub fn to_attributes(&self, schema: &AttributeSchema) -> IdentityResult<AttributeTuple> {
        let owner = Felt::from_hex(self.owner.trim())?;
        let mut builder = schema.builder();
        for slot in schema.slots() {
            let value = match slot.as_str() {
                "owner" => owner,
                "is_github" => Felt::from_bool(self.is_github),
                "github_stars" => Felt::from_u64(self.github_stars),
                "is_twitter" => Felt::from_bool(self.is_twitter),
                "twitter_followers" => Felt::from_u64(self.twitter_followers),
                "total_staked" => Felt::from_u64(self.total_staked),
                "balance" => Felt::from_u64(self.balance),
                "txn_frequency" => Felt::from_u64(self.txn_frequency),
                "last_updated" => Felt::from_u64(self.last_updated),
                other => {
                    return Err(IdentityError::InvalidAttribute(format!(
                        "identity records have no field `{other}`"
                    )))
                }
            };
            builder = builder.set(slot, value)?;
        }
        builder.build()
    }
}
