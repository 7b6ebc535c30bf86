use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a placed reactor in a [`crate::world::ReactorWorld`].
    pub struct ReactorId;
}

/// Identifies a reactor block type in the registry. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockTypeId(pub u32);
