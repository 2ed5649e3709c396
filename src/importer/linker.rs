use crate::domain::LinkRecord;
use crate::error::Result;
use crate::storage::DataStore;
use tracing::debug;

/// Writes junction rows between already-resolved entities, suppressing
/// duplicates with an explicit existence check rather than relying on the
/// store to classify constraint violations.
pub struct RelationshipLinker<'a> {
    store: &'a dyn DataStore,
}

impl<'a> RelationshipLinker<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    /// Insert the link unless the (type, a, b) pair already exists. An
    /// existing pair is success: the desired end state already holds.
    pub async fn ensure(&self, link: LinkRecord) -> Result<()> {
        if self
            .store
            .link_exists(link.link_type, link.id_a, link.id_b)
            .await?
        {
            debug!(link_type = ?link.link_type, id_a = %link.id_a, id_b = %link.id_b, "link already present");
            return Ok(());
        }
        self.store.create_link(link).await
    }
}
