use crate::model::Record;
use crate::store::GraphStore;
use crate::GraphError;

/// Run generated query text verbatim and collect every row.
///
/// The text is not validated; a malformed query surfaces as the store's
/// [`GraphError::Query`].
pub async fn execute_query<S: GraphStore + ?Sized>(
    store: &S,
    cypher: &str,
) -> Result<Vec<Record>, GraphError> {
    tracing::debug!(query = %cypher, "executing generated query");
    let records = store.execute(cypher).await?;
    tracing::debug!(rows = records.len(), "query finished");
    Ok(records)
}
