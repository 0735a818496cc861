use crate::store::memory::MemoryStore;
use crate::types::{KeyValue, Record, TableName};

/// Creates `name` keyed by `id` and fills it with `count` records with ids `0..count`.
pub async fn seed_table(store: &MemoryStore, name: &str, count: u64) -> TableName {
    seed_table_with_ids(store, name, 0..count).await
}

/// Creates `name` keyed by `id` and inserts one record per id.
pub async fn seed_table_with_ids<I, K>(store: &MemoryStore, name: &str, ids: I) -> TableName
where
    I: IntoIterator<Item = K>,
    K: Into<KeyValue>,
{
    let table = TableName::new(name);
    store.create_table(table.clone(), "id").await;
    store
        .insert_many(
            &table,
            ids.into_iter()
                .map(|id| Record::new().with("id", id).with("payload", "seeded")),
        )
        .await
        .expect("Failed to seed table");

    table
}
