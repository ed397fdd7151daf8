use futures_util::StreamExt;
use serde::de::DeserializeOwned;

/// Reads documents of `collection` as `T` and fails on the first one that does not deserialize.
///
/// With `all == false` only the first document is checked.
pub async fn verify<T>(
    mongo_uri: &str,
    database: &str,
    collection: &str,
    all: bool,
) -> anyhow::Result<usize>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let client = mongodb::Client::with_uri_str(mongo_uri).await?;
    let collection = client.database(database).collection::<T>(collection);
    let mut cursor = collection.find(None, None).await?;

    let mut checked = 0;
    while let Some(document) = cursor.next().await {
        document?;
        checked += 1;
        if !all {
            break;
        }
    }

    log::info!(
        "Verified {} documents of {}.{}",
        checked,
        database,
        collection.name()
    );
    Ok(checked)
}
