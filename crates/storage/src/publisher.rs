//! Content-address publisher.
//!
//! Raw IPLD bytes land in `public.blocks` keyed by their datastore-form multihash. Publishing
//! is enlisted in the caller's transaction and idempotent per key, so re-ingesting a payload
//! is a no-op at the blob layer.

use crate::StorageResult;
use cid::Cid;
use indexer_ipld::{keccak256_cid, multihash_key_from_cid, IpldNode};
use tokio_postgres::Transaction;

const PUBLISH_PG_STR: &str =
    "INSERT INTO public.blocks (key, data) VALUES ($1, $2) ON CONFLICT (key) DO NOTHING";

/// Writes a typed IPLD node's bytes under its multihash key.
pub async fn publish_ipld(tx: &Transaction<'_>, node: &dyn IpldNode) -> StorageResult<()> {
    let key = multihash_key_from_cid(node.cid());
    tx.execute(PUBLISH_PG_STR, &[&key, &node.raw_data()]).await?;
    Ok(())
}

/// Computes the CID of `bytes` under `codec`, writes the bytes under the derived multihash key
/// and returns the string CID together with the key.
pub async fn publish_raw(
    tx: &Transaction<'_>,
    codec: u64,
    bytes: &[u8],
) -> StorageResult<(String, String)> {
    let cid: Cid = keccak256_cid(codec, bytes);
    let mh_key = multihash_key_from_cid(&cid);
    tx.execute(PUBLISH_PG_STR, &[&mh_key, &bytes]).await?;
    Ok((cid.to_string(), mh_key))
}
