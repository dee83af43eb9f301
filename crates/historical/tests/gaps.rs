//! Store-backed tests for gap discovery, reservation and convergence. The scenarios share
//! table state, so they run as one sequential test.

mod common;

use common::{empty_block_payload, test_pool};
use indexer_client::test_utils::MockPayloadClient;
use indexer_historical::{BackfillService, GapFinder};
use indexer_primitives::MAINNET;
use indexer_storage::gaps;
use indexer_transform::StateDiffTransformer;
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;

#[tokio::test(flavor = "multi_thread")]
async fn finder_and_dispatchers_converge() {
    let Some(pool) = test_pool().await else { return };
    let client = pool.get().await.unwrap();

    // The scenarios below reason about global table state.
    client.execute("DELETE FROM eth.gaps", &[]).await.unwrap();
    client.execute("DELETE FROM eth.header_cids", &[]).await.unwrap();

    let transformer = Arc::new(StateDiffTransformer::new(MAINNET, pool.clone()));

    // Index headers at {910, 911, 915, 916}, leaving (912, 914) missing.
    for number in [910u64, 911, 915, 916] {
        transformer.transform(1, &empty_block_payload(number)).await.unwrap();
    }

    // Gap discovery finds exactly the missing range, and re-running is a no-op.
    let (_, shutdown_rx) = watch::channel(false);
    let finder = GapFinder::new(pool.clone(), 910, 1, Duration::from_secs(3600), shutdown_rx);
    finder.find_gaps().await.unwrap();

    let row = client
        .query_one("SELECT count(*) FROM eth.gaps WHERE start = 912 AND stop = 914", &[])
        .await
        .unwrap();
    assert_eq!(row.get::<_, i64>(0), 1);

    finder.find_gaps().await.unwrap();
    assert_eq!(gaps::gap_count(&client).await.unwrap(), 1);

    // Two concurrent reservations observe the single gap exactly once.
    {
        let client_a = pool.get().await.unwrap();
        let client_b = pool.get().await.unwrap();
        let (a, b) = tokio::join!(gaps::reserve_gap(&client_a), gaps::reserve_gap(&client_b));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(a.is_some() ^ b.is_some(), "exactly one dispatcher may hold the gap");

        let reserved = a.or(b).unwrap();
        assert_eq!((reserved.start, reserved.stop), (912, 914));

        // Nothing is available while the gap is held.
        assert!(gaps::reserve_gap(&client).await.unwrap().is_none());
        gaps::release_gap(&client, reserved.id).await.unwrap();
    }

    // With payloads available for the missing range, the dispatcher pool drains the queue.
    let node = Arc::new(MockPayloadClient::new());
    for number in 912u64..=914 {
        node.insert(number, empty_block_payload(number));
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let service = BackfillService::new(
        pool.clone(),
        Arc::clone(&node),
        Arc::clone(&transformer),
        2,
        3,
        shutdown_rx,
    );
    let workers = service.spawn();

    let converged = tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            let indexed: i64 = client
                .query_one(
                    "SELECT count(*) FROM eth.header_cids \
                     WHERE block_number BETWEEN 912 AND 914",
                    &[],
                )
                .await
                .unwrap()
                .get(0);
            if indexed == 3 && gaps::gap_count(&client).await.unwrap() == 0 {
                break
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
    .await;
    assert!(converged.is_ok(), "backfill did not converge");

    let _ = shutdown_tx.send(true);
    for worker in workers {
        worker.await.unwrap();
    }
}
