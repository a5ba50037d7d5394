//! Leaderboard store tests (in-memory backend)

#[cfg(test)]
mod tests {
    use ghost_sprint::leaderboard::{LeaderboardStore, MAX_ENTRIES, TOP_DISPLAY};
    use ghost_sprint::storage::{DurableStorage, MemoryStorage};
    use std::sync::Arc;
    use tokio_test::block_on;

    fn make_store() -> (Arc<MemoryStorage>, LeaderboardStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store =
            LeaderboardStore::new(Arc::clone(&storage) as Arc<dyn DurableStorage>, "course1");
        (storage, store)
    }

    // -----------------------------------------------------------------------
    // Ranking
    // -----------------------------------------------------------------------

    #[test]
    fn faster_times_rank_higher() {
        let (_, mut store) = make_store();
        block_on(async {
            assert_eq!(store.submit("p1", "Alice", 5_000).await, Some(1));
            assert_eq!(store.submit("p2", "Bob", 3_000).await, Some(1));

            assert_eq!(store.get_player_rank("p1"), Some(2));
            assert_eq!(store.get_player_rank("p2"), Some(1));
            assert_eq!(store.get_player_time("p1"), Some(5_000));
            assert_eq!(store.get_player_rank("nobody"), None);
        });
    }

    #[test]
    fn resubmission_always_replaces_the_entry() {
        let (_, mut store) = make_store();
        block_on(async {
            store.submit("p1", "Alice", 2_000).await;
            store.submit("p2", "Bob", 3_000).await;

            // Even a slower run replaces the old time.
            assert_eq!(store.submit("p1", "Alice", 9_000).await, Some(2));
            assert_eq!(store.get_player_time("p1"), Some(9_000));
            assert_eq!(store.entries().len(), 2, "one entry per player");
        });
    }

    #[test]
    fn ties_keep_both_entries() {
        let (_, mut store) = make_store();
        block_on(async {
            store.submit("p1", "Alice", 4_000).await;
            store.submit("p2", "Bob", 4_000).await;
            assert_eq!(store.entries().len(), 2);
        });
    }

    // -----------------------------------------------------------------------
    // Capacity
    // -----------------------------------------------------------------------

    #[test]
    fn board_caps_at_fifty_evicting_the_slowest() {
        let (_, mut store) = make_store();
        block_on(async {
            for i in 0..MAX_ENTRIES as u64 {
                let id = format!("p{}", i);
                store.submit(&id, &id, 10_000 + i * 100).await;
            }
            assert_eq!(store.entries().len(), MAX_ENTRIES);

            // A new fast entry takes rank 1 and pushes the slowest off.
            assert_eq!(store.submit("speedster", "Speedster", 1_000).await, Some(1));
            assert_eq!(store.entries().len(), MAX_ENTRIES);
            assert_eq!(store.get_player_rank("p49"), None, "slowest evicted");
        });
    }

    #[test]
    fn too_slow_for_a_full_board_misses_out() {
        let (_, mut store) = make_store();
        block_on(async {
            for i in 0..MAX_ENTRIES as u64 {
                let id = format!("p{}", i);
                store.submit(&id, &id, 10_000 + i * 100).await;
            }
            assert_eq!(store.submit("slowpoke", "Slowpoke", 99_000).await, None);
        });
    }

    #[test]
    fn top10_is_a_display_slice() {
        let (_, mut store) = make_store();
        block_on(async {
            for i in 0..15u64 {
                let id = format!("p{}", i);
                store.submit(&id, &id, 1_000 + i).await;
            }
            assert_eq!(store.top10().len(), TOP_DISPLAY);
            assert_eq!(store.top10()[0].player_id, "p0");
        });
    }

    // -----------------------------------------------------------------------
    // Persistence / course scoping
    // -----------------------------------------------------------------------

    #[test]
    fn board_survives_a_reload() {
        let (storage, mut store) = make_store();
        block_on(async {
            store.submit("p1", "Alice", 5_000).await;
            store.submit("p2", "Bob", 3_000).await;

            let mut other =
                LeaderboardStore::new(storage as Arc<dyn DurableStorage>, "course1");
            other.load().await;
            assert_eq!(other.entries().len(), 2);
            assert_eq!(other.get_player_rank("p2"), Some(1));
            assert_eq!(other.entries()[0].username, "Bob");
        });
    }

    #[test]
    fn course_switch_clears_the_cached_board() {
        let (_, mut store) = make_store();
        block_on(async {
            store.submit("p1", "Alice", 5_000).await;

            store.set_course_id("course2");
            assert!(store.entries().is_empty());
            store.load().await;
            assert!(store.entries().is_empty(), "other course has no times");

            store.set_course_id("course1");
            store.load().await;
            assert_eq!(store.get_player_rank("p1"), Some(1));
        });
    }

    #[test]
    fn missing_blob_loads_as_empty() {
        let (_, mut store) = make_store();
        block_on(async {
            store.load().await;
            assert!(store.entries().is_empty());
            assert!(store.top10().is_empty());
        });
    }
}
