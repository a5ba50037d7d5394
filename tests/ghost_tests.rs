//! Ghost recorder / replay unit tests

#[cfg(test)]
mod tests {
    use ghost_sprint::ghost::{GhostRecorder, GhostRecording, GhostSample};
    use ghost_sprint::types::{GhostTuning, Quat, Vec3};

    /// 100ms cadence, 1s cap = 10 samples.
    fn make_recorder() -> GhostRecorder {
        GhostRecorder::new(GhostTuning {
            sample_interval_ms: 100,
            max_duration_ms: 1_000,
        })
    }

    fn sample_at(x: f32) -> (Vec3, Quat) {
        (Vec3::new(x, 0.0, 0.0), Quat::identity())
    }

    // -----------------------------------------------------------------------
    // Sampling cadence
    // -----------------------------------------------------------------------

    #[test]
    fn first_sample_is_always_accepted() {
        let mut r = make_recorder();
        r.start_recording("p1", 1_000);
        let (pos, rot) = sample_at(1.0);
        // Offered immediately, zero elapsed since start.
        assert!(r.record_sample("p1", pos, rot, 1_000));
    }

    #[test]
    fn samples_inside_interval_are_dropped() {
        let mut r = make_recorder();
        r.start_recording("p1", 0);
        let (pos, rot) = sample_at(1.0);
        assert!(r.record_sample("p1", pos, rot, 0));
        assert!(!r.record_sample("p1", pos, rot, 50), "only 50ms elapsed");
        assert!(!r.record_sample("p1", pos, rot, 99));
        assert!(r.record_sample("p1", pos, rot, 100));
    }

    #[test]
    fn rejected_samples_do_not_reset_the_gate() {
        let mut r = make_recorder();
        r.start_recording("p1", 0);
        let (pos, rot) = sample_at(1.0);
        r.record_sample("p1", pos, rot, 0);
        // A burst of rejected offers must not push the next accept out.
        for t in [20, 40, 60, 80] {
            assert!(!r.record_sample("p1", pos, rot, t));
        }
        assert!(r.record_sample("p1", pos, rot, 100));
    }

    #[test]
    fn buffer_caps_at_max_samples() {
        let mut r = make_recorder();
        r.start_recording("p1", 0);
        let (pos, rot) = sample_at(1.0);
        for i in 0..10u64 {
            assert!(r.record_sample("p1", pos, rot, i * 100));
        }
        assert!(!r.record_sample("p1", pos, rot, 5_000), "cap reached");

        let rec = r.stop_recording("p1", 5_000).unwrap();
        assert_eq!(rec.samples.len(), 10);
    }

    #[test]
    fn sampling_without_recording_is_rejected() {
        let mut r = make_recorder();
        let (pos, rot) = sample_at(1.0);
        assert!(!r.record_sample("p1", pos, rot, 0));
    }

    // -----------------------------------------------------------------------
    // Quantization
    // -----------------------------------------------------------------------

    #[test]
    fn stored_samples_are_quantized() {
        let mut r = make_recorder();
        r.start_recording("p1", 0);
        r.record_sample(
            "p1",
            Vec3::new(1.23456, 7.89012, -3.456),
            Quat::new(0.99999, 0.0001, 0.0, 0.0),
            0,
        );
        let rec = r.stop_recording("p1", 100).unwrap();

        // Positions to 2 decimals, orientations to 3.
        assert_eq!(rec.samples[0].position, Vec3::new(1.23, 7.89, -3.46));
        assert_eq!(rec.samples[0].orientation, Quat::new(1.0, 0.0, 0.0, 0.0));
    }

    // -----------------------------------------------------------------------
    // Stop / cancel
    // -----------------------------------------------------------------------

    #[test]
    fn stop_reports_duration_from_start() {
        let mut r = make_recorder();
        r.start_recording("p1", 2_000);
        let (pos, rot) = sample_at(1.0);
        r.record_sample("p1", pos, rot, 2_000);

        let rec = r.stop_recording("p1", 5_500).unwrap();
        assert_eq!(rec.time_ms, 3_500);
        assert!(!r.is_recording("p1"));
    }

    #[test]
    fn empty_recording_yields_none() {
        let mut r = make_recorder();
        r.start_recording("p1", 0);
        assert!(r.stop_recording("p1", 1_000).is_none());
        assert!(r.stop_recording("unknown", 1_000).is_none());
    }

    #[test]
    fn cancel_discards_samples() {
        let mut r = make_recorder();
        r.start_recording("p1", 0);
        let (pos, rot) = sample_at(1.0);
        r.record_sample("p1", pos, rot, 0);
        r.cancel_recording("p1");
        assert!(!r.is_recording("p1"));
        assert!(r.stop_recording("p1", 1_000).is_none());
    }

    // -----------------------------------------------------------------------
    // Replay
    // -----------------------------------------------------------------------

    fn three_sample_recording() -> GhostRecording {
        GhostRecording {
            samples: (0..3)
                .map(|i| GhostSample {
                    position: Vec3::new(i as f32, 0.0, 0.0),
                    orientation: Quat::identity(),
                })
                .collect(),
            time_ms: 300,
        }
    }

    #[test]
    fn replay_advances_with_session_time() {
        let mut r = make_recorder();
        r.spawn_replay("p1", three_sample_recording(), 0);

        // Cursor starts on sample 0; no frame until the target moves.
        assert!(r.tick_replays(50).is_empty());

        let frames = r.tick_replays(100);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].position, Vec3::new(1.0, 0.0, 0.0));

        let frames = r.tick_replays(250);
        assert_eq!(frames[0].position, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn replay_loops_by_snapping_to_start() {
        let mut r = make_recorder();
        r.spawn_replay("p1", three_sample_recording(), 0);
        r.tick_replays(200);

        // Past the last sample: the replay resets, emitting nothing this tick.
        assert!(r.tick_replays(300).is_empty());

        // Next lap runs from the new start time.
        let frames = r.tick_replays(400);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].position, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn empty_recording_is_not_spawned() {
        let mut r = make_recorder();
        r.spawn_replay(
            "p1",
            GhostRecording {
                samples: vec![],
                time_ms: 0,
            },
            0,
        );
        assert_eq!(r.replay_count(), 0);
    }

    #[test]
    fn spawn_replaces_existing_replay() {
        let mut r = make_recorder();
        r.spawn_replay("p1", three_sample_recording(), 0);
        r.spawn_replay("p1", three_sample_recording(), 0);
        assert_eq!(r.replay_count(), 1);
    }

    #[test]
    fn despawn_all_clears_replays() {
        let mut r = make_recorder();
        r.spawn_replay("p1", three_sample_recording(), 0);
        r.spawn_replay("p2", three_sample_recording(), 0);
        r.despawn_all_replays();
        assert_eq!(r.replay_count(), 0);
        assert!(r.tick_replays(1_000).is_empty());
    }
}
