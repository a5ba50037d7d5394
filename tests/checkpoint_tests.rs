//! Checkpoint tracker unit tests

#[cfg(test)]
mod tests {
    use ghost_sprint::checkpoint::{is_near, CheckpointTracker};
    use ghost_sprint::course::{CourseDefinition, ModifierMode};
    use ghost_sprint::types::Vec3;

    /// Tiny straight-line course: start at origin, two checkpoints, finish.
    fn make_course() -> CourseDefinition {
        CourseDefinition {
            id: "test".into(),
            name: "Test Track".into(),
            lobby_spawn: Vec3::new(0.0, 10.0, 10.0),
            start_pad_position: Vec3::zero(),
            start_pad_size: Vec3::new(4.0, 1.0, 4.0),
            finish_gate_position: Vec3::new(30.0, 0.0, 0.0),
            finish_gate_size: Vec3::new(4.0, 4.0, 2.0),
            checkpoint_positions: vec![Vec3::new(10.0, 0.0, 0.0), Vec3::new(20.0, 0.0, 0.0)],
            checkpoint_size: Vec3::new(4.0, 4.0, 4.0),
            out_of_bounds_y: -5.0,
            start_trigger_radius: 2.0,
            checkpoint_trigger_radius: 2.0,
            finish_trigger_radius: 2.0,
            modifier_mode: ModifierMode::Random,
            fixed_modifier_id: None,
        }
    }

    fn make_tracker() -> CheckpointTracker {
        let mut t = CheckpointTracker::new(make_course(), 2.0);
        t.reset_player("p1");
        t
    }

    // -----------------------------------------------------------------------
    // Proximity predicate
    // -----------------------------------------------------------------------

    #[test]
    fn boundary_is_exclusive() {
        let target = Vec3::zero();
        assert!(is_near(Vec3::new(1.9, 0.0, 0.0), target, 2.0));
        assert!(
            !is_near(Vec3::new(2.0, 0.0, 0.0), target, 2.0),
            "exactly on the radius must not trigger"
        );
        assert!(!is_near(Vec3::new(2.1, 0.0, 0.0), target, 2.0));
    }

    // -----------------------------------------------------------------------
    // Start pad
    // -----------------------------------------------------------------------

    #[test]
    fn start_pad_begins_run_once() {
        let mut t = make_tracker();
        assert!(t.check_start_pad("p1", Vec3::new(1.0, 0.0, 0.0)));
        assert!(
            !t.check_start_pad("p1", Vec3::new(1.0, 0.0, 0.0)),
            "already started"
        );
        let state = t.player_state("p1").unwrap();
        assert!(state.started);
        assert!(!state.finished);
    }

    #[test]
    fn untracked_player_never_starts() {
        let mut t = make_tracker();
        assert!(!t.check_start_pad("ghost", Vec3::zero()));
    }

    // -----------------------------------------------------------------------
    // Checkpoint ordering
    // -----------------------------------------------------------------------

    #[test]
    fn checkpoints_advance_sequentially() {
        let mut t = make_tracker();
        t.check_start_pad("p1", Vec3::zero());

        assert_eq!(t.check_checkpoints("p1", Vec3::new(10.0, 0.0, 0.0)), Some(0));
        assert_eq!(t.check_checkpoints("p1", Vec3::new(20.0, 0.0, 0.0)), Some(1));
        assert_eq!(t.player_state("p1").unwrap().next_checkpoint, 2);
    }

    #[test]
    fn later_checkpoint_does_not_advance_index() {
        let mut t = make_tracker();
        t.check_start_pad("p1", Vec3::zero());

        // Standing on checkpoint 1 while checkpoint 0 is still pending.
        assert_eq!(t.check_checkpoints("p1", Vec3::new(20.0, 0.0, 0.0)), None);
        assert_eq!(t.player_state("p1").unwrap().next_checkpoint, 0);
    }

    #[test]
    fn checkpoints_require_started_run() {
        let mut t = make_tracker();
        assert_eq!(t.check_checkpoints("p1", Vec3::new(10.0, 0.0, 0.0)), None);
    }

    #[test]
    fn checkpoint_updates_respawn_position() {
        let mut t = make_tracker();
        t.check_start_pad("p1", Vec3::zero());
        t.check_checkpoints("p1", Vec3::new(10.0, 0.0, 0.0));

        // Raised by the 2.0 spawn offset above the checkpoint.
        assert_eq!(t.respawn_position("p1"), Vec3::new(10.0, 2.0, 0.0));
    }

    // -----------------------------------------------------------------------
    // Finish gate
    // -----------------------------------------------------------------------

    #[test]
    fn finish_requires_all_checkpoints() {
        let mut t = make_tracker();
        t.check_start_pad("p1", Vec3::zero());
        t.check_checkpoints("p1", Vec3::new(10.0, 0.0, 0.0));

        assert_eq!(
            t.check_finish("p1", Vec3::new(30.0, 0.0, 0.0)),
            None,
            "one checkpoint still pending"
        );

        t.check_checkpoints("p1", Vec3::new(20.0, 0.0, 0.0));
        assert_eq!(t.check_finish("p1", Vec3::new(30.0, 0.0, 0.0)), Some(0));
        assert!(t.player_state("p1").unwrap().finished);
    }

    #[test]
    fn finish_fires_once_and_reports_respawns() {
        let mut t = make_tracker();
        t.check_start_pad("p1", Vec3::zero());
        t.check_checkpoints("p1", Vec3::new(10.0, 0.0, 0.0));
        t.check_out_of_bounds("p1", Vec3::new(10.0, -6.0, 0.0));
        t.check_checkpoints("p1", Vec3::new(20.0, 0.0, 0.0));

        assert_eq!(t.check_finish("p1", Vec3::new(30.0, 0.0, 0.0)), Some(1));
        assert_eq!(t.check_finish("p1", Vec3::new(30.0, 0.0, 0.0)), None);
    }

    // -----------------------------------------------------------------------
    // Out of bounds
    // -----------------------------------------------------------------------

    #[test]
    fn repeated_falls_accumulate_respawns() {
        let mut t = make_tracker();
        t.check_start_pad("p1", Vec3::zero());

        for expected in 1..=3u32 {
            assert!(t.check_out_of_bounds("p1", Vec3::new(0.0, -6.0, 0.0)));
            assert_eq!(t.player_state("p1").unwrap().respawns, expected);
        }
        assert!(!t.check_out_of_bounds("p1", Vec3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn out_of_bounds_triggers_even_before_start() {
        // A player idling off the pad can still fall off the map.
        let mut t = make_tracker();
        assert!(t.check_out_of_bounds("p1", Vec3::new(0.0, -6.0, 0.0)));
    }

    #[test]
    fn respawn_position_defaults_to_raised_start_pad() {
        let t = make_tracker();
        assert_eq!(t.respawn_position("p1"), Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(t.respawn_position("unknown"), Vec3::new(0.0, 2.0, 0.0));
    }

    // -----------------------------------------------------------------------
    // Listeners
    // -----------------------------------------------------------------------

    #[test]
    fn finish_listener_receives_respawn_count() {
        use std::sync::{Arc, Mutex};

        let mut t = make_tracker();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        t.on_finish(move |id, respawns| s.lock().unwrap().push((id.to_string(), respawns)));

        t.check_start_pad("p1", Vec3::zero());
        t.check_out_of_bounds("p1", Vec3::new(0.0, -6.0, 0.0));
        t.check_checkpoints("p1", Vec3::new(10.0, 0.0, 0.0));
        t.check_checkpoints("p1", Vec3::new(20.0, 0.0, 0.0));
        t.check_finish("p1", Vec3::new(30.0, 0.0, 0.0));

        assert_eq!(seen.lock().unwrap().as_slice(), &[("p1".to_string(), 1)]);
    }
}
