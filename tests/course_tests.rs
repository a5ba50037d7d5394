//! Course catalog, rotation, and cosmetics tests

#[cfg(test)]
mod tests {
    use ghost_sprint::cosmetics::{CosmeticCatalog, CosmeticKind};
    use ghost_sprint::course::{
        CourseCatalog, CourseDefinition, CourseError, CourseRotation, ModifierMode,
    };
    use ghost_sprint::types::Vec3;

    fn make_course(id: &str) -> CourseDefinition {
        CourseDefinition {
            id: id.into(),
            name: "Fixture".into(),
            lobby_spawn: Vec3::new(0.0, 10.0, 0.0),
            start_pad_position: Vec3::new(0.0, 5.0, 0.0),
            start_pad_size: Vec3::new(4.0, 1.0, 4.0),
            finish_gate_position: Vec3::new(0.0, 5.0, -50.0),
            finish_gate_size: Vec3::new(4.0, 4.0, 2.0),
            checkpoint_positions: vec![Vec3::new(0.0, 6.0, -25.0)],
            checkpoint_size: Vec3::new(4.0, 4.0, 4.0),
            out_of_bounds_y: -10.0,
            start_trigger_radius: 3.0,
            checkpoint_trigger_radius: 3.0,
            finish_trigger_radius: 3.0,
            modifier_mode: ModifierMode::Random,
            fixed_modifier_id: None,
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    #[test]
    fn builtin_courses_validate() {
        for course in CourseCatalog::builtin().courses() {
            assert!(
                course.validate().is_ok(),
                "builtin course {} failed validation",
                course.id
            );
        }
    }

    #[test]
    fn empty_checkpoint_list_is_rejected() {
        let mut course = make_course("bad");
        course.checkpoint_positions.clear();
        assert!(matches!(course.validate(), Err(CourseError::NoCheckpoints(_))));
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        let mut course = make_course("bad");
        course.checkpoint_trigger_radius = 0.0;
        assert!(course.validate().is_err());
    }

    #[test]
    fn out_of_bounds_must_sit_below_the_course() {
        let mut course = make_course("bad");
        // OOB above the gates would respawn players standing still.
        course.out_of_bounds_y = 100.0;
        assert!(course.validate().is_err());
    }

    #[test]
    fn duplicate_course_ids_are_rejected() {
        let err = CourseCatalog::new(vec![make_course("dup"), make_course("dup")]);
        assert!(matches!(err, Err(CourseError::DuplicateId(_))));
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(matches!(
            CourseCatalog::new(vec![]),
            Err(CourseError::EmptyCatalog)
        ));
    }

    // -----------------------------------------------------------------------
    // Rotation
    // -----------------------------------------------------------------------

    #[test]
    fn rotation_cycles_and_wraps() {
        let catalog = CourseCatalog::new(vec![make_course("a"), make_course("b")]).unwrap();
        let mut rotation = CourseRotation::new(catalog);

        assert_eq!(rotation.active().id, "a");
        assert_eq!(rotation.peek_next().id, "b");
        assert_eq!(rotation.advance().id, "b");
        assert_eq!(rotation.advance().id, "a", "wraps around");
    }

    #[test]
    fn single_course_rotation_stays_put() {
        let catalog = CourseCatalog::new(vec![make_course("only")]).unwrap();
        let mut rotation = CourseRotation::new(catalog);
        assert_eq!(rotation.advance().id, "only");
        assert_eq!(rotation.peek_next().id, "only");
    }

    #[test]
    fn builtin_second_course_pins_low_gravity() {
        let catalog = CourseCatalog::builtin();
        let course = catalog.get("course2").unwrap();
        assert_eq!(course.modifier_mode, ModifierMode::Fixed);
        assert_eq!(course.fixed_modifier_id.as_deref(), Some("low_gravity"));
    }

    // -----------------------------------------------------------------------
    // Cosmetics catalog
    // -----------------------------------------------------------------------

    #[test]
    fn builtin_cosmetics_lookup() {
        let catalog = CosmeticCatalog::builtin();
        assert_eq!(catalog.all().len(), 3);

        let trail = catalog.get("trail_neon_green").unwrap();
        assert_eq!(trail.kind, CosmeticKind::Trail);
        assert_eq!(trail.price, 50);

        let confetti = catalog.get("finish_confetti").unwrap();
        assert_eq!(confetti.kind, CosmeticKind::FinishEffect);
        assert_eq!(confetti.price, 100);

        assert!(catalog.get("nonexistent").is_none());
    }
}
