mod common;

use bl_iris::{
    CODE_COLS, CODE_ROWS, CodeLibrary, ComparatorConfig, IrisBoundaryConfig, IrisError,
    IrisPipeline, PupilConfig, RecordTags, compare, find_iris_boundary, localize_pupil,
};
use common::synthetic_eye::{disc, eye};

fn pipeline() -> IrisPipeline {
    IrisPipeline {
        pupil: PupilConfig {
            threshold: 250.0,
            ..PupilConfig::default()
        },
        ..IrisPipeline::default()
    }
}

#[test]
fn dark_disc_is_localized() {
    let _ = env_logger::builder().is_test(true).try_init();
    let img = disc(100, 100, 50.0, 50.0, 20.0);
    let cfg = PupilConfig {
        threshold: 250.0,
        ..PupilConfig::default()
    };

    let pupil = localize_pupil(&img, &cfg).expect("disc should be found");
    assert!((pupil.center_x - 50.0).abs() <= 2.0, "{pupil:?}");
    assert!((pupil.center_y - 50.0).abs() <= 2.0, "{pupil:?}");
    assert!((pupil.radius - 20.0).abs() <= 2.0, "{pupil:?}");
}

#[test]
fn default_distance_level_shrinks_the_disc() {
    let _ = env_logger::builder().is_test(true).try_init();
    let img = disc(100, 100, 50.0, 50.0, 20.0);

    // Threshold 216 keeps only pixels at chessboard distance >= 3 from the
    // page, which erodes the mask before the projections see it.
    let pupil = localize_pupil(&img, &PupilConfig::default()).expect("disc should be found");
    assert_eq!(pupil.center(), bl_core::Point2f::new(50.0, 50.0));
    assert_eq!(pupil.radius, 16.0);

    let loose = PupilConfig {
        threshold: 250.0,
        ..PupilConfig::default()
    };
    let pupil = localize_pupil(&img, &loose).expect("disc should be found");
    assert_eq!(pupil.radius, 19.0);
}

#[test]
fn iris_boundary_of_synthetic_eye() {
    let _ = env_logger::builder().is_test(true).try_init();
    let img = eye(200, 20.0, 50.0, 5.0);

    let pupil = localize_pupil(&img, &pipeline().pupil).expect("pupil found");
    assert_eq!(pupil.center(), bl_core::Point2f::new(100.0, 100.0));

    let boundary =
        find_iris_boundary(&img, &pupil, &IrisBoundaryConfig::default()).expect("iris found");
    let r = boundary.geometry.iris_radius();
    assert!((r - 50.0).abs() <= 2.0, "iris radius {r}");
    assert!(r > boundary.geometry.pupil_radius());
}

#[test]
fn pupil_without_iris_stops_before_encoding() {
    let _ = env_logger::builder().is_test(true).try_init();
    let img = disc(200, 200, 100.0, 100.0, 20.0);
    assert_eq!(pipeline().analyze(&img), Err(IrisError::IrisNotFound));
}

#[test]
fn same_eye_matches_itself_and_differs_from_another() {
    let _ = env_logger::builder().is_test(true).try_init();
    let p = pipeline();
    let a = p.analyze(&eye(200, 20.0, 50.0, 5.0)).expect("analysis succeeds");
    let again = p.analyze(&eye(200, 20.0, 50.0, 5.0)).expect("analysis succeeds");
    let other = p.analyze(&eye(200, 20.0, 50.0, 9.0)).expect("analysis succeeds");

    assert_eq!(a.encoding.code.dims(), (CODE_ROWS, CODE_COLS));
    assert_eq!(a.encoding.unwrap.normalized.dims(), (512, 128));

    let cfg = ComparatorConfig::default();
    let same = compare(&a.encoding.code, &again.encoding.code, &cfg).expect("same shape");
    assert!(same.is_match);
    assert_eq!(same.distance, 0.0);

    let diff = compare(&a.encoding.code, &other.encoding.code, &cfg).expect("same shape");
    assert!(diff.distance > 0.0);

    let mut library = CodeLibrary::new();
    library
        .save("spokes-9", other.encoding.code.clone(), RecordTags::default(), 1)
        .expect("saved");
    library
        .save("spokes-5", a.encoding.code.clone(), RecordTags::default(), 2)
        .expect("saved");
    let (best, report) = library
        .best_match(&again.encoding.code, &cfg)
        .expect("valid config")
        .expect("library not empty");
    assert_eq!(best.name, "spokes-5");
    assert_eq!(report.shift, 0);
}
