use approx::assert_relative_eq;
use colorpose_core::{ChannelOrder, ColorImage, ColorImageView, FrameError, PixelRect};
use colorpose_detect::{
    measure_reference, Capabilities, ColorProfile, DetectError, DetectorParams, ObjectDetector,
};

const BACKGROUND: [u8; 3] = [30, 30, 30];
const BLUE: [u8; 3] = [20, 60, 220];
const WHITE: [u8; 3] = [245, 245, 245];

fn blank(width: usize, height: usize) -> ColorImage {
    ColorImage::filled(width, height, ChannelOrder::Bgr, BACKGROUND)
}

fn blue_detector() -> ObjectDetector {
    ObjectDetector::new(DetectorParams::new(ColorProfile::blue_target())).expect("detector")
}

#[test]
fn centered_blue_square_scenario() {
    let mut frame = blank(640, 480);
    frame.fill_rect_rgb(270, 190, 100, 100, BLUE);

    let det = blue_detector()
        .detect(&frame.view())
        .expect("valid frame")
        .expect("blue square");

    assert_eq!(det.bbox, PixelRect::new(270, 190, 100, 100));
    assert_eq!((det.center_x, det.center_y), (320, 240));
    assert_eq!(det.error_x_rel, 0.0);
    assert_eq!(det.error_y_rel, 0.0);
    assert_eq!(det.tilt_rel(), 0.0);
    assert_eq!(det.area, 10_000);
    assert_eq!(det.distance_m, None);
    assert!(!det.degenerate);
}

#[test]
fn all_background_frame_is_absent_not_error() {
    let frame = blank(320, 240);
    assert!(blue_detector().detect(&frame.view()).expect("valid").is_none());
}

#[test]
fn area_floor_applies_after_cleaning() {
    // 20x20 + 9x11 = 499 px, both parts thick enough to survive cleaning.
    let mut small = blank(200, 150);
    small.fill_rect_rgb(50, 50, 20, 20, BLUE);
    small.fill_rect_rgb(70, 50, 9, 11, BLUE);
    assert!(blue_detector().detect(&small.view()).unwrap().is_none());

    // 21x21 + 6x10 = 501 px.
    let mut large = blank(200, 150);
    large.fill_rect_rgb(50, 50, 21, 21, BLUE);
    large.fill_rect_rgb(71, 50, 6, 10, BLUE);
    let det = blue_detector().detect(&large.view()).unwrap().expect("501 px");
    assert_eq!(det.area, 501);
    assert_eq!(det.bbox, PixelRect::new(50, 50, 27, 21));
}

#[test]
fn wide_blob_is_rejected_by_shape_filter() {
    let mut frame = blank(400, 300);
    frame.fill_rect_rgb(10, 240, 200, 40, WHITE); // w/h = 5
    frame.fill_rect_rgb(250, 50, 60, 60, WHITE);

    let shaped = ObjectDetector::new(DetectorParams::new(ColorProfile::white_package())).unwrap();
    let det = shaped.detect(&frame.view()).unwrap().expect("square package");
    assert_eq!(det.bbox, PixelRect::new(250, 50, 60, 60));

    let mut unfiltered = ColorProfile::white_package();
    unfiltered.selection = Default::default();
    let plain = ObjectDetector::new(DetectorParams::new(unfiltered)).unwrap();
    let det = plain.detect(&frame.view()).unwrap().expect("largest");
    assert_eq!(det.bbox, PixelRect::new(10, 240, 200, 40));
}

#[test]
fn taller_left_side_gives_positive_tilt() {
    // Left 30 columns span 41 rows, right 10 columns span 21 rows.
    let mut frame = blank(320, 240);
    frame.fill_rect_rgb(100, 100, 30, 41, BLUE);
    frame.fill_rect_rgb(130, 100, 10, 21, BLUE);

    let det = blue_detector().detect(&frame.view()).unwrap().expect("blob");
    let tilt = det.tilt.expect("tilt enabled by default");
    assert_eq!((tilt.left_height, tilt.right_height), (40.0, 20.0));
    assert_relative_eq!(tilt.tilt_rel, 2.0 / 3.0, max_relative = 1e-6);

    let mut mirrored = blank(320, 240);
    mirrored.fill_rect_rgb(110, 100, 30, 41, BLUE);
    mirrored.fill_rect_rgb(100, 100, 10, 21, BLUE);
    let det = blue_detector().detect(&mirrored.view()).unwrap().expect("blob");
    assert_relative_eq!(det.tilt_rel(), -2.0 / 3.0, max_relative = 1e-6);
}

#[test]
fn calibrated_distance_is_inverse_to_height() {
    let mut reference = blank(320, 240);
    reference.fill_rect_rgb(100, 60, 80, 120, WHITE);
    let record = measure_reference(&reference.view(), &ColorProfile::white_reference(), 0.6)
        .expect("reference found");
    assert_eq!(record.reference_pixel_height, 120);

    let params = DetectorParams::new(ColorProfile::blue_target()).with_capabilities(Capabilities {
        tilt: false,
        distance: true,
    });
    let detector = ObjectDetector::with_calibration(params, Some(record)).expect("calibrated");

    let mut near = blank(320, 240);
    near.fill_rect_rgb(100, 60, 60, 120, BLUE);
    let mut far = blank(320, 240);
    far.fill_rect_rgb(100, 60, 30, 60, BLUE);

    let d_near = detector.detect(&near.view()).unwrap().unwrap().distance_m.unwrap();
    let d_far = detector.detect(&far.view()).unwrap().unwrap().distance_m.unwrap();
    assert_relative_eq!(d_near, 0.6 * 50.0 / 41.0, max_relative = 1e-5);
    assert_relative_eq!(d_far, 2.0 * d_near, max_relative = 1e-5);
}

#[test]
fn rgb_and_bgr_frames_agree() {
    let mut bgr = blank(160, 120);
    bgr.fill_rect_rgb(20, 30, 40, 30, BLUE);
    let mut rgb = ColorImage::filled(160, 120, ChannelOrder::Rgb, BACKGROUND);
    rgb.fill_rect_rgb(20, 30, 40, 30, BLUE);

    let detector = blue_detector();
    let a = detector.detect(&bgr.view()).unwrap();
    let b = detector.detect(&rgb.view()).unwrap();
    assert!(a.is_some());
    assert_eq!(a, b);
}

#[test]
fn malformed_buffer_is_reported() {
    let data = vec![0u8; 100];
    let view = ColorImageView {
        width: 10,
        height: 10,
        order: ChannelOrder::Bgr,
        data: &data,
    };
    let err = blue_detector().detect(&view).unwrap_err();
    assert!(matches!(
        err,
        DetectError::InvalidFrame(FrameError::BufferLength {
            expected: 300,
            got: 100
        })
    ));
}

#[test]
fn detector_is_shareable_across_threads() {
    let detector = blue_detector();
    let mut frame = blank(200, 100);
    frame.fill_rect_rgb(80, 30, 40, 40, BLUE);

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| detector.detect(&frame.view()).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert!(results[0].is_some());
}

#[test]
fn ring_wins_over_square_inside_its_hole() {
    // 100 x 100 ring with a 6 px wall, solid 60 x 60 square in the hole.
    let mut frame = blank(240, 200);
    frame.fill_rect_rgb(50, 50, 100, 6, BLUE);
    frame.fill_rect_rgb(50, 144, 100, 6, BLUE);
    frame.fill_rect_rgb(50, 50, 6, 100, BLUE);
    frame.fill_rect_rgb(144, 50, 6, 100, BLUE);
    frame.fill_rect_rgb(70, 70, 60, 60, BLUE);

    let debug = blue_detector().detect_debug(&frame.view()).unwrap();
    assert_eq!(debug.located.candidates.len(), 1);
    let det = debug.detection.expect("ring");
    assert_eq!(det.bbox, PixelRect::new(50, 50, 100, 100));
    assert_eq!(det.area, 10_000);
    assert_eq!((det.center_x, det.center_y), (100, 100));
}
