//! End-to-end scenarios: detection results in, smoothed labels out.

use faceshape_core::topology::{
    CHEEKBONE_LEFT, CHEEKBONE_RIGHT, CHIN, FACE_TOP, FOREHEAD_LEFT, FOREHEAD_RIGHT, JAWLINE,
    MESH_LANDMARK_COUNT,
};
use faceshape_core::{
    ClassificationPolicy, Classifier, DetectionResult, FrameOutcome, Landmark, LandmarkSet,
    ShapeConfig, ShapeLabel, ShapeSession,
};

/// A symmetric mesh centred on x = 320 with the given widths and height.
fn face(forehead: f32, cheekbone: f32, jaw: f32, height: f32) -> LandmarkSet {
    let cx = 320.0;
    let top = 80.0;
    let mut points = vec![Landmark::new(cx, top + height / 2.0); MESH_LANDMARK_COUNT];

    let last = (JAWLINE.len() - 1) as f32;
    for (i, &idx) in JAWLINE.iter().enumerate() {
        let x = cx - jaw / 2.0 + jaw * i as f32 / last;
        points[idx] = Landmark::new(x, top + height * 0.8);
    }
    points[FACE_TOP] = Landmark::new(cx, top);
    points[CHIN] = Landmark::new(cx, top + height);
    // Landmark 234 is both the forehead's left edge and the jawline's first
    // point; keep it at the jaw's left edge so the jaw extent is unchanged.
    points[FOREHEAD_LEFT] = Landmark::new(cx - jaw / 2.0, top + height * 0.25);
    points[FOREHEAD_RIGHT] = Landmark::new(cx - jaw / 2.0 + forehead, top + height * 0.25);
    points[CHEEKBONE_LEFT] = Landmark::new(cx - cheekbone / 2.0, top + height * 0.45);
    points[CHEEKBONE_RIGHT] = Landmark::new(cx + cheekbone / 2.0, top + height * 0.45);

    LandmarkSet::new(points)
}

fn frame(landmarks: LandmarkSet) -> DetectionResult {
    DetectionResult::with_landmarks(landmarks)
}

#[test]
fn square_face_is_square() {
    let label = Classifier::default()
        .classify(&face(200.0, 198.0, 200.0, 204.0))
        .unwrap();
    assert_eq!(label, ShapeLabel::Square);
}

#[test]
fn tall_face_is_oblong_regardless_of_widths() {
    let classifier = Classifier::default();
    for (forehead, cheek, jaw) in [(200.0, 200.0, 200.0), (240.0, 200.0, 160.0), (180.0, 200.0, 150.0)] {
        let widest = f32::max(forehead, f32::max(cheek, jaw));
        let label = classifier
            .classify(&face(forehead, cheek, jaw, widest * 1.6))
            .unwrap();
        assert_eq!(label, ShapeLabel::Oblong, "widths {forehead}/{cheek}/{jaw}");
    }
}

#[test]
fn every_valid_face_gets_one_of_five_labels() {
    let classifier = Classifier::default();
    let legacy = Classifier::new(ClassificationPolicy::LegacyRatio);
    for forehead in [150.0, 200.0, 250.0] {
        for cheek in [150.0, 200.0, 250.0] {
            for height in [150.0, 250.0, 350.0] {
                let lms = face(forehead, cheek, 180.0, height);
                for c in [&classifier, &legacy] {
                    let label = c.classify(&lms).unwrap();
                    assert!(ShapeLabel::ALL.contains(&label));
                    assert_eq!(c.classify(&lms).unwrap(), label);
                }
            }
        }
    }
}

#[test]
fn detection_json_from_mesh_model() {
    let points: Vec<serde_json::Value> = face(200.0, 240.0, 180.0, 260.0)
        .points()
        .iter()
        .enumerate()
        .map(|(i, p)| serde_json::json!({ "x": p.x, "y": p.y, "z": -0.01, "name": format!("p{i}") }))
        .collect();
    let json = serde_json::json!({ "faces": [{ "keypoints": points, "box": {} }] });

    let detection: DetectionResult = serde_json::from_value(json).unwrap();
    let mut session = ShapeSession::default();
    assert_eq!(
        session.process(&detection),
        FrameOutcome::Classified {
            frame_label: ShapeLabel::Round,
            displayed: ShapeLabel::Round,
        }
    );
}

#[test]
fn smoothing_rides_out_noisy_frames() {
    let mut session = ShapeSession::default();
    let heart = frame(face(240.0, 200.0, 160.0, 300.0));
    let round = frame(face(200.0, 240.0, 180.0, 260.0));

    for _ in 0..10 {
        session.process(&heart);
    }
    // A few Round frames do not flip the displayed label.
    for _ in 0..3 {
        let outcome = session.process(&round);
        assert_eq!(outcome.displayed(), Some(ShapeLabel::Heart));
    }
    assert_eq!(session.current_label(), Some(ShapeLabel::Heart));
}

#[test]
fn window_slides_to_recent_frames() {
    let mut session = ShapeSession::default();
    let heart = frame(face(240.0, 200.0, 160.0, 300.0));
    let oblong = frame(face(200.0, 200.0, 200.0, 400.0));

    for _ in 0..20 {
        session.process(&heart);
    }
    for _ in 0..15 {
        session.process(&oblong);
    }

    let retained: Vec<_> = session.history().iter().collect();
    assert_eq!(retained.len(), 30);
    assert_eq!(retained.iter().filter(|&&l| l == ShapeLabel::Heart).count(), 15);
    assert_eq!(retained.iter().filter(|&&l| l == ShapeLabel::Oblong).count(), 15);
    // Even split goes to the newer frames.
    assert_eq!(session.current_label(), Some(ShapeLabel::Oblong));

    for _ in 0..10 {
        session.process(&oblong);
    }
    let hearts = session.history().iter().filter(|&l| l == ShapeLabel::Heart).count();
    assert_eq!(hearts, 5);
    assert_eq!(session.current_label(), Some(ShapeLabel::Oblong));
}

#[test]
fn losing_the_face_clears_the_display() {
    let mut session = ShapeSession::default();
    session.process(&frame(face(240.0, 200.0, 160.0, 300.0)));
    assert!(session.current_label().is_some());

    assert_eq!(session.process(&DetectionResult::empty()), FrameOutcome::NoFace);
    assert_eq!(session.current_label(), None);

    // The next face starts a fresh vote.
    let outcome = session.process(&frame(face(200.0, 240.0, 180.0, 260.0)));
    assert_eq!(outcome.displayed(), Some(ShapeLabel::Round));
}

#[test]
fn configured_thresholds_reach_the_session() {
    let config = ShapeConfig::from_toml_str(
        r#"
        history_size = 5

        [refined]
        oblong_min_ratio = 1.2
        "#,
    )
    .unwrap();
    let mut session = ShapeSession::from_config(&config);

    // Ratio 1.25: Heart by default, Oblong with the lowered threshold.
    let lms = face(240.0, 200.0, 160.0, 300.0);
    assert_eq!(Classifier::default().classify(&lms).unwrap(), ShapeLabel::Heart);
    assert_eq!(session.process(&frame(lms)).displayed(), Some(ShapeLabel::Oblong));

    for _ in 0..10 {
        session.process(&frame(face(200.0, 240.0, 180.0, 260.0)));
    }
    assert_eq!(session.history().len(), 5);
}
