mod common;

use common::landmark_fixture;
use facesym_core::{
    FaceLandmarks, FacialRegion, SYMMETRY_PAIRS, SymmetryReport, score, score_points,
    symmetry::total_difference,
};

#[test]
fn reference_face_at_full_resolution_scores_zero() {
    let fixture = landmark_fixture("reference_face");
    let landmarks = FaceLandmarks::from_pairs(&fixture.points).expect("valid fixture");

    let total = total_difference(&landmarks);
    assert!((total - fixture.total_difference).abs() < 0.05, "total {total}");
    assert_eq!(score(&landmarks).value(), fixture.expected_score);
}

#[test]
fn thumbnail_face_keeps_a_positive_score() {
    let fixture = landmark_fixture("thumbnail_face");
    let landmarks = FaceLandmarks::from_pairs(&fixture.points).expect("valid fixture");

    assert!((total_difference(&landmarks) - fixture.total_difference).abs() < 0.05);
    assert_eq!(score(&landmarks).value(), fixture.expected_score);
    assert!(
        landmarks
            .points()
            .iter()
            .all(|p| p.x < fixture.image_size[0] as f32 && p.y < fixture.image_size[1] as f32)
    );
}

#[test]
fn same_face_scores_lower_at_higher_resolution() {
    let small = landmark_fixture("thumbnail_face");
    let large = landmark_fixture("reference_face");
    let small_score = score_points(
        &FaceLandmarks::from_pairs(&small.points)
            .expect("valid")
            .points()
            .to_vec(),
    )
    .expect("score");
    let large_score = score(&FaceLandmarks::from_pairs(&large.points).expect("valid"));
    assert!(small_score > large_score);
}

#[test]
fn report_lists_every_pair_of_the_fixture() {
    let fixture = landmark_fixture("thumbnail_face");
    let landmarks = FaceLandmarks::from_pairs(&fixture.points).expect("valid fixture");
    let report = SymmetryReport::from_landmarks(&landmarks);

    assert_eq!(report.pairs.len(), SYMMETRY_PAIRS.len());
    assert_eq!(report.score.value(), fixture.expected_score);
    let self_pair = report
        .pairs
        .iter()
        .find(|pair| pair.left == 40 && pair.right == 40)
        .expect("self pair present");
    assert_eq!(self_pair.difference, 0.0);

    let json = serde_json::to_value(&report).expect("serialize report");
    assert_eq!(json["score"], fixture.expected_score);
}

#[test]
fn fixture_jaw_spans_the_face() {
    let fixture = landmark_fixture("reference_face");
    let landmarks = FaceLandmarks::from_pairs(&fixture.points).expect("valid fixture");
    let jaw = landmarks.region(FacialRegion::Jaw);
    assert_eq!(jaw.len(), 17);
    assert!(jaw[0].x < jaw[16].x);
}
