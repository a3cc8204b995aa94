use approx::assert_relative_eq;
use nalgebra as na;
use ndarray::Array2;

use upose::config::{AssignmentStrategy, LocalizationMode, OptimizerKind};
use upose::optimizer::CostFunction;
use upose::skeleton::{Skeleton, SkeletonCost, SkeletonParameters};
use upose::{Candidate, Error, Frame, Landmark, TrackerConfig, TrackingContext};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn scenario_frame() -> Frame {
    Frame::empty(600, 480).with_candidates(vec![
        Candidate::from_ltwh(10.0, 10.0, 20.0, 20.0),
        Candidate::from_ltwh(300.0, 240.0, 30.0, 30.0),
        Candidate::from_ltwh(590.0, 10.0, 20.0, 20.0),
    ])
}

/// Face in the middle top, hands low on either side of a 200x200 frame.
fn body_candidates() -> Vec<Candidate> {
    vec![
        Candidate::from_ltwh(90.0, 20.0, 20.0, 20.0),
        Candidate::from_ltwh(25.0, 145.0, 10.0, 10.0),
        Candidate::from_ltwh(165.0, 145.0, 10.0, 10.0),
    ]
}

#[test]
fn three_blob_scenario_assigns_by_bias() {
    init();
    let mut ctx = TrackingContext::new(TrackerConfig::default(), 600, 480).unwrap();
    let pose = ctx.step(&scenario_frame()).unwrap();

    assert!(!pose.held);
    assert_eq!(pose.landmarks[Landmark::Face], na::Point2::new(20.0, 20.0));
    assert_eq!(pose.landmarks[Landmark::LeftHand], na::Point2::new(20.0, 20.0));
    assert_eq!(pose.landmarks[Landmark::RightHand], na::Point2::new(600.0, 20.0));
}

#[test]
fn bipartite_strategy_through_context() {
    let mut config = TrackerConfig::default();
    config.assignment.strategy = AssignmentStrategy::Bipartite;

    let mut ctx = TrackingContext::new(config, 600, 480).unwrap();
    let pose = ctx.step(&scenario_frame()).unwrap();

    assert_eq!(pose.landmarks[Landmark::Face], na::Point2::new(315.0, 255.0));
    assert_eq!(pose.landmarks[Landmark::LeftHand], na::Point2::new(20.0, 20.0));
    assert_eq!(pose.landmarks[Landmark::RightHand], na::Point2::new(600.0, 20.0));
}

#[test]
fn sparse_frames_hold_the_pose() {
    init();
    let mut ctx = TrackingContext::new(TrackerConfig::default(), 200, 200).unwrap();
    let first = ctx.step(&Frame::empty(200, 200).with_candidates(body_candidates())).unwrap();

    for i in 0..100 {
        let cands: Vec<_> = body_candidates().into_iter().take(i % 3).collect();
        let pose = ctx.step(&Frame::empty(200, 200).with_candidates(cands)).unwrap();

        assert!(pose.held);
        assert_eq!(pose.landmarks, first.landmarks);
    }

    assert_eq!(ctx.frame_index(), 101);
    assert_eq!(ctx.state().frames_since_update[Landmark::Face], 100);
}

#[test]
fn initial_pose_held_without_candidates() {
    let mut ctx = TrackingContext::new(TrackerConfig::default(), 64, 48).unwrap();
    let before = *ctx.landmarks();

    let pose = ctx.step(&Frame::empty(64, 48)).unwrap();

    assert!(pose.held);
    assert_eq!(pose.landmarks, before);
    assert_eq!(pose.landmarks[Landmark::Face], na::Point2::new(32.0, 0.0));
}

#[test]
fn elbows_fit_toward_edge_evidence() {
    init();
    let mut config = TrackerConfig::default();
    config.optimizer.kind = OptimizerKind::RandomSearch;
    let mut ctx = TrackingContext::new(config.clone(), 200, 200).unwrap();

    // place the anchors first
    ctx.step(&Frame::empty(200, 200).with_candidates(body_candidates())).unwrap();
    let anchors = ctx.anchors();
    assert_eq!(anchors.neck, na::Point2::new(100.0, 45.0));

    let bent = SkeletonParameters::from_elbows(na::Point2::new(40.0, 90.0), na::Point2::new(160.0, 90.0));
    let mut frame = Frame::empty(200, 200);
    let mut outline = Array2::zeros((200, 200));
    Skeleton::new(&anchors, &bent).render(&mut outline, 1.0, 1);
    frame.edges = outline.mapv(|v: u8| v as f32);
    frame.foreground.fill(1.0);

    let relaxed = SkeletonParameters::relaxed(&anchors);
    let evidence = frame.fitting_evidence(config.skeleton.evidence_threshold);
    let cost = SkeletonCost::new(anchors, evidence.view(), &config.skeleton);
    let relaxed_cost = cost.cost(relaxed.as_slice());

    let mut previous = f32::INFINITY;
    let mut last = relaxed;
    for _ in 0..5 {
        let pose = ctx.step(&frame).unwrap();
        let fit = pose.fit_cost.unwrap();

        assert!(pose.held);
        assert!(fit <= previous);
        assert_relative_eq!(fit, cost.cost(pose.parameters.as_slice()));
        previous = fit;
        last = pose.parameters;
    }

    assert!(previous < relaxed_cost);
    assert_eq!(ctx.parameters(), last);
}

#[test]
fn random_search_strategy_runs_in_context() {
    let mut config = TrackerConfig::default();
    config.optimizer.kind = OptimizerKind::RandomSearch;
    config.optimizer.iterations = 50;

    let mut ctx = TrackingContext::new(config, 200, 200).unwrap();
    let pose = ctx.step(&Frame::empty(200, 200).with_candidates(body_candidates())).unwrap();

    assert!(pose.fit_cost.is_some());
    assert_eq!(pose.skeleton.segments().len(), 7);
}

#[test]
fn presence_gate_delays_tracking() {
    let config = TrackerConfig {
        wait_for_presence: true,
        ..Default::default()
    };
    let mut ctx = TrackingContext::new(config, 200, 200).unwrap();
    let initial = *ctx.landmarks();

    let frame = Frame::empty(200, 200).with_candidates(body_candidates());
    let pose = ctx.step(&frame).unwrap();

    assert!(!pose.tracking);
    assert!(pose.held);
    assert_eq!(pose.fit_cost, None);
    assert_eq!(pose.landmarks, initial);

    let mut frame = frame;
    frame.foreground[[100, 100]] = 1.0;

    // presence arms tracking without consuming the frame
    let pose = ctx.step(&frame).unwrap();
    assert!(pose.tracking);
    assert!(pose.held);
    assert_eq!(pose.fit_cost, None);
    assert_eq!(pose.landmarks, initial);

    let pose = ctx.step(&frame).unwrap();
    assert!(pose.tracking);
    assert!(!pose.held);
    assert!(pose.fit_cost.is_some());
    assert_eq!(pose.landmarks[Landmark::Face], na::Point2::new(100.0, 30.0));
}

#[test]
fn all_rejected_slots_report_held() {
    let mut config = TrackerConfig::default();
    config.assignment.reject_divisor = 10_000;

    let mut ctx = TrackingContext::new(config, 600, 480).unwrap();
    let initial = *ctx.landmarks();
    let pose = ctx.step(&scenario_frame()).unwrap();

    assert!(pose.held);
    assert_eq!(pose.landmarks, initial);
    assert_eq!(pose.frames_since_update[Landmark::Face], 1);
}

#[test]
fn motion_and_background_follow_luminance() {
    let config = TrackerConfig {
        background_rate: 0.5,
        ..Default::default()
    };
    let mut ctx = TrackingContext::new(config, 4, 4).unwrap();

    let mut frame = Frame::empty(4, 4);
    frame.luminance = Some(Array2::from_elem((4, 4), 0.2));
    let pose = ctx.step(&frame).unwrap();
    assert_eq!(pose.motion_energy, None);

    frame.luminance = Some(Array2::from_elem((4, 4), 0.6));
    let pose = ctx.step(&frame).unwrap();

    assert_relative_eq!(pose.motion_energy.unwrap(), 0.4, epsilon = 1e-6);
    assert_relative_eq!(ctx.motion().unwrap()[[1, 2]], 0.4, epsilon = 1e-6);
    assert_relative_eq!(ctx.background().unwrap()[[0, 0]], 0.4, epsilon = 1e-6);
    assert_relative_eq!(ctx.previous_frame().unwrap()[[3, 3]], 0.6);
}

#[test]
fn static_background_keeps_first_frame() {
    let mut ctx = TrackingContext::new(TrackerConfig::default(), 4, 4).unwrap();
    let mut frame = Frame::empty(4, 4);

    for v in [0.1, 0.5, 0.9] {
        frame.luminance = Some(Array2::from_elem((4, 4), v));
        ctx.step(&frame).unwrap();
    }

    assert_relative_eq!(ctx.background().unwrap()[[2, 2]], 0.1);
}

#[test]
fn prior_argmax_localizes_with_confidence() {
    let config = TrackerConfig {
        localization: LocalizationMode::PriorArgmax,
        ..Default::default()
    };
    let mut ctx = TrackingContext::new(config, 600, 480).unwrap();
    let neck_before = ctx.landmark(Landmark::Neck);

    let mut frame = Frame::empty(600, 480);
    for (x, y) in [(310, 12), (15, 230), (590, 250)] {
        frame.foreground[[y, x]] = 1.0;
        frame.skin[[y, x]] = 1.0;
    }

    let pose = ctx.step(&frame).unwrap();

    assert!(!pose.held);
    assert_eq!(pose.landmarks[Landmark::Face], na::Point2::new(310.0, 12.0));
    assert_eq!(pose.landmarks[Landmark::LeftHand], na::Point2::new(15.0, 230.0));
    assert_eq!(pose.landmarks[Landmark::RightHand], na::Point2::new(590.0, 250.0));

    let face_conf = pose.confidence[Landmark::Face].unwrap();
    assert!(face_conf > 0.9 && face_conf <= 1.0);
    assert_eq!(pose.confidence[Landmark::Neck], None);

    let neck = pose.landmarks[Landmark::Neck];
    assert_relative_eq!(neck.x - neck_before.x, 10.0);
    assert_relative_eq!(neck.y - neck_before.y, 12.0);

    // nothing to see: hold and drop confidence
    let pose = ctx.step(&Frame::empty(600, 480)).unwrap();
    assert!(pose.held);
    assert_eq!(pose.confidence[Landmark::Face], None);
    assert_eq!(pose.landmarks[Landmark::Face], na::Point2::new(310.0, 12.0));
}

#[test]
fn soft_prior_biases_detector_map() {
    let ctx = TrackingContext::new(TrackerConfig::default(), 600, 480).unwrap();
    let mut likelihood = Array2::from_elem((480, 600), 1.0f32);

    ctx.weight_likelihood(Landmark::LeftHand, &mut likelihood);

    assert_relative_eq!(likelihood[[240, 0]], 1.0);
    assert!(likelihood[[240, 599]] < 1e-3);
}

#[test]
fn mismatched_frame_is_rejected() {
    let mut ctx = TrackingContext::new(TrackerConfig::default(), 64, 48).unwrap();

    assert!(matches!(
        ctx.step(&Frame::empty(32, 48)),
        Err(Error::ShapeMismatch { name: "frame", .. })
    ));

    let mut frame = Frame::empty(64, 48);
    frame.edges = Array2::zeros((10, 10));
    assert!(matches!(
        ctx.step(&frame),
        Err(Error::ShapeMismatch { name: "edges", .. })
    ));
}

#[test]
fn invalid_configuration_is_fatal() {
    let mut config = TrackerConfig::default();
    config.optimizer.radius = -1.0;
    assert_eq!(
        TrackingContext::new(config, 64, 48).unwrap_err(),
        Error::InvalidRadius(-1.0)
    );

    let mut config = TrackerConfig::default();
    config.prior.lower = [0.0, 0.0];
    config.prior.upper = [0.0, 10.0];
    assert!(matches!(
        TrackingContext::new(config, 64, 48),
        Err(Error::InvalidSpread(..))
    ));

    assert_eq!(
        TrackingContext::new(TrackerConfig::default(), 0, 48).unwrap_err(),
        Error::EmptyFrame
    );
}

#[test]
fn reset_restores_initial_pose() {
    let mut ctx = TrackingContext::new(TrackerConfig::default(), 600, 480).unwrap();
    let initial = *ctx.landmarks();

    ctx.step(&scenario_frame()).unwrap();
    assert_ne!(*ctx.landmarks(), initial);

    ctx.reset();
    assert_eq!(*ctx.landmarks(), initial);
    assert_eq!(ctx.frame_index(), 0);
}

#[test]
fn pose_serializes() {
    let mut ctx = TrackingContext::new(TrackerConfig::default(), 600, 480).unwrap();
    let pose = ctx.step(&scenario_frame()).unwrap();

    let json = serde_json::to_string(&pose).unwrap();
    let back: upose::Pose = serde_json::from_str(&json).unwrap();

    assert_eq!(back.landmarks, pose.landmarks);
    assert_eq!(back.frame_index, 1);
}
