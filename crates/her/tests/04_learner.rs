mod common;

use common::{bits, transition, FixedQ};
use her::{double_q_target, value_bounds, Bits, DoubleDqn, HerError, Transition};
use ml::QFunction;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn learner(online: Vec<f32>, target: Vec<f32>, gamma: f32, tau: f32) -> DoubleDqn<FixedQ> {
    DoubleDqn::new(FixedQ::new(online), FixedQ::new(target), gamma, tau).unwrap()
}

#[test]
fn bounds_follow_gamma() {
    let (lo, hi) = value_bounds(0.98);
    assert!((lo + 50.0).abs() < 1e-3);
    assert_eq!(hi, 0.0);
    assert_eq!(value_bounds(0.0), (-1.0, 0.0));
}

#[test]
fn online_selects_and_target_evaluates() {
    let online = [1.0, 3.0, 2.0];
    let target = [-2.0, -4.0, -1.0];
    let v = double_q_target(-1.0, &online, &target, 0.9);
    assert!((v - (-1.0 + 0.9 * -4.0)).abs() < 1e-6);
}

#[test]
fn targets_are_clipped_to_value_range() {
    // positive bootstrap is capped at zero
    assert_eq!(double_q_target(0.0, &[1.0], &[10.0], 0.9), 0.0);
    // runaway negative bootstrap is floored at -1 / (1 - gamma)
    let v = double_q_target(-1.0, &[0.0, 1.0], &[0.0, -1e6], 0.5);
    assert_eq!(v, -2.0);
}

#[test]
fn targets_always_lie_in_bounds() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..2000 {
        let gamma: f32 = rng.gen_range(0.0..0.999);
        let reward = if rng.gen_bool(0.5) { 0.0 } else { -1.0 };
        let online: Vec<f32> = (0..4).map(|_| rng.gen_range(-1e4..1e4)).collect();
        let target: Vec<f32> = (0..4).map(|_| rng.gen_range(-1e4..1e4)).collect();
        let v = double_q_target(reward, &online, &target, gamma);
        let (lo, hi) = value_bounds(gamma);
        assert!(v >= lo && v <= hi, "{v} outside [{lo}, {hi}]");
    }
}

#[test]
fn optimize_trains_taken_actions_on_clipped_targets() {
    let mut dqn = learner(vec![1.0, 3.0, 2.0], vec![-2.0, -4.0, -1.0], 0.5, 0.9);
    let batch: Vec<Transition> = (0..4)
        .map(|id| {
            let mut t = transition(id, 3);
            t.action = id % 3;
            t.reward = if id % 2 == 0 { 0.0 } else { -1.0 };
            t
        })
        .collect();
    let refs: Vec<&Transition> = batch.iter().collect();
    let targets = dqn.compute_targets(&refs).unwrap();
    // 0 + 0.5 * -4 = -2, and -1 + 0.5 * -4 = -3 floored at -2
    assert_eq!(targets, vec![-2.0; 4]);

    dqn.optimize(&refs).unwrap();
    assert_eq!(dqn.updates(), 1);
    let (online, _) = dqn.into_networks();
    assert_eq!(online.trained.len(), 1);
    assert_eq!(online.trained[0].0, vec![-2.0; 4]);
    assert_eq!(online.trained[0].1, vec![0, 1, 2, 0]);
}

#[test]
fn malformed_batches_are_rejected() {
    let mut dqn = learner(vec![0.0; 3], vec![0.0; 3], 0.9, 0.9);
    assert!(matches!(dqn.optimize(&[]), Err(HerError::EmptyBatch)));

    let wrong = Transition {
        state: bits(&[0, 1]),
        action: 0,
        reward: -1.0,
        next_state: bits(&[1, 1]),
        goal: bits(&[1, 1]),
    };
    assert!(matches!(
        dqn.optimize(&[&wrong]),
        Err(HerError::DimensionMismatch { expected: 3, actual: 2 })
    ));

    let mut bad_action = transition(1, 3);
    bad_action.action = 3;
    assert!(matches!(
        dqn.optimize(&[&bad_action]),
        Err(HerError::ActionOutOfRange { action: 3, size: 3 })
    ));
}

#[test]
fn mismatched_networks_are_rejected() {
    let err = DoubleDqn::new(FixedQ::new(vec![0.0; 3]), FixedQ::new(vec![0.0; 4]), 0.9, 0.9);
    assert!(matches!(err, Err(HerError::DimensionMismatch { .. })));
    let err = DoubleDqn::new(FixedQ::new(vec![0.0; 3]), FixedQ::new(vec![0.0; 3]), 1.0, 0.9);
    assert!(matches!(err, Err(HerError::InvalidConfig(_))));
}

#[test]
fn soft_sync_converges_monotonically() {
    let mut dqn = learner(vec![1.0, -2.0, 0.5], vec![-3.0, 4.0, 9.0], 0.98, 0.95);
    let online = dqn.online().parameters();
    let mut last = dqn.target().parameters().distance(&online).unwrap();
    for _ in 0..100 {
        dqn.sync_target().unwrap();
        let d = dqn.target().parameters().distance(&online).unwrap();
        assert!(d < last);
        last = d;
    }
    assert!(last < 0.1);
    // the online network is never touched by a sync
    assert_eq!(dqn.online().parameters(), online);
}

#[test]
fn single_sync_applies_tau_to_old_target() {
    let mut dqn = learner(vec![1.0, 1.0], vec![0.0, 2.0], 0.9, 0.75);
    dqn.sync_target().unwrap();
    let t = dqn.target().parameters();
    assert_eq!(t.get(0).unwrap().data, vec![0.25, 1.75]);
}

#[test]
fn hard_sync_copies_online() {
    let mut dqn = learner(vec![1.0, 2.0], vec![0.0, 0.0], 0.9, 0.9);
    dqn.hard_sync().unwrap();
    assert_eq!(dqn.target().parameters(), dqn.online().parameters());
}

#[test]
fn act_uses_online_and_act_target_uses_target() {
    let dqn = learner(vec![0.0, 5.0, 1.0], vec![9.0, 0.0, 1.0], 0.9, 0.9);
    let s = Bits::zeros(3);
    let g = bits(&[1, 1, 1]);
    assert_eq!(dqn.act(&s, &g).unwrap(), 1);
    assert_eq!(dqn.act_target(&s, &g).unwrap(), 0);
    assert!(dqn.act(&Bits::zeros(2), &g).is_err());
}
