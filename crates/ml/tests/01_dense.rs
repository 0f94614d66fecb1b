use ml::{Dense, Layer, Relu, Sequential, Tensor};

fn close(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (*x - *y).abs() < 1e-5)
}

#[test]
fn dense_forward_known_case() {
    let w = vec![1.0, 0.5, -1.0,
                 2.0, 0.2, 0.2];
    let b = vec![0.1, -0.1];
    let x = Tensor::from_vec(vec![1, 3], vec![1.0, 2.0, 3.0]);
    let dense = Dense::new(w, b, 3, 2);
    let y = dense.forward(&x);
    assert_eq!(y.shape, vec![1, 2]);
    assert!(close(&y.data, &[1.0 + 1.0 - 3.0 + 0.1, 2.0 + 0.4 + 0.6 - 0.1]));
}

#[test]
fn dense_forward_is_row_independent() {
    let dense = Dense::new(vec![1.0, -1.0], vec![0.5], 2, 1);
    let x = Tensor::from_vec(vec![3, 2], vec![1.0, 0.0, 0.0, 1.0, 2.0, 2.0]);
    let y = dense.forward(&x);
    assert_eq!(y.shape, vec![3, 1]);
    assert!(close(&y.data, &[1.5, -0.5, 0.5]));
}

#[test]
fn dense_backward_gradients() {
    let w = vec![1.0, 2.0,
                 -3.0, 0.5];
    let b = vec![0.1, -0.2];
    let x = Tensor::from_vec(vec![1, 2], vec![0.5, -1.0]);
    let dense = Dense::new(w, b, 2, 2);
    let grad_out = Tensor::from_vec(vec![1, 2], vec![1.0, -2.0]);
    let (dx, dw, db) = dense.backward(&x, &grad_out);
    let expected_dx = vec![1.0 * 1.0 + -3.0 * (-2.0), 2.0 * 1.0 + 0.5 * (-2.0)];
    let expected_dw = vec![0.5 * 1.0, -1.0 * 1.0,
                           0.5 * (-2.0), -1.0 * (-2.0)];
    assert!(close(&dx.data, &expected_dx));
    assert!(close(&dw.data, &expected_dw));
    assert!(close(&db.data, &grad_out.data));
}

#[test]
fn dense_backward_accumulates_over_batch() {
    let dense = Dense::new(vec![2.0], vec![0.0], 1, 1);
    let x = Tensor::from_vec(vec![2, 1], vec![1.0, 3.0]);
    let grad_out = Tensor::from_vec(vec![2, 1], vec![1.0, 1.0]);
    let (dx, dw, db) = dense.backward(&x, &grad_out);
    assert!(close(&dx.data, &[2.0, 2.0]));
    assert!(close(&dw.data, &[4.0]));
    assert!(close(&db.data, &[2.0]));
}

#[test]
fn relu_forward_backward() {
    let x = Tensor::from_vec(vec![1, 3], vec![-1.0, 0.0, 2.0]);
    let relu = Relu;
    let y = Layer::forward(&relu, &x);
    assert_eq!(y.data, vec![0.0, 0.0, 2.0]);
    let grad_out = Tensor::from_vec(vec![1, 3], vec![0.1, 0.2, 0.3]);
    let (dx, params) = relu.backward(&x, &grad_out);
    assert_eq!(dx.data, vec![0.0, 0.0, 0.3]);
    assert!(params.is_empty());
}

#[test]
fn sequential_gradients_follow_param_order() {
    let mut seq = Sequential::new();
    seq.push(Dense::new(vec![1.0], vec![0.0], 1, 1));
    seq.push(Relu);
    seq.push(Dense::new(vec![0.5], vec![0.0], 1, 1));
    let x = Tensor::from_vec(vec![1, 1], vec![2.0]);
    let (out, activations) = seq.forward(&x);
    let h1: f32 = 2.0;
    assert!((out.data[0] - 0.5 * h1).abs() < 1e-6);
    assert!(close(&seq.infer(&x).data, &out.data));

    let grad_out = Tensor::from_vec(vec![1, 1], vec![1.0]);
    let (dx, grads) = seq.backward(&activations, &grad_out);
    assert_eq!(grads.len(), seq.params().len());
    // dw1, db1, dw2, db2
    assert!(close(&grads[0].data, &[2.0 * 0.5]));
    assert!(close(&grads[1].data, &[0.5]));
    assert!(close(&grads[2].data, &[h1]));
    assert!(close(&grads[3].data, &[1.0]));
    assert!(close(&dx.data, &[0.5]));
}

#[test]
fn dense_xavier_init_stats() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    let mut rng = StdRng::seed_from_u64(42);
    let dense = Dense::xavier(40, 30, &mut rng);
    assert_eq!(dense.w.shape, vec![30, 40]);
    assert_eq!(dense.b.shape, vec![30]);
    assert!(dense.b.data.iter().all(|&b| b == 0.0));

    let limit = (6.0f32 / 70.0).sqrt();
    assert!(dense.w.data.iter().all(|w| w.abs() <= limit));
    let mean: f32 = dense.w.data.iter().sum::<f32>() / dense.w.len() as f32;
    assert!(mean.abs() < 0.05);
    let var: f32 =
        dense.w.data.iter().map(|&x| (x - mean).powi(2)).sum::<f32>() / dense.w.len() as f32;
    let expected_var = limit * limit / 3.0;
    assert!((var - expected_var).abs() / expected_var < 0.2);
}
