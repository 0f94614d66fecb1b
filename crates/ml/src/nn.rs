use crate::Tensor;
use rand::{distributions::Uniform, Rng};

/// A differentiable layer operating on `[batch, features]` tensors.
pub trait Layer {
    fn forward(&self, x: &Tensor) -> Tensor;

    /// Returns the gradient with respect to `x` and the gradients of this
    /// layer's parameters, in the order of [`Layer::params`].
    fn backward(&self, x: &Tensor, grad: &Tensor) -> (Tensor, Vec<Tensor>);

    fn params(&self) -> Vec<&Tensor> {
        Vec::new()
    }

    fn params_mut(&mut self) -> Vec<&mut Tensor> {
        Vec::new()
    }
}

/// A fully connected layer.
#[derive(Clone, Debug)]
pub struct Dense {
    /// Weight matrix, `[out_dim, in_dim]`.
    pub w: Tensor,
    /// Bias vector, `[out_dim]`.
    pub b: Tensor,
    pub in_dim: usize,
    pub out_dim: usize,
}

impl Dense {
    /// # Panics
    ///
    /// Panics if the weight or bias lengths disagree with the dimensions.
    #[must_use]
    pub fn new(weights: Vec<f32>, bias: Vec<f32>, in_dim: usize, out_dim: usize) -> Self {
        assert_eq!(weights.len(), in_dim * out_dim);
        assert_eq!(bias.len(), out_dim);
        Self {
            w: Tensor::from_vec(vec![out_dim, in_dim], weights),
            b: Tensor::from_vec(vec![out_dim], bias),
            in_dim,
            out_dim,
        }
    }

    /// Glorot-uniform weights, zero bias.
    pub fn xavier(in_dim: usize, out_dim: usize, rng: &mut impl Rng) -> Self {
        let limit = (6.0f32 / (in_dim as f32 + out_dim as f32)).sqrt();
        let dist = Uniform::new_inclusive(-limit, limit);
        let weights: Vec<f32> = (0..in_dim * out_dim).map(|_| rng.sample(dist)).collect();
        Self::new(weights, vec![0.0; out_dim], in_dim, out_dim)
    }

    /// Batched affine map, `[batch, in_dim] -> [batch, out_dim]`.
    #[must_use]
    pub fn forward(&self, x: &Tensor) -> Tensor {
        debug_assert_eq!(x.cols(), self.in_dim);
        let batch = x.rows();
        let mut y = vec![0f32; batch * self.out_dim];
        for n in 0..batch {
            let row = x.row(n);
            for o in 0..self.out_dim {
                let weights = &self.w.data[o * self.in_dim..(o + 1) * self.in_dim];
                let dot: f32 = weights.iter().zip(row).map(|(w, v)| w * v).sum();
                y[n * self.out_dim + o] = dot + self.b.data[o];
            }
        }
        Tensor::from_vec(vec![batch, self.out_dim], y)
    }

    /// Returns `(dx, dw, db)` for the upstream gradient `grad`.
    #[must_use]
    pub fn backward(&self, x: &Tensor, grad: &Tensor) -> (Tensor, Tensor, Tensor) {
        let batch = x.rows();
        let mut grad_input = vec![0.0; batch * self.in_dim];
        let mut grad_w = vec![0.0; self.in_dim * self.out_dim];
        let mut grad_b = vec![0.0; self.out_dim];
        for n in 0..batch {
            let row = x.row(n);
            for o in 0..self.out_dim {
                let go = grad.data[n * self.out_dim + o];
                if go == 0.0 {
                    continue;
                }
                for i in 0..self.in_dim {
                    grad_w[o * self.in_dim + i] += go * row[i];
                    grad_input[n * self.in_dim + i] += self.w.data[o * self.in_dim + i] * go;
                }
                grad_b[o] += go;
            }
        }
        (
            Tensor::from_vec(vec![batch, self.in_dim], grad_input),
            Tensor::from_vec(vec![self.out_dim, self.in_dim], grad_w),
            Tensor::from_vec(vec![self.out_dim], grad_b),
        )
    }
}

impl Layer for Dense {
    fn forward(&self, x: &Tensor) -> Tensor {
        Dense::forward(self, x)
    }

    fn backward(&self, x: &Tensor, grad: &Tensor) -> (Tensor, Vec<Tensor>) {
        let (dx, dw, db) = Dense::backward(self, x, grad);
        (dx, vec![dw, db])
    }

    fn params(&self) -> Vec<&Tensor> {
        vec![&self.w, &self.b]
    }

    fn params_mut(&mut self) -> Vec<&mut Tensor> {
        vec![&mut self.w, &mut self.b]
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Relu;

impl Layer for Relu {
    fn forward(&self, x: &Tensor) -> Tensor {
        let data: Vec<f32> = x.data.iter().map(|&v| v.max(0.0)).collect();
        Tensor::from_vec(x.shape.clone(), data)
    }

    fn backward(&self, x: &Tensor, grad: &Tensor) -> (Tensor, Vec<Tensor>) {
        let data: Vec<f32> = x
            .data
            .iter()
            .zip(&grad.data)
            .map(|(&v, &g)| if v > 0.0 { g } else { 0.0 })
            .collect();
        (Tensor::from_vec(x.shape.clone(), data), Vec::new())
    }
}

/// A stack of layers applied in order.
#[derive(Default)]
pub struct Sequential {
    layers: Vec<Box<dyn Layer>>,
}

impl Sequential {
    #[must_use]
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    pub fn push<L: Layer + 'static>(&mut self, layer: L) {
        self.layers.push(Box::new(layer));
    }

    /// Runs the stack and returns the output plus every intermediate
    /// activation, input first.
    #[must_use]
    pub fn forward(&self, x: &Tensor) -> (Tensor, Vec<Tensor>) {
        let mut out = x.clone();
        let mut activations = vec![out.clone()];
        for layer in &self.layers {
            out = layer.forward(&out);
            activations.push(out.clone());
        }
        (out, activations)
    }

    /// Output only, without keeping activations.
    #[must_use]
    pub fn infer(&self, x: &Tensor) -> Tensor {
        self.layers
            .iter()
            .fold(x.clone(), |out, layer| layer.forward(&out))
    }

    /// Backpropagates `grad` through the stack.
    ///
    /// Parameter gradients come back in the same order as [`Sequential::params`].
    #[must_use]
    pub fn backward(&self, activations: &[Tensor], grad: &Tensor) -> (Tensor, Vec<Tensor>) {
        let mut grad_out = grad.clone();
        let mut per_layer = Vec::with_capacity(self.layers.len());
        for (layer, activation) in self
            .layers
            .iter()
            .rev()
            .zip(activations.iter().rev().skip(1))
        {
            let (g_in, p) = layer.backward(activation, &grad_out);
            grad_out = g_in;
            per_layer.push(p);
        }
        per_layer.reverse();
        (grad_out, per_layer.into_iter().flatten().collect())
    }

    #[must_use]
    pub fn params(&self) -> Vec<&Tensor> {
        self.layers.iter().flat_map(|l| l.params()).collect()
    }

    pub fn params_mut(&mut self) -> Vec<&mut Tensor> {
        let mut out = Vec::new();
        for layer in &mut self.layers {
            out.extend(layer.params_mut());
        }
        out
    }
}
