use crate::config::OptimizerKind;

/// Parameter update rule for one factor matrix
pub trait Optimizer: Send {
    /// `params -= update(grads)`
    fn step(&mut self, params: &mut [f32], grads: &[f32]);
}

/// plain gradient descent
#[derive(Debug)]
pub struct Sgd {
    lr: f32,
}

impl Sgd {
    pub fn new(lr: f64) -> Self {
        Self { lr: lr as f32 }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, params: &mut [f32], grads: &[f32]) {
        debug_assert_eq!(params.len(), grads.len());
        params
            .iter_mut()
            .zip(grads)
            .for_each(|(p, g)| *p -= self.lr * g);
    }
}

/// Adam
/// モーメントはパラメータと同じ長さで保持する
#[derive(Debug)]
pub struct Adam {
    lr: f64,
    beta1: f64,
    beta2: f64,
    eps: f64,
    t: i32,
    m: Vec<f64>,
    v: Vec<f64>,
}

impl Adam {
    pub fn new(lr: f64, len: usize) -> Self {
        Self {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            t: 0,
            m: vec![0.0; len],
            v: vec![0.0; len],
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [f32], grads: &[f32]) {
        debug_assert_eq!(params.len(), grads.len());
        debug_assert_eq!(params.len(), self.m.len());
        self.t += 1;
        let bias1 = 1.0 - self.beta1.powi(self.t);
        let bias2 = 1.0 - self.beta2.powi(self.t);
        for ((p, &g), (m, v)) in params
            .iter_mut()
            .zip(grads)
            .zip(self.m.iter_mut().zip(self.v.iter_mut()))
        {
            let g = g as f64;
            *m = self.beta1 * *m + (1.0 - self.beta1) * g;
            *v = self.beta2 * *v + (1.0 - self.beta2) * g * g;
            let m_hat = *m / bias1;
            let v_hat = *v / bias2;
            *p -= (self.lr * m_hat / (v_hat.sqrt() + self.eps)) as f32;
        }
    }
}

pub fn build(kind: OptimizerKind, lr: f64, len: usize) -> Box<dyn Optimizer> {
    match kind {
        OptimizerKind::Sgd => Box::new(Sgd::new(lr)),
        OptimizerKind::Adam => Box::new(Adam::new(lr, len)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sgd_moves_against_gradient() {
        let mut opt = Sgd::new(0.5);
        let mut params = vec![1.0, -1.0];
        opt.step(&mut params, &[2.0, -2.0]);
        assert_eq!(params, vec![0.0, 0.0]);
    }

    #[test]
    fn adam_first_step_is_lr_sized() {
        // bias correction 後の初回ステップは符号 * lr
        let mut opt = Adam::new(0.1, 2);
        let mut params = vec![0.0, 0.0];
        opt.step(&mut params, &[3.0, -0.5]);
        assert!((params[0] + 0.1).abs() < 1e-6);
        assert!((params[1] - 0.1).abs() < 1e-6);
    }
}
