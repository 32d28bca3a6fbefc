use lr_tensor::Tensor;

/// Caller-supplied inputs for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Inputs {
    /// Bound to input slots by position.
    Positional(Vec<Tensor>),
    /// Bound by name. Entry order matters: the first entry whose key matches
    /// a slot wins.
    Named(Vec<(String, Tensor)>),
    /// A bare tensor, valid only for models with exactly one input.
    Single(Tensor),
}

impl Inputs {
    /// Number of tensors supplied.
    pub fn len(&self) -> usize {
        match self {
            Inputs::Positional(v) => v.len(),
            Inputs::Named(v) => v.len(),
            Inputs::Single(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Tensor> for Inputs {
    fn from(t: Tensor) -> Self {
        Inputs::Single(t)
    }
}

impl From<Vec<Tensor>> for Inputs {
    fn from(v: Vec<Tensor>) -> Self {
        Inputs::Positional(v)
    }
}

impl<const N: usize> From<[Tensor; N]> for Inputs {
    fn from(v: [Tensor; N]) -> Self {
        Inputs::Positional(v.into())
    }
}

impl<K: Into<String>> From<Vec<(K, Tensor)>> for Inputs {
    fn from(v: Vec<(K, Tensor)>) -> Self {
        Inputs::Named(v.into_iter().map(|(k, t)| (k.into(), t)).collect())
    }
}

impl<K: Into<String>, const N: usize> From<[(K, Tensor); N]> for Inputs {
    fn from(v: [(K, Tensor); N]) -> Self {
        Inputs::Named(v.into_iter().map(|(k, t)| (k.into(), t)).collect())
    }
}
