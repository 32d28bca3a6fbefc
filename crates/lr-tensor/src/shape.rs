use std::fmt;

/// Concrete dimensions of a tensor, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    pub fn new(dims: Vec<usize>) -> Self {
        Shape { dims }
    }

    /// Rank.
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Element count; `1` for a scalar.
    pub fn numel(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_dims(f, self.dims.iter())
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape::new(dims)
    }
}

/// One dimension of a declared slot shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dim {
    /// The dimension must have exactly this size.
    Fixed(usize),
    /// Unbound at load time; any size is accepted.
    Dynamic,
}

impl Dim {
    /// Whether a concrete size satisfies this declared dimension.
    pub fn accepts(&self, size: usize) -> bool {
        match self {
            Dim::Fixed(d) => *d == size,
            Dim::Dynamic => true,
        }
    }

    /// Decode a signed dimension where `-1` marks a dynamic dimension.
    /// Any other negative value is rejected.
    pub fn from_signed(d: i64) -> Option<Dim> {
        match d {
            -1 => Some(Dim::Dynamic),
            d if d >= 0 => Some(Dim::Fixed(d as usize)),
            _ => None,
        }
    }

    /// Declared shape with every dimension fixed.
    pub fn all_fixed(dims: &[usize]) -> Vec<Dim> {
        dims.iter().map(|&d| Dim::Fixed(d)).collect()
    }

    /// Inverse of [`Dim::from_signed`].
    pub fn to_signed(&self) -> i64 {
        match self {
            Dim::Fixed(d) => *d as i64,
            Dim::Dynamic => -1,
        }
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Fixed(d) => write!(f, "{}", d),
            Dim::Dynamic => write!(f, "?"),
        }
    }
}

/// Formats a declared shape as e.g. `[?, 224, 224, 3]`.
pub fn format_dims(dims: &[Dim]) -> String {
    struct Dims<'a>(&'a [Dim]);
    impl fmt::Display for Dims<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write_dims(f, self.0.iter())
        }
    }
    Dims(dims).to_string()
}

fn write_dims<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    dims: impl Iterator<Item = T>,
) -> fmt::Result {
    write!(f, "[")?;
    for (i, d) in dims.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", d)?;
    }
    write!(f, "]")
}
