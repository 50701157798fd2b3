use crate::error::{DrbmError, DrbmResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Observed real-valued input unit
    Continuous,
    /// Ising spin with values {-1, +1}
    Spin,
    /// Label variable with n possible values {0, 1, ..., n-1}
    Categorical { n_categories: usize },
}

impl NodeType {
    /// The values a single unit of this type can take, if the set is finite.
    pub fn support(&self) -> Option<Vec<f64>> {
        match self {
            NodeType::Continuous => None,
            NodeType::Spin => Some(vec![-1.0, 1.0]),
            NodeType::Categorical { n_categories } => {
                Some((0..*n_categories).map(|k| k as f64).collect())
            }
        }
    }
}

/// A named layer of units sharing one node type.
///
/// The DRBM has three: the input `x` (continuous), the hidden `h` (spins),
/// and the label `y` (a single categorical variable, one-hot over `ysize`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Layer {
    name: String,
    node_type: NodeType,
    size: usize,
}

impl Layer {
    pub fn new(name: impl Into<String>, node_type: NodeType, size: usize) -> Self {
        Layer {
            name: name.into(),
            node_type,
            size,
        }
    }

    pub fn input(size: usize) -> Self {
        Layer::new("x", NodeType::Continuous, size)
    }

    pub fn hidden(size: usize) -> Self {
        Layer::new("h", NodeType::Spin, size)
    }

    pub fn label(size: usize) -> Self {
        Layer::new("y", NodeType::Categorical { n_categories: size }, size)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_type(&self) -> &NodeType {
        &self.node_type
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Fail with `IndexOutOfRange` unless `index` addresses a unit of this layer.
    pub fn check_index(&self, index: usize, context: &str) -> DrbmResult<()> {
        if index < self.size {
            Ok(())
        } else {
            Err(DrbmError::index_out_of_range(
                format!("{context} ({} layer)", self.name),
                index,
                self.size,
            ))
        }
    }

    /// Fail with `InvalidDimension` unless `got` equals the layer size.
    pub fn check_len(&self, got: usize, context: &str) -> DrbmResult<()> {
        if got == self.size {
            Ok(())
        } else {
            Err(DrbmError::invalid_dimension(
                format!("{context} ({} layer)", self.name),
                self.size,
                got,
            ))
        }
    }
}

/// The fixed layer sizes of one DRBM.
///
/// Built once and shared by the model, its trainer, and the optimizer so that
/// every buffer is allocated from the same dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topology {
    pub input: Layer,
    pub hidden: Layer,
    pub label: Layer,
}

impl Topology {
    /// `xsize` and `ysize` must be positive. `hsize` may be zero, in which
    /// case the model degenerates to a softmax over the label biases.
    pub fn new(xsize: usize, hsize: usize, ysize: usize) -> DrbmResult<Self> {
        if xsize == 0 {
            return Err(DrbmError::invalid_dimension("topology xsize", 1, 0));
        }
        if ysize == 0 {
            return Err(DrbmError::invalid_dimension("topology ysize", 1, 0));
        }
        Ok(Topology {
            input: Layer::input(xsize),
            hidden: Layer::hidden(hsize),
            label: Layer::label(ysize),
        })
    }

    pub fn xsize(&self) -> usize {
        self.input.len()
    }

    pub fn hsize(&self) -> usize {
        self.hidden.len()
    }

    pub fn ysize(&self) -> usize {
        self.label.len()
    }

    /// Number of trainable scalars: both bias vectors and both weight matrices.
    pub fn n_parameters(&self) -> usize {
        let (x, h, y) = (self.xsize(), self.hsize(), self.ysize());
        h + y + x * h + h * y
    }
}
