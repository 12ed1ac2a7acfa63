//! Grid-aligned numerical helpers and the ordered collection of species fields.

use ndarray::{s, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use plate_rd_concepts::{CalcError, ConfigurationError};

/// Floating point type which can be stored in a field.
pub trait Float:
    num::Float
    + ndarray::ScalarOperand
    + core::ops::AddAssign
    + core::fmt::Debug
    + Send
    + Sync
    + 'static
{
}

impl<T> Float for T where
    T: num::Float
        + ndarray::ScalarOperand
        + core::ops::AddAssign
        + core::fmt::Debug
        + Send
        + Sync
        + 'static
{
}

/// Treatment of the cells just outside of the grid when calculating the [laplacian].
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub enum Boundary {
    /// Ghost cells mirror the adjacent edge cell.
    /// No flux crosses the border and the total mass of the field is conserved.
    #[default]
    Neumann,
    /// Ghost cells are fixed to zero.
    /// The border is absorbing and mass leaves the grid through the edge cells.
    Dirichlet,
}

/// Five-point discrete laplacian of a 2D field with uniform grid spacing `dx`.
///
/// We solve
/// \\begin{equation}
///     \Delta u_{i,j} = \frac{u_{i-1,j} + u_{i+1,j} + u_{i,j-1} + u_{i,j+1} - 4u_{i,j}}{dx^2}
/// \\end{equation}
/// where values outside of the grid are determined by the [Boundary].
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub fn laplacian<F: Float>(field: &Array2<F>, dx: F, boundary: Boundary) -> Array2<F> {
    let (nrows, ncols) = field.dim();
    if nrows == 0 || ncols == 0 {
        return Array2::zeros((nrows, ncols));
    }

    // Use helper array which is +2 in every spatial dimension larger than the original array
    // _ _ _ _ _ _ _
    // _ x x x x x _
    // _ x x x x x _
    // _ _ _ _ _ _ _
    let mut helper = Array2::<F>::zeros((nrows + 2, ncols + 2));
    helper.slice_mut(s![1..-1, 1..-1]).assign(field);

    // _ x x x x x _
    // x _ _ _ _ _ x
    // x _ _ _ _ _ x
    // _ x x x x x _
    if boundary == Boundary::Neumann {
        helper
            .slice_mut(s![0, 1..-1])
            .assign(&field.slice(s![0, ..]));
        helper
            .slice_mut(s![-1, 1..-1])
            .assign(&field.slice(s![-1, ..]));
        helper
            .slice_mut(s![1..-1, 0])
            .assign(&field.slice(s![.., 0]));
        helper
            .slice_mut(s![1..-1, -1])
            .assign(&field.slice(s![.., -1]));
    }

    let dx2 = dx.powi(-2);
    let four = F::one() + F::one() + F::one() + F::one();
    // - 4u[i,j] / dx^2
    let mut increment = &helper.slice(s![1..-1, 1..-1]) * (-four * dx2);
    // + u[i-1,j] / dx^2
    increment += &(&helper.slice(s![..-2, 1..-1]) * dx2);
    // + u[i+1,j] / dx^2
    increment += &(&helper.slice(s![2.., 1..-1]) * dx2);
    // + u[i,j-1] / dx^2
    increment += &(&helper.slice(s![1..-1, ..-2]) * dx2);
    // + u[i,j+1] / dx^2
    increment += &(&helper.slice(s![1..-1, 2..]) * dx2);
    increment
}

/// Replaces every negative (or NaN) entry by zero.
pub fn clamp_non_negative<F: Float>(field: ArrayView2<F>) -> Array2<F> {
    field.mapv(|x| x.max(F::zero()))
}

/// Ordered collection of named fields of identical shape.
///
/// This type is used for the snapshot of all species states which is handed to every
/// [Behaviour](plate_rd_concepts::Behaviour) as well as for the derivative returned by the
/// [Plate](crate::Plate).
/// The order of insertion is preserved.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(
    bound = "F: Serialize + for<'a> Deserialize<'a>",
    try_from = "FieldsRaw<F>"
)]
pub struct Fields<F> {
    names: Vec<String>,
    values: Vec<Array2<F>>,
}

/// Unchecked serialized form of [Fields]
#[derive(Deserialize)]
#[serde(bound = "F: for<'a> Deserialize<'a>")]
struct FieldsRaw<F> {
    names: Vec<String>,
    values: Vec<Array2<F>>,
}

impl<F> TryFrom<FieldsRaw<F>> for Fields<F> {
    type Error = ConfigurationError;

    fn try_from(raw: FieldsRaw<F>) -> Result<Self, Self::Error> {
        if raw.names.len() != raw.values.len() {
            return Err(ConfigurationError(format!(
                "got {} names but {} fields",
                raw.names.len(),
                raw.values.len()
            )));
        }
        let mut fields = Fields::new();
        for (name, field) in raw.names.into_iter().zip(raw.values) {
            fields.insert(name, field)?;
        }
        Ok(fields)
    }
}

impl<F> Default for Fields<F> {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<F> Fields<F> {
    /// Construct an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new field. Names have to be unique.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        field: Array2<F>,
    ) -> Result<(), ConfigurationError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(ConfigurationError(format!(
                "field with name {name} is already present"
            )));
        }
        self.names.push(name);
        self.values.push(field);
        Ok(())
    }

    /// Obtain the field of the species with the given name.
    pub fn get(&self, name: &str) -> Result<&Array2<F>, CalcError> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.values[i])
            .ok_or(CalcError(format!("no species with name {name} in state")))
    }

    /// Checks if a field with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|n| n.as_str())
    }

    /// Iterate over `(name, field)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Array2<F>)> {
        self.names.iter().map(|n| n.as_str()).zip(self.values.iter())
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// `true` if no fields are stored
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Total number of scalar values over all fields
    pub fn n_values(&self) -> usize {
        self.values.iter().map(|v| v.len()).sum()
    }
}

impl<F: Float> Fields<F> {
    /// Copy of the field with negative values clamped to zero.
    ///
    /// Every reader of another species' concentration should use this method since the stored
    /// state may transiently become negative during integration.
    pub fn clamped(&self, name: &str) -> Result<Array2<F>, CalcError> {
        Ok(clamp_non_negative(self.get(name)?.view()))
    }

    /// Concatenates all fields (in insertion order, each row-major) into one vector.
    pub fn to_flat(&self) -> nalgebra::DVector<F> {
        nalgebra::DVector::from_iterator(
            self.n_values(),
            self.values.iter().flat_map(|v| v.iter().copied()),
        )
    }

    /// Inverse of [Fields::to_flat] where `self` supplies names and shapes.
    pub fn with_flat_values(
        &self,
        flat: &nalgebra::DVector<F>,
    ) -> Result<Self, ConfigurationError> {
        if flat.len() != self.n_values() {
            return Err(ConfigurationError(format!(
                "flat state has length {} but {} values are required",
                flat.len(),
                self.n_values()
            )));
        }
        let mut offset = 0;
        let values = self
            .values
            .iter()
            .map(|v| {
                let n = v.len();
                let chunk = flat.as_slice()[offset..offset + n].to_vec();
                offset += n;
                Array2::from_shape_vec(v.dim(), chunk)
                    .map_err(|e| ConfigurationError(format!("{e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            names: self.names.clone(),
            values,
        })
    }

    /// Checks that `other` has the same names in the same order and identical shapes.
    pub fn same_layout(&self, other: &Self) -> bool {
        self.names == other.names
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|(a, b)| a.dim() == b.dim())
    }
}

/// Elementwise addition. Both operands need to share the same layout
/// (see [Fields::same_layout]); this holds for all fields produced by the same plate.
impl<'a, F: Float> core::ops::Add<&'a Fields<F>> for Fields<F> {
    type Output = Fields<F>;

    fn add(self, rhs: &'a Fields<F>) -> Self::Output {
        let Fields { names, values } = self;
        let values = values
            .into_iter()
            .zip(rhs.values.iter())
            .map(|(a, b)| a + b)
            .collect();
        Fields { names, values }
    }
}

impl<'a, F: Float> core::ops::Mul<F> for &'a Fields<F> {
    type Output = Fields<F>;

    fn mul(self, rhs: F) -> Self::Output {
        Fields {
            names: self.names.clone(),
            values: self.values.iter().map(|v| v * rhs).collect(),
        }
    }
}
