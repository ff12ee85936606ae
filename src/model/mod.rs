//! The learned index itself: leaves, arena, per-submodel directories,
//! piecewise-linear submodels, and the upper index that routes a key to one.

pub mod arena;
pub mod leaf;
pub mod leaf_table;
pub mod model_arena;
pub mod plr;
pub mod submodel;

pub use arena::LeafArena;
pub use leaf::{Leaf, K_INVALID};
pub use leaf_table::LeafTable;
pub use model_arena::ModelArena;
pub use plr::PlrBuilder;
pub use submodel::{LinearModel, SubModel};
