//! Submodules of free modules over commutative and solvable rings.

pub mod element;
pub mod engine;

pub use element::{ModuleElement, ModuleOrd, PositionOverTerm, TermOverPosition};
pub use engine::{contains, is_syzygy, is_syzygy_list, syzygies, ModuleGroebnerBase, SolvableModuleGroebnerBase};
