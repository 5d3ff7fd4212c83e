//! Polynomial rings with a noncommutative multiplication given by a
//! relation table, and their left, right and two-sided Groebner bases.

pub mod engine;
pub mod ideal;
pub mod relation;

pub use engine::{is_twosided_closed, SolvableGroebnerBase, SolvableLeft, SolvableRight};
pub use ideal::SolvableIdeal;
pub use relation::{RelationTable, SolvableRing, ValidationReport};
