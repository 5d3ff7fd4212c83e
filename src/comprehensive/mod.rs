//! Groebner bases of ideals whose coefficients depend on parameters.
//!
//! A Groebner system splits the parameter space into branches, each given by
//! a [`Condition`], and computes a basis per branch that specialises to a
//! Groebner basis for every parameter value inside it. The union of the
//! branch bases is a comprehensive Groebner basis.

pub mod condition;
pub mod regular;
pub mod system;

pub use condition::{Color, Condition};
pub use regular::{regular_representation, to_product_res, RegularGroebnerBase};
pub use system::{gb_system, is_cgb_system, ColoredSystem, ComprehensiveGroebnerBase, GroebnerSystem, ParamPoly};
