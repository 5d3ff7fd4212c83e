pub mod coefficient;
pub mod monomial;
pub mod polynomial;
pub mod product;
pub mod residue;
pub mod ring;
