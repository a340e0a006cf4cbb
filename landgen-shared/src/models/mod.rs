pub mod lookup;
pub mod outcome;
