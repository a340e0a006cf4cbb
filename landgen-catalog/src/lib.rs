pub mod keywords;
pub mod coverage;

pub use keywords::{KeywordPolicy, KeywordRejection, ParsedKeywords};
pub use coverage::{CoverageEdge, CoverageIndex};
