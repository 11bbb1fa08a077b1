pub mod context;
pub mod eval;
pub mod ordering;
pub mod parallel;
pub mod pesto;
pub mod picker;
pub mod search;
pub mod see;
pub mod tt;

pub use search::search;
