pub mod advanced;
pub mod pagination;
pub mod params;
pub mod populate;

pub use advanced::{advanced_results, AdvancedResults, QuerySpec};
pub use pagination::{PageRef, PageRequest, Pagination};
pub use params::{build_where, QueryParams};
pub use populate::{populate, strip_hidden, Populate};
