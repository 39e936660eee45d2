pub mod completion;
pub mod errors;
pub mod pagination;
pub mod todo;

pub use completion::*;
pub use errors::*;
pub use pagination::*;
pub use todo::*;
