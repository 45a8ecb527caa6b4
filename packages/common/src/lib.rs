pub mod clock;
pub mod error;
pub mod result;
pub mod storage;

pub use clock::*;
pub use error::*;
pub use result::*;
pub use storage::*;
