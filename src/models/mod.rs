// import modules
mod post;
mod api;
pub mod raw;

// export modules
pub use post::*;
pub use api::*;
pub use raw::RawRecord;
