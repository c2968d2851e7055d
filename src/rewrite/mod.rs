//! Request body rewriting.

pub mod thinking;

pub use thinking::BodyRewrite;
pub use thinking::INTERLEAVED_THINKING_BETA;
