//! Pipeline step implementations.
//!
//! Each step handles one stage of a conversion, in this order:
//! Validate → Collect → Resolve → Stage → Encode.

mod collect;
mod encode;
mod resolve;
mod stage;
mod validate;

pub use collect::CollectStep;
pub use encode::EncodeStep;
pub use resolve::ResolveStep;
pub use stage::StageStep;
pub use validate::ValidateStep;
