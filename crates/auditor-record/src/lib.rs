//! Record model for AUDITOR: the accounting record, its components and
//! scores, and the `meta` multi-valued string map.

mod component;
mod error;
mod meta;
mod record;
mod score;

pub use component::Component;
pub use error::RecordError;
pub use meta::Meta;
pub use record::Record;
pub use score::Score;
