//! Traits needed to call query methods, the codec derives and the
//! constructors.

pub use crate::codec::{Decode, Encode};
pub use crate::database::Database;
pub use crate::query::{query, Query};
pub use crate::query0::{query0, Query0};
pub use tquery_macros::{Decode, Encode};
