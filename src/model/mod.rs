pub mod account;
pub mod child;
pub mod document;
pub mod group;

pub use account::{Account, AccountId, Role};
pub use child::{Child, ChildId, ChildRecord, RecordId, RecordKind};
pub use document::{Document, DocumentId, DocumentStatus};
pub use group::{Group, GroupId};
