mod date_of_birth;
mod document;
mod download;
mod entry;
mod status;
mod summary;
mod two_factor;

pub use date_of_birth::DateOfBirthPage;
pub use document::{DocumentNumber, DocumentType};
pub use download::Download;
pub use entry::EntryPage;
pub use status::{Confirmation, ProveStatus, PurposeSelection};
pub use summary::Summary;
pub use two_factor::{TwoFactorCode, TwoFactorMethodChoice};
