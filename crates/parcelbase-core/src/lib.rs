pub mod audit;
pub mod document;
pub mod error;
pub mod package;
pub mod profile;

pub use audit::{AuditLog, AuditOperation};
pub use document::Document;
pub use error::{CoreError, ErrorCategory, Result};
pub use package::{
    ConfirmationStatus, Package, PackageProcessing, PackageStatus, PackageWithProcessing,
    Priority, SenderType,
};
pub use profile::{Identity, Profile, Role};
