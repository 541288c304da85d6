//! Directory commands

mod create;
mod delete;
mod get;
mod list;
mod update;

pub use create::CreateDirectory;
pub use delete::DeleteDirectory;
pub use get::GetDirectory;
pub use list::ListDirectories;
pub use update::UpdateDirectory;
