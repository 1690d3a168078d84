pub mod session;
pub mod students;
pub mod users;

pub use session::{Action, SessionContext, SessionProvider};
pub use students::{ConfirmationPrompt, PendingDelete, RecordController};
pub use users::{PendingUserDelete, UserManagementController};
