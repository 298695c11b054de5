// Service exports
pub mod history;
pub mod notifier;
pub mod roster;

pub use history::{HistoryError, HistoryStore};
pub use notifier::{notify_all, LogNotifier, Notifier, NotifyError, SmtpNotifier};
pub use roster::{load_roster, read_roster, RosterError};
