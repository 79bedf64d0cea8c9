/*
[INPUT]:  Session state, notifications, user input via terminal prompts
[OUTPUT]: Interactive front end for the todo session
[POS]:    CLI layer - module root
[UPDATE]: When adding CLI flows
*/

pub mod init;
pub mod interactive;

use console::style;
use firetodo_app::{Notification, NotificationLevel};
use tokio::sync::mpsc;

/// Print notifications until every sender is gone
pub async fn print_notifications(mut rx: mpsc::UnboundedReceiver<Notification>) {
    while let Some(notification) = rx.recv().await {
        match notification.level {
            NotificationLevel::Success => {
                println!("{} {}", style("✔").green(), notification.message)
            }
            NotificationLevel::Error => {
                println!("{} {}", style("✘").red(), style(&notification.message).red())
            }
        }
    }
}
