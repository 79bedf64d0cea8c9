/*
[INPUT]:  TodoSession snapshots and user input via CLI
[OUTPUT]: Session operations dispatched from menu selections
[POS]:    CLI interactive flow
[UPDATE]: When adding menu actions
*/

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use console::style;
use dialoguer::{Confirm, Input, Password, Select, theme::ColorfulTheme};
use tracing::debug;

use firetodo_adapter::{GoogleCredential, Identity};
use firetodo_app::{NewTask, SessionError, Task, TodoSession};

enum Flow {
    Continue,
    Quit,
}

pub async fn run_interactive(session: &TodoSession) -> Result<()> {
    println!("{}", style("firetodo").bold().cyan());

    loop {
        let snapshot = session.snapshot();
        let flow = match snapshot.identity {
            None => signed_out_menu(session).await?,
            Some(identity) => signed_in_menu(session, &identity, snapshot.tasks).await?,
        };
        if let Flow::Quit = flow {
            return Ok(());
        }
    }
}

/// Run a blocking terminal prompt off the async workers
async fn prompt<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&ColorfulTheme) -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&ColorfulTheme::default()))
        .await
        .context("prompt task")?
}

async fn select(title: String, items: Vec<String>) -> Result<usize> {
    prompt(move |theme| {
        Ok(Select::with_theme(theme)
            .with_prompt(title)
            .items(&items)
            .default(0)
            .interact()?)
    })
    .await
}

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

async fn signed_out_menu(session: &TodoSession) -> Result<Flow> {
    let actions = labels(&["Sign in", "Sign up", "Sign in with Google", "Quit"]);
    let selection = select("Not signed in".to_string(), actions).await?;

    match selection {
        0 => {
            let (email, password) = prompt(|theme| prompt_credentials(theme, false)).await?;
            outcome("sign-in", session.sign_in(&email, &password).await);
        }
        1 => {
            let (email, password) = prompt(|theme| prompt_credentials(theme, true)).await?;
            outcome("sign-up", session.sign_up(&email, &password).await);
        }
        2 => {
            println!(
                "{}",
                style("Paste a Google ID token obtained from the Google sign-in flow.").dim()
            );
            let token: String = prompt(|theme| {
                Ok(Input::with_theme(theme)
                    .with_prompt("Google ID token")
                    .interact_text()?)
            })
            .await?;
            let credential = GoogleCredential::IdToken(token.trim().to_string());
            outcome("google sign-in", session.sign_in_with_google(&credential).await);
        }
        _ => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

async fn signed_in_menu(
    session: &TodoSession,
    identity: &Identity,
    tasks: Vec<Task>,
) -> Result<Flow> {
    let actions = labels(&[
        "List tasks",
        "Add task",
        "Toggle task",
        "Delete task",
        "Refresh",
        "Sign out",
        "Quit",
    ]);
    let selection = select(format!("Signed in as {}", identity.label()), actions).await?;

    match selection {
        0 => print_tasks(&tasks),
        1 => {
            let task = prompt(prompt_new_task).await?;
            outcome("create task", session.create_task(task).await);
        }
        2 => {
            if let Some(task) = select_task(tasks, "Toggle which task?").await? {
                outcome("toggle task", session.toggle_task(&task).await);
            }
        }
        3 => {
            if let Some(task) = select_task(tasks, "Delete which task?").await? {
                let question = format!("Delete \"{}\"?", task.title);
                let confirmed = prompt(move |theme| {
                    Ok(Confirm::with_theme(theme)
                        .with_prompt(question)
                        .default(false)
                        .interact()?)
                })
                .await?;
                if confirmed {
                    outcome("delete task", session.delete_task(&task.id).await);
                }
            }
        }
        4 => outcome("fetch tasks", session.fetch_tasks().await),
        5 => outcome("sign-out", session.sign_out().await),
        _ => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn prompt_credentials(theme: &ColorfulTheme, confirm: bool) -> Result<(String, String)> {
    let email: String = Input::with_theme(theme)
        .with_prompt("Email")
        .interact_text()?;
    let mut password = Password::with_theme(theme).with_prompt("Password");
    if confirm {
        password = password.with_confirmation("Repeat password", "Passwords do not match");
    }
    Ok((email.trim().to_string(), password.interact()?))
}

fn prompt_new_task(theme: &ColorfulTheme) -> Result<NewTask> {
    let title: String = Input::with_theme(theme)
        .with_prompt("Title")
        .interact_text()?;

    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    let due_date: String = Input::with_theme(theme)
        .with_prompt("Due date (YYYY-MM-DD)")
        .default(today)
        .validate_with(|input: &String| -> Result<(), String> {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .map(|_| ())
                .map_err(|_| "expected a date like 2024-01-01".to_string())
        })
        .interact_text()?;

    let priority: i64 = Input::with_theme(theme)
        .with_prompt("Priority")
        .default(1)
        .interact_text()?;

    Ok(NewTask::new(title, due_date, priority))
}

async fn select_task(mut tasks: Vec<Task>, title: &str) -> Result<Option<Task>> {
    if tasks.is_empty() {
        println!("{}", style("No tasks found.").yellow());
        return Ok(None);
    }

    let items: Vec<String> = tasks.iter().map(task_line).collect();
    let selection = select(title.to_string(), items).await?;
    Ok(Some(tasks.swap_remove(selection)))
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("{}", style("No tasks yet.").yellow());
        return;
    }
    for task in tasks {
        println!("  {}", task_line(task));
    }
}

fn task_line(task: &Task) -> String {
    let mark = if task.completed { "[x]" } else { "[ ]" };
    format!(
        "{} {} | due {} | priority {}",
        mark, task.title, task.due_date, task.priority
    )
}

/// Failures were already notified by the session
fn outcome<T>(action: &str, result: std::result::Result<T, SessionError>) {
    match result {
        Ok(_) => debug!(action, "completed"),
        Err(SessionError::EmptyTitle) => {
            println!("{}", style("A task needs a title.").yellow())
        }
        Err(SessionError::EmptyPatch) => {
            println!("{}", style("Nothing to update.").yellow())
        }
        Err(err) => debug!(action, error = %err, "failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prompt_returns_closure_value() {
        let value = prompt(|_theme| Ok(42)).await.unwrap();
        assert_eq!(value, 42);

        let err = prompt(|_theme| -> Result<()> { Err(anyhow::anyhow!("cancelled")) })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "cancelled");
    }

    #[test]
    fn test_task_line() {
        let task = Task {
            id: "t1".to_string(),
            title: "Buy milk".to_string(),
            due_date: "2024-01-01".to_string(),
            completed: true,
            priority: 2,
            user_id: "uid-a".to_string(),
        };
        assert_eq!(task_line(&task), "[x] Buy milk | due 2024-01-01 | priority 2");
    }
}
