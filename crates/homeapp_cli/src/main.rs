//! CLI smoke entry point.
//!
//! Prints the core version, and with a database path argument, a summary of
//! the stored household and its pending reminders. Names and titles are not
//! printed.

use homeapp_core::db::open_db;
use homeapp_core::format_deadline;
use homeapp_core::repo::datetime::from_epoch_millis;
use homeapp_core::repo::family_repo::{FamilyRepository, SqliteFamilyRepository};
use homeapp_core::repo::reminder_repo::{ReminderJobRepository, SqliteReminderJobRepository};
use homeapp_core::repo::RepoResult;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("homeapp_core ping={}", homeapp_core::ping());
    println!("homeapp_core version={}", homeapp_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    match summarize(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("homeapp_cli error={err}");
            ExitCode::FAILURE
        }
    }
}

fn summarize(db_path: &str) -> RepoResult<()> {
    let mut conn = open_db(db_path)?;

    let members = SqliteFamilyRepository::new(&mut conn).list_members_with_tasks()?;
    let tasks = members.iter().map(|member| member.tasks.len()).sum::<usize>();
    let open = members
        .iter()
        .flat_map(|member| member.tasks.iter())
        .filter(|task| !task.is_done)
        .count();
    println!("members={} tasks={} open_tasks={}", members.len(), tasks, open);

    let pending = SqliteReminderJobRepository::new(&conn).list_pending()?;
    println!("pending_reminders={}", pending.len());
    for job in pending {
        let due = from_epoch_millis(job.fire_at_ms)?;
        println!(
            "  reminder job_id={} task_id={} due=\"{}\"",
            job.id,
            job.task_id,
            format_deadline(due)
        );
    }
    Ok(())
}
