//! Terminal side of the job event channel.

use std::io::{self, BufRead, Write};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::debug;

use soundpost_core::{JobEvent, JobOutcome};

/// How overwrite prompts are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwritePolicy {
    Ask,
    Always,
    Never,
}

/// Interprets a typed answer. Anything but yes is no.
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn ask_overwrite(path: &Path) -> bool {
    let mut stderr = io::stderr();
    let _ = write!(stderr, "{} already exists. Overwrite? [y/N] ", path.display());
    let _ = stderr.flush();

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(0) | Err(_) => false,
        Ok(_) => is_yes(&answer),
    }
}

async fn decide(policy: OverwritePolicy, path: &Path) -> bool {
    match policy {
        OverwritePolicy::Always => true,
        OverwritePolicy::Never => false,
        OverwritePolicy::Ask => {
            let path = path.to_path_buf();
            tokio::task::spawn_blocking(move || ask_overwrite(&path))
                .await
                .unwrap_or(false)
        }
    }
}

/// Consumes events until the job finishes and returns its outcome.
///
/// `None` means the worker went away without reporting one.
pub async fn present(
    mut events: mpsc::Receiver<JobEvent>,
    policy: OverwritePolicy,
) -> Option<JobOutcome> {
    while let Some(event) = events.recv().await {
        match event {
            JobEvent::State(state) => debug!("state: {}", state),
            JobEvent::Log(line) => println!("{}", line),
            JobEvent::ConfirmOverwrite { path, reply } => {
                let overwrite = decide(policy, &path).await;
                let _ = reply.send(overwrite);
            }
            JobEvent::Finished(outcome) => return Some(outcome),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundpost_core::JobState;
    use std::path::PathBuf;
    use tokio::sync::oneshot;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }

    #[tokio::test]
    async fn test_present_answers_with_policy() {
        let (tx, rx) = mpsc::channel(8);
        let (reply, answer) = oneshot::channel();

        tx.send(JobEvent::State(JobState::Finalizing)).await.unwrap();
        tx.send(JobEvent::ConfirmOverwrite {
            path: PathBuf::from("/tmp/clip.mp4"),
            reply,
        })
        .await
        .unwrap();
        tx.send(JobEvent::Finished(JobOutcome::CancelledByUser))
            .await
            .unwrap();
        drop(tx);

        let outcome = present(rx, OverwritePolicy::Never).await;
        assert_eq!(outcome, Some(JobOutcome::CancelledByUser));
        assert!(!answer.await.unwrap());
    }

    #[tokio::test]
    async fn test_present_without_outcome() {
        let (tx, rx) = mpsc::channel(8);
        drop(tx);
        assert_eq!(present(rx, OverwritePolicy::Always).await, None);
    }
}
