use futures::future::join_all;
use std::future::Future;
use std::str::FromStr;

/// What one fanned-out task ended with.
#[derive(Debug)]
pub enum TaskOutcome<T, E> {
    Produced(T),
    Empty,
    Failed(E),
}

impl<T, E> From<Result<Option<T>, E>> for TaskOutcome<T, E> {
    fn from(result: Result<Option<T>, E>) -> Self {
        match result {
            Ok(Some(value)) => TaskOutcome::Produced(value),
            Ok(None) => TaskOutcome::Empty,
            Err(err) => TaskOutcome::Failed(err),
        }
    }
}

/// How a failed task affects the group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Failed tasks are dropped like empty ones.
    #[default]
    DropFailed,
    /// The first failed task (in input order) fails the group.
    AbortOnFailure,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drop" | "drop_failed" => Ok(FailurePolicy::DropFailed),
            "abort" | "abort_on_failure" => Ok(FailurePolicy::AbortOnFailure),
            other => Err(format!("unknown failure policy '{}'", other)),
        }
    }
}

/// Runs every task concurrently and waits for all of them.
/// Outcomes come back in input order.
pub async fn join_outcomes<I, F, T, E>(tasks: I) -> Vec<TaskOutcome<T, E>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<Option<T>, E>>,
{
    join_all(tasks)
        .await
        .into_iter()
        .map(TaskOutcome::from)
        .collect()
}

/// Keeps produced values in order. Under `AbortOnFailure` returns the index
/// and error of the first failed task instead.
pub fn collect_produced<T, E>(
    outcomes: Vec<TaskOutcome<T, E>>,
    policy: FailurePolicy,
) -> Result<Vec<T>, (usize, E)> {
    let mut produced = Vec::with_capacity(outcomes.len());
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            TaskOutcome::Produced(value) => produced.push(value),
            TaskOutcome::Empty => {}
            TaskOutcome::Failed(err) => {
                if policy == FailurePolicy::AbortOnFailure {
                    return Err((index, err));
                }
            }
        }
    }
    Ok(produced)
}
