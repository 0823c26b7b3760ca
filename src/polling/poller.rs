use std::{fmt::Display, future::Future, time::Duration};

use tokio_util::sync::CancellationToken;

// Flip to silence per-attempt logging.
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    /// A fetched value satisfied the terminal predicate.
    Terminal { value: T, attempts: u32 },
    /// Every attempt was used without reaching a terminal value.
    Exhausted { last: Option<T>, attempts: u32 },
    /// The token fired; `attempts` counts fetches that were started.
    Cancelled { attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Terminal { attempts, .. }
            | PollOutcome::Exhausted { attempts, .. }
            | PollOutcome::Cancelled { attempts } => *attempts,
        }
    }
}

/// Fetches until `is_terminal` holds, the attempt budget runs out, or
/// `cancel` fires.
///
/// Attempts are strictly sequential: attempt `n + 1` is only started after
/// attempt `n` has resolved and `config.interval` has elapsed. A failed
/// fetch consumes an attempt like a non-terminal value does. `on_update`
/// receives every successfully fetched value, terminal or not, and is never
/// invoked once the token has fired.
pub async fn poll_until<T, E, F, Fut, P, U, UFut>(
    config: PollConfig,
    cancel: &CancellationToken,
    mut fetch: F,
    is_terminal: P,
    mut on_update: U,
) -> PollOutcome<T>
where
    T: Clone,
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&T) -> bool,
    U: FnMut(T, u32) -> UFut,
    UFut: Future<Output = ()>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut last = None;

    for attempt in 1..=max_attempts {
        if cancel.is_cancelled() {
            return PollOutcome::Cancelled {
                attempts: attempt - 1,
            };
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log_info!("polling cancelled during attempt {attempt}/{max_attempts}");
                return PollOutcome::Cancelled { attempts: attempt };
            }
            result = fetch(attempt) => result,
        };

        if cancel.is_cancelled() {
            return PollOutcome::Cancelled { attempts: attempt };
        }

        match result {
            Ok(value) => {
                log_debug!("poll attempt {attempt}/{max_attempts} succeeded");
                let terminal = is_terminal(&value);
                on_update(value.clone(), attempt).await;
                if terminal {
                    return PollOutcome::Terminal {
                        value,
                        attempts: attempt,
                    };
                }
                last = Some(value);
            }
            Err(err) => {
                log_warn!("poll attempt {attempt}/{max_attempts} failed: {err}");
            }
        }

        if attempt == max_attempts {
            break;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log_info!("polling cancelled while waiting after attempt {attempt}");
                return PollOutcome::Cancelled { attempts: attempt };
            }
            _ = tokio::time::sleep(config.interval) => {}
        }
    }

    log_warn!("polling gave up after {max_attempts} attempts");
    PollOutcome::Exhausted {
        last,
        attempts: max_attempts,
    }
}
