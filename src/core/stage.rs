//! Bounded retry around a single flow stage.
//!
//! A stage runs to completion (including its retries) before the next one
//! starts. Fatal errors and missing inputs are returned on the first attempt.

use crate::core::error::TbcError;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StagePolicy {
    pub max_retries: u32,
    pub wait: Duration,
}

impl StagePolicy {
    pub fn new(max_retries: u32, wait: Duration) -> Self {
        Self { max_retries, wait }
    }
}

pub fn run_stage<T, F>(name: &str, policy: StagePolicy, mut f: F) -> Result<T, TbcError>
where
    F: FnMut() -> Result<T, TbcError>,
{
    let mut attempt = 0u32;
    loop {
        log::debug!("stage {} attempt {}", name, attempt + 1);
        match f() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_terminal() || attempt >= policy.max_retries => return Err(e),
            Err(e) => {
                attempt += 1;
                log::warn!(
                    "stage {} failed ({}); retry {}/{} in {:?}",
                    name,
                    e,
                    attempt,
                    policy.max_retries,
                    policy.wait
                );
                if !policy.wait.is_zero() {
                    thread::sleep(policy.wait);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn transient() -> TbcError {
        TbcError::IoError(io::Error::other("transient"))
    }

    #[test]
    fn default_policy_runs_once() {
        let mut calls = 0;
        let result: Result<(), _> = run_stage("s", StagePolicy::default(), || {
            calls += 1;
            Err(transient())
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn retries_until_success() {
        let mut calls = 0;
        let result = run_stage("s", StagePolicy::new(3, Duration::ZERO), || {
            calls += 1;
            if calls < 3 { Err(transient()) } else { Ok(calls) }
        });
        assert_eq!(result.expect("eventually ok"), 3);
    }

    #[test]
    fn gives_up_after_max_retries() {
        let mut calls = 0;
        let result: Result<(), _> = run_stage("s", StagePolicy::new(2, Duration::ZERO), || {
            calls += 1;
            Err(transient())
        });
        assert!(result.is_err());
        assert_eq!(calls, 3);
    }

    #[test]
    fn fatal_is_never_retried() {
        let mut calls = 0;
        let result: Result<(), _> = run_stage("s", StagePolicy::new(5, Duration::ZERO), || {
            calls += 1;
            Err(TbcError::Fatal("stop".into()))
        });
        assert!(matches!(result, Err(TbcError::Fatal(_))));
        assert_eq!(calls, 1);
    }
}
