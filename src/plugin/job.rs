//! Polling of the asynchronous server-side install job.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::msg::{Msg, Observer};
use crate::plugin::http::HttpError;
use crate::plugin::upm::PluginHost;

/// Fixed delay between two status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Body of the install status endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct InstallJobStatus {
    #[serde(default)]
    pub done: bool,
    /// Fraction in `[0, 1]`.
    #[serde(default)]
    pub progress: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JobState {
    Pending { progress: f64 },
    Done,
}

impl InstallJobStatus {
    pub fn state(&self) -> JobState {
        if self.done {
            JobState::Done
        } else {
            JobState::Pending {
                progress: self.progress,
            }
        }
    }
}

/// Blocking sleep source, swapped for a fake in tests.
pub trait Clock {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Poll `status_url` until the job reports done. Returns the number of polls.
///
/// There is no upper bound on the wait: install jobs take as long as the
/// server needs, and the loop ends only on `done` or on a failed poll.
pub fn wait_for_completion(
    host: &dyn PluginHost,
    clock: &dyn Clock,
    observer: &dyn Observer,
    status_url: &Url,
) -> Result<usize, HttpError> {
    let mut polls = 0;
    loop {
        let status = host.install_status(status_url)?;
        polls += 1;

        match status.state() {
            JobState::Done => return Ok(polls),
            JobState::Pending { progress } => {
                observer.notify(Msg::InstallPending {
                    percent: progress * 100.0,
                });
                clock.sleep(POLL_INTERVAL);
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::path::Path;

    use super::testing::FakeClock;
    use super::*;
    use crate::msg::testing::RecordingObserver;
    use crate::plugin::error::FetchFailure;
    use crate::plugin::upm::{Inventory, SessionToken, UploadReceipt};

    struct ScriptedStatus {
        replies: RefCell<VecDeque<Result<InstallJobStatus, HttpError>>>,
        polls: Cell<usize>,
    }

    impl ScriptedStatus {
        fn new(replies: Vec<Result<InstallJobStatus, HttpError>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                polls: Cell::new(0),
            }
        }
    }

    impl PluginHost for ScriptedStatus {
        fn inventory(&self) -> Result<Inventory, FetchFailure> {
            unreachable!()
        }

        fn upload(&self, _: &Path, _: Option<&SessionToken>) -> Result<UploadReceipt, HttpError> {
            unreachable!()
        }

        fn install_status(&self, _: &Url) -> Result<InstallJobStatus, HttpError> {
            self.polls.set(self.polls.get() + 1);
            self.replies
                .borrow_mut()
                .pop_front()
                .expect("poll past the scripted replies")
        }
    }

    fn status_url() -> Url {
        Url::parse("https://jira.example.com/rest/plugins/1.0/pending/1").unwrap()
    }

    #[test]
    fn pending_then_done_polls_twice_and_sleeps_once() {
        let host = ScriptedStatus::new(vec![
            Ok(InstallJobStatus {
                done: false,
                progress: 0.3,
            }),
            Ok(InstallJobStatus {
                done: true,
                progress: 1.0,
            }),
        ]);
        let clock = FakeClock::default();
        let observer = RecordingObserver::default();

        let polls = wait_for_completion(&host, &clock, &observer, &status_url()).unwrap();

        assert_eq!(polls, 2);
        assert_eq!(host.polls.get(), 2);
        assert_eq!(*clock.sleeps.borrow(), vec![Duration::from_secs(5)]);
        match observer.messages().as_slice() {
            [Msg::InstallPending { percent }] => assert!((percent - 30.0).abs() < 1e-9),
            other => panic!("unexpected messages: {other:?}"),
        }
    }

    #[test]
    fn done_on_first_poll_never_sleeps() {
        let host = ScriptedStatus::new(vec![Ok(InstallJobStatus {
            done: true,
            progress: 0.0,
        })]);
        let clock = FakeClock::default();
        let observer = RecordingObserver::default();

        assert_eq!(wait_for_completion(&host, &clock, &observer, &status_url()).unwrap(), 1);
        assert!(clock.sleeps.borrow().is_empty());
        assert!(observer.messages().is_empty());
    }

    #[test]
    fn failed_poll_ends_the_wait() {
        let host = ScriptedStatus::new(vec![
            Ok(InstallJobStatus::default()),
            Err(HttpError::Status {
                status: 500,
                url: status_url().to_string(),
                body: String::new(),
            }),
        ]);
        let clock = FakeClock::default();
        let observer = RecordingObserver::default();

        let err = wait_for_completion(&host, &clock, &observer, &status_url()).unwrap_err();
        assert!(matches!(err, HttpError::Status { status: 500, .. }));
        assert_eq!(clock.sleeps.borrow().len(), 1);
    }

    #[test]
    fn status_body_defaults() {
        let status: InstallJobStatus = crate::plugin::http::decode("u", b"{}").unwrap();
        assert_eq!(status.state(), JobState::Pending { progress: 0.0 });

        let status: InstallJobStatus =
            crate::plugin::http::decode("u", br#"{"done": true, "progress": 0.5}"#).unwrap();
        assert_eq!(status.state(), JobState::Done);
    }
}
