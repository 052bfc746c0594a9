//! Mock construction helpers

use libera_dummy::signal::{
    SignalError, SignalFactory, SignalInfo, SignalRole, SignalSource, SignalState,
};
use mockall::mock;
use std::sync::{Arc, Mutex};

mock! {
    pub Source {}

    impl SignalSource for Source {
        fn name(&self) -> String;
        fn state(&self) -> SignalState;
        fn info(&self) -> SignalInfo;
        fn read(&self, count: usize) -> Result<Vec<i32>, SignalError>;
        fn shut_down(&self) -> Result<(), SignalError>;
    }
}

/// Mock source that appends its name to `log` when stopped.
///
/// Expects exactly one `shut_down` call.
pub fn recording_source(name: &str, log: &Arc<Mutex<Vec<String>>>, fails: bool) -> MockSource {
    let mut mock = MockSource::new();
    mock.expect_name().return_const(name.to_string());
    mock.expect_state().return_const(SignalState::Running);
    mock.expect_read().returning(|count| Ok(vec![0; count]));
    let info_name = name.to_string();
    mock.expect_info().returning(move || SignalInfo {
        name: info_name.clone(),
        state: SignalState::Running,
        sample_rate_hz: 1.0,
        samples_read: 0,
        started_at: None,
        stopped_at: None,
    });

    let log = Arc::clone(log);
    let stop_name = name.to_string();
    mock.expect_shut_down().times(1).returning(move || {
        log.lock().unwrap().push(stop_name.clone());
        if fails {
            Err(SignalError::StopFailed {
                name: stop_name.clone(),
                reason: "simulated failure".to_string(),
            })
        } else {
            Ok(())
        }
    });
    mock
}

/// Factory handing out [`recording_source`] mocks.
#[derive(Default)]
pub struct RecordingFactory {
    /// Names in creation order
    pub created: Arc<Mutex<Vec<String>>>,
    /// Names in shutdown order
    pub stopped: Arc<Mutex<Vec<String>>>,
    failing: Vec<String>,
    refuse: Option<String>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the named source report failure when stopped
    pub fn failing(mut self, name: &str) -> Self {
        self.failing.push(name.to_string());
        self
    }

    /// Refuse to create the named source
    pub fn refusing(mut self, name: &str) -> Self {
        self.refuse = Some(name.to_string());
        self
    }
}

impl SignalFactory for RecordingFactory {
    fn create(&self, board: &str, role: SignalRole) -> Result<Arc<dyn SignalSource>, SignalError> {
        let name = format!("{}/{}", board, role.name());
        if self.refuse.as_deref() == Some(name.as_str()) {
            return Err(SignalError::Create {
                name,
                reason: "refused".to_string(),
            });
        }
        self.created.lock().unwrap().push(name.clone());
        let fails = self.failing.contains(&name);
        Ok(Arc::new(recording_source(&name, &self.stopped, fails)))
    }
}
