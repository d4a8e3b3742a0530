use {
    crate::{
        client::{Backend, ClientError},
        config::PollConfig,
        protocol::{ForceReport, GraspState, StatusReport},
    },
    flume::{unbounded, Receiver, RecvTimeoutError, Sender},
    std::{
        sync::Arc,
        time::{Duration, Instant},
    },
};

/// Backend resources polled on a fixed interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Status,
    Force,
    GraspStatus,
}

impl Endpoint {
    pub const ALL: [Endpoint; 3] =
        [Endpoint::Status, Endpoint::Force, Endpoint::GraspStatus];

    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Status => "status",
            Endpoint::Force => "force_data",
            Endpoint::GraspStatus => "grasp_status",
        }
    }
}

/// Reply of a single poll request.
#[derive(Debug)]
pub enum Update {
    Status(Result<StatusReport, ClientError>),
    Force(Result<ForceReport, ClientError>),
    GraspStatus(Result<GraspState, ClientError>),
}

impl Update {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Update::Status(_) => Endpoint::Status,
            Update::Force(_) => Endpoint::Force,
            Update::GraspStatus(_) => Endpoint::GraspStatus,
        }
    }

    fn fetch(endpoint: Endpoint, backend: &dyn Backend) -> Self {
        match endpoint {
            Endpoint::Status => Update::Status(backend.status()),
            Endpoint::Force => Update::Force(backend.force_data()),
            Endpoint::GraspStatus => {
                Update::GraspStatus(backend.grasp_status())
            }
        }
    }
}

struct Schedule {
    endpoint: Endpoint,
    interval: Duration,
    next_due: Instant,
    in_flight: bool,
}

/// Fixed-interval poller with one outstanding request per endpoint.
///
/// Requests run on worker threads and their replies are handed back
/// through [`Poller::recv_deadline`] on the thread that owns the poller.
/// An endpoint whose previous request has not replied yet is skipped.
pub struct Poller {
    backend: Arc<dyn Backend>,
    schedules: Vec<Schedule>,
    send_updates: Sender<Update>,
    recv_updates: Receiver<Update>,
}

impl Poller {
    pub fn new(backend: Arc<dyn Backend>, config: &PollConfig, now: Instant) -> Self {
        let (send_updates, recv_updates) = unbounded();

        let schedules = Endpoint::ALL
            .iter()
            .map(|&endpoint| Schedule {
                endpoint,
                interval: config.interval(endpoint),
                next_due: now,
                in_flight: false,
            })
            .collect();

        Poller {
            backend,
            schedules,
            send_updates,
            recv_updates,
        }
    }

    /// Starts requests for every endpoint that is due and idle.
    /// Returns number of requests started.
    pub fn poll(&mut self, now: Instant) -> usize {
        let mut started = 0;

        for schedule in &mut self.schedules {
            if now < schedule.next_due {
                continue;
            }
            schedule.next_due = now + schedule.interval;

            if schedule.in_flight {
                tracing::trace!(
                    "Skipping '{}', previous request is in flight",
                    schedule.endpoint.name()
                );
                continue;
            }

            let endpoint = schedule.endpoint;
            let backend = self.backend.clone();
            let send_updates = self.send_updates.clone();

            let spawned = std::thread::Builder::new()
                .name(format!("poll-{}", endpoint.name()))
                .spawn(move || {
                    let update = Update::fetch(endpoint, &*backend);
                    let _ = send_updates.send(update);
                });

            match spawned {
                Ok(_) => {
                    schedule.in_flight = true;
                    started += 1;
                }
                Err(err) => {
                    tracing::error!(
                        "Failed to spawn request for '{}': {}",
                        endpoint.name(),
                        err
                    );
                }
            }
        }

        started
    }

    /// Earliest instant at which some endpoint becomes due.
    pub fn next_due(&self) -> Option<Instant> {
        self.schedules.iter().map(|s| s.next_due).min()
    }

    pub fn is_in_flight(&self, endpoint: Endpoint) -> bool {
        self.schedules
            .iter()
            .any(|s| s.endpoint == endpoint && s.in_flight)
    }

    /// Waits until a reply arrives or `deadline` passes.
    pub fn recv_deadline(&mut self, deadline: Instant) -> Option<Update> {
        match self.recv_updates.recv_deadline(deadline) {
            Ok(update) => {
                self.settle(&update);
                Some(update)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => unreachable!(
                "Poller holds a sender, channel can't be disconnected"
            ),
        }
    }

    /// Replies that already arrived, without waiting.
    pub fn drain(&mut self) -> Vec<Update> {
        let updates: Vec<Update> = self.recv_updates.try_iter().collect();
        for update in &updates {
            self.settle(update);
        }
        updates
    }

    fn settle(&mut self, update: &Update) {
        let endpoint = update.endpoint();
        for schedule in &mut self.schedules {
            if schedule.endpoint == endpoint {
                schedule.in_flight = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::protocol::{CommandReply, GraspCommand},
        std::sync::atomic::{AtomicUsize, Ordering},
    };

    /// Backend whose status requests block until released.
    struct GatedBackend {
        status_calls: AtomicUsize,
        gate: Receiver<()>,
    }

    impl Backend for GatedBackend {
        fn status(&self) -> Result<StatusReport, ClientError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            let _ = self.gate.recv();
            Ok(StatusReport::default())
        }

        fn force_data(&self) -> Result<ForceReport, ClientError> {
            Ok(ForceReport::default())
        }

        fn grasp_status(&self) -> Result<GraspState, ClientError> {
            Err(ClientError::Rejected {
                msg: "offline".to_owned(),
            })
        }

        fn set_dof(&self, _dof: u8, _value: i32) -> Result<String, ClientError> {
            unimplemented!()
        }

        fn command(&self, _cmd: &str) -> Result<CommandReply, ClientError> {
            unimplemented!()
        }

        fn grasp(&self, _cmd: GraspCommand) -> Result<CommandReply, ClientError> {
            unimplemented!()
        }
    }

    /// Collects replies until every endpoint in `endpoints` replied once.
    fn wait_for(poller: &mut Poller, endpoints: &[Endpoint]) -> Vec<Update> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut updates: Vec<Update> = Vec::new();
        while !endpoints
            .iter()
            .all(|&e| updates.iter().any(|u| u.endpoint() == e))
        {
            match poller.recv_deadline(deadline) {
                Some(update) => updates.push(update),
                None => panic!("no reply from {:?}", endpoints),
            }
        }
        updates
    }

    #[test]
    fn in_flight_endpoint_is_skipped() {
        let (release, gate) = unbounded();
        let backend = Arc::new(GatedBackend {
            status_calls: AtomicUsize::new(0),
            gate,
        });
        let config = PollConfig::default();
        let start = Instant::now();
        let mut poller = Poller::new(backend.clone(), &config, start);

        assert_eq!(poller.poll(start), 3);
        assert!(poller.is_in_flight(Endpoint::Status));

        // Force and grasp status reply right away, status stays blocked.
        let later = start + Duration::from_secs(1);
        wait_for(&mut poller, &[Endpoint::Force, Endpoint::GraspStatus]);
        assert_eq!(poller.poll(later), 2);

        release.send(()).unwrap();
        let status = wait_for(&mut poller, &[Endpoint::Status])
            .into_iter()
            .find(|u| u.endpoint() == Endpoint::Status);
        match status {
            Some(Update::Status(Ok(report))) => assert!(report.is_empty()),
            other => panic!("unexpected update {:?}", other),
        }
        assert_eq!(backend.status_calls.load(Ordering::SeqCst), 1);
        assert!(!poller.is_in_flight(Endpoint::Status));

        let even_later = later + config.interval(Endpoint::Status);
        poller.poll(even_later);
        release.send(()).unwrap();
        wait_for(&mut poller, &[Endpoint::Status]);
        assert_eq!(backend.status_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn endpoints_wait_for_their_interval() {
        let (_release, gate) = unbounded();
        let backend = Arc::new(GatedBackend {
            status_calls: AtomicUsize::new(0),
            gate,
        });
        let config = PollConfig::default();
        let start = Instant::now();
        let mut poller = Poller::new(backend, &config, start);

        poller.poll(start);
        wait_for(&mut poller, &[Endpoint::Force]);
        assert_eq!(
            poller.next_due(),
            Some(start + config.interval(Endpoint::Status))
        );

        let before_force_due =
            start + config.interval(Endpoint::Force) - Duration::from_millis(1);
        assert_eq!(poller.poll(before_force_due), 0);
    }
}
