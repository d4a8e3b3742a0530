use {
    crate::{
        client::Backend,
        config::GraspCycleConfig,
        protocol::{GraspCommand, RESET_GRASP},
    },
    flume::{Receiver, RecvTimeoutError},
    std::time::{Duration, Instant},
};

/// Repeated grasp and release of whatever is in the hand.
///
/// Each cycle starts a grasp, holds it, resets the hand and waits before
/// the next one. Command failures are logged and the cycle goes on.
#[derive(Clone, Debug)]
pub struct GraspCycle {
    grasp: Duration,
    reset: Duration,
}

impl GraspCycle {
    pub fn new(grasp: Duration, reset: Duration) -> Self {
        GraspCycle { grasp, reset }
    }

    pub fn from_config(config: &GraspCycleConfig) -> Self {
        GraspCycle::new(
            Duration::from_millis(config.grasp_ms),
            Duration::from_millis(config.reset_ms),
        )
    }

    /// Runs until a message arrives on `stop` or `cycles` complete.
    /// Returns the number of completed cycles.
    pub fn run(
        &self,
        backend: &dyn Backend,
        stop: &Receiver<()>,
        cycles: Option<usize>,
    ) -> usize {
        let mut completed = 0;

        while cycles.map_or(true, |cycles| completed < cycles) {
            tracing::info!("Grasp cycle {}", completed + 1);

            match backend.grasp(GraspCommand::Start) {
                Ok(reply) => {
                    tracing::debug!("Grasp started: {:?}", reply.is_grasping)
                }
                Err(err) => tracing::warn!("Failed to start grasp: {}", err),
            }
            if wait(stop, self.grasp) {
                break;
            }

            if let Err(err) = backend.command(RESET_GRASP) {
                tracing::warn!("Failed to reset grasp: {}", err);
            }
            completed += 1;
            if wait(stop, self.reset) {
                break;
            }
        }

        completed
    }
}

/// Sleeps for `duration`. Returns `true` if stop was requested meanwhile.
fn wait(stop: &Receiver<()>, duration: Duration) -> bool {
    let deadline = Instant::now() + duration;
    match stop.recv_deadline(deadline) {
        Ok(()) => true,
        Err(RecvTimeoutError::Timeout) => false,
        Err(RecvTimeoutError::Disconnected) => {
            // Nobody can stop us anymore, just sleep out the rest.
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            client::ClientError,
            protocol::{CommandReply, ForceReport, GraspState, StatusReport},
        },
        std::sync::Mutex,
    };

    #[derive(Default)]
    struct Recorder {
        commands: Mutex<Vec<String>>,
        fail_start: bool,
    }

    impl Recorder {
        fn record(&self, token: &str) -> Result<CommandReply, ClientError> {
            self.commands.lock().unwrap().push(token.to_owned());
            Ok(CommandReply {
                status: "ok".to_owned(),
                msg: None,
                is_grasping: None,
            })
        }

        fn commands(&self) -> Vec<String> {
            self.commands.lock().unwrap().clone()
        }
    }

    impl Backend for Recorder {
        fn status(&self) -> Result<StatusReport, ClientError> {
            unimplemented!()
        }

        fn force_data(&self) -> Result<ForceReport, ClientError> {
            unimplemented!()
        }

        fn grasp_status(&self) -> Result<GraspState, ClientError> {
            unimplemented!()
        }

        fn set_dof(&self, _dof: u8, _value: i32) -> Result<String, ClientError> {
            unimplemented!()
        }

        fn command(&self, cmd: &str) -> Result<CommandReply, ClientError> {
            self.record(cmd)
        }

        fn grasp(&self, cmd: GraspCommand) -> Result<CommandReply, ClientError> {
            let reply = self.record(cmd.token());
            if self.fail_start {
                return Err(ClientError::Rejected {
                    msg: "actuator fault".to_owned(),
                });
            }
            reply
        }
    }

    #[test]
    fn cycles_alternate_grasp_and_reset() {
        let backend = Recorder::default();
        let (_stop_tx, stop) = flume::unbounded();
        let cycle = GraspCycle::new(Duration::from_millis(1), Duration::from_millis(1));

        assert_eq!(cycle.run(&backend, &stop, Some(2)), 2);
        assert_eq!(
            backend.commands(),
            vec!["start_grasp", "reset_grasp", "start_grasp", "reset_grasp"]
        );
    }

    #[test]
    fn stop_interrupts_hold() {
        let backend = Recorder::default();
        let (stop_tx, stop) = flume::unbounded();
        stop_tx.send(()).unwrap();
        let cycle = GraspCycle::new(Duration::from_secs(60), Duration::from_secs(60));

        assert_eq!(cycle.run(&backend, &stop, None), 0);
        assert_eq!(backend.commands(), vec!["start_grasp"]);
    }

    #[test]
    fn failed_commands_do_not_stop_cycle() {
        let backend = Recorder {
            fail_start: true,
            ..Recorder::default()
        };
        let stop = {
            let (_, stop) = flume::unbounded::<()>();
            stop
        };
        let cycle = GraspCycle::from_config(&GraspCycleConfig {
            grasp_ms: 0,
            reset_ms: 0,
        });

        assert_eq!(cycle.run(&backend, &stop, Some(3)), 3);
        assert_eq!(backend.commands().len(), 6);
    }
}
