mod control;
mod watch;

use {
    clap::{Parser, Subcommand, ValueEnum},
    color_eyre::Report,
    eyre::{eyre, WrapErr as _},
    handrig::{
        protocol::{CLEAR_FAULT, DOF_COUNT, RESET_GRASP},
        Backend, Config, GraspCommand, GraspCycle, HttpBackend, Panel, Update,
        Visualizer,
    },
    handrig_animate::{CompositionPolicy, Finger},
    std::{io::BufRead, path::PathBuf, str::FromStr as _, time::Instant},
    tracing_subscriber::{
        fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter,
    },
};

/// Dashboard and pose previewer for the robotic hand.
#[derive(Parser)]
#[command(name = "handrig", version)]
struct Cli {
    /// Config file. Defaults to `$HANDRIG_CONFIG_PATH` or `./cfg.ron`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the hand continuously and show its status
    Watch {
        /// Hand model to pose from live positions
        #[arg(long)]
        model: Option<PathBuf>,
    },

    /// Fetch every reading once and print it
    Status,

    /// Move a single DOF to a position
    SetDof {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=DOF_COUNT as i64))]
        dof: u8,

        #[arg(allow_hyphen_values = true)]
        value: i32,
    },

    /// Send a raw command token, e.g. `reset_grasp`
    Command { token: String },

    /// Clear hardware faults on all actuators
    ClearFault,

    /// Start or stop grasping
    Grasp {
        #[arg(value_enum)]
        action: GraspAction,
    },

    /// Grasp and release repeatedly until Enter is pressed
    GraspCycle {
        /// Stop after this many cycles
        #[arg(long)]
        cycles: Option<usize>,
    },

    /// Pose the hand model once and print joint orientations
    Pose {
        #[arg(long)]
        model: Option<PathBuf>,

        /// Finger bend as `finger=value`, repeatable
        #[arg(long, value_parser = parse_bend)]
        bend: Vec<(Finger, f32)>,

        /// Thumb swing
        #[arg(long, default_value_t = 0.0, value_parser = parse_swing)]
        swing: f32,

        #[arg(long, value_parser = parse_policy)]
        policy: Option<CompositionPolicy>,
    },

    /// Pose the hand model interactively from stdin
    Control {
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GraspAction {
    Start,
    Stop,
}

fn main() -> Result<(), Report> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let config = match cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    let backend =
        HttpBackend::new(&config.backend.url, config.backend.timeout());

    match cli.command {
        Command::Watch { model } => watch::run(&config, backend, model),
        Command::Status => status(&config, &backend),
        Command::SetDof { dof, value } => {
            let msg = backend
                .set_dof(dof, value)
                .wrap_err_with(|| format!("Failed to set DOF{}", dof))?;
            println!("{}", msg);
            Ok(())
        }
        Command::Command { token } => {
            let reply = backend
                .command(&token)
                .wrap_err_with(|| format!("Command '{}' failed", token))?;
            println!("{}", reply.msg.as_deref().unwrap_or(&reply.status));
            Ok(())
        }
        Command::ClearFault => {
            let reply = backend
                .command(CLEAR_FAULT)
                .wrap_err("Failed to clear faults")?;
            println!("{}", reply.msg.as_deref().unwrap_or(&reply.status));
            Ok(())
        }
        Command::Grasp { action } => {
            let cmd = match action {
                GraspAction::Start => GraspCommand::Start,
                GraspAction::Stop => GraspCommand::Stop,
            };
            let reply = backend.grasp(cmd)?;
            println!("{}", reply.msg.as_deref().unwrap_or(&reply.status));
            Ok(())
        }
        Command::GraspCycle { cycles } => grasp_cycle(&config, &backend, cycles),
        Command::Pose {
            model,
            bend,
            swing,
            policy,
        } => {
            let mut config = config;
            if let Some(policy) = policy {
                config.model.policy = policy;
            }
            let mut visualizer = load_visualizer(&config, model)?;
            pose_hand(&mut visualizer, &bend, swing);
            visualizer.frame(Instant::now());
            control::print_pose(&visualizer);
            Ok(())
        }
        Command::Control { model } => {
            let visualizer = load_visualizer(&config, model)?;
            control::run(visualizer)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(tracing_error::ErrorLayer::default())
        .init();
}

fn load_visualizer(
    config: &Config,
    model: Option<PathBuf>,
) -> Result<Visualizer, Report> {
    let path = model
        .or_else(|| config.model.path.clone())
        .ok_or_else(|| eyre!("No hand model given, use --model"))?;
    Visualizer::load(config, &path)
}

/// Sets controls through the bounded control surface.
fn pose_hand(visualizer: &mut Visualizer, bend: &[(Finger, f32)], swing: f32) {
    for &(finger, value) in bend {
        visualizer.set_bend(finger, value);
    }
    visualizer.set_swing(swing);
}

fn status(config: &Config, backend: &HttpBackend) -> Result<(), Report> {
    let mut panel = Panel::new(config.panel.clone());
    let status = backend.status().wrap_err("Failed to fetch status")?;
    panel.apply(&Update::Status(Ok(status)));
    panel.apply(&Update::Force(backend.force_data()));
    panel.apply(&Update::GraspStatus(backend.grasp_status()));
    println!("{}", panel);
    Ok(())
}

fn grasp_cycle(
    config: &Config,
    backend: &HttpBackend,
    cycles: Option<usize>,
) -> Result<(), Report> {
    let (stop_tx, stop) = flume::bounded(1);
    std::thread::Builder::new()
        .name("grasp-cycle-stop".to_owned())
        .spawn(move || {
            let stdin = std::io::stdin();
            if wait_for_enter(stdin.lock()) {
                let _ = stop_tx.send(());
            }
        })?;

    println!("Press Enter to stop");
    let completed =
        GraspCycle::from_config(&config.grasp_cycle).run(backend, &stop, cycles);
    tracing::info!("{} grasp cycles completed", completed);

    // Leave the hand open.
    backend.command(RESET_GRASP)?;
    Ok(())
}

/// Returns `true` once a line is read. Closed or failing input never
/// counts as a stop request.
fn wait_for_enter(mut input: impl BufRead) -> bool {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => false,
        Ok(_) => true,
    }
}

fn parse_bend(arg: &str) -> Result<(Finger, f32), String> {
    let mut parts = arg.splitn(2, '=');
    let finger = parts.next().unwrap_or_default();
    let value = parts
        .next()
        .ok_or_else(|| format!("expected `finger=value`, got '{}'", arg))?;

    let finger = Finger::from_str(finger).map_err(|err| err.to_string())?;
    let value = value
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| format!("bad bend value '{}'", value))?;
    Ok((finger, value))
}

fn parse_swing(arg: &str) -> Result<f32, String> {
    arg.trim()
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| format!("bad swing value '{}'", arg))
}

fn parse_policy(arg: &str) -> Result<CompositionPolicy, String> {
    match arg.trim().to_ascii_lowercase().as_str() {
        "independent" => Ok(CompositionPolicy::Independent),
        "chained" => Ok(CompositionPolicy::Chained),
        _ => Err(format!("unknown composition policy '{}'", arg)),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        handrig_animate::{JointDesc, Skeleton, BEND_MAX, SWING_MAX},
    };

    #[test]
    fn bend_arguments() {
        assert_eq!(parse_bend("index=1.25").unwrap(), (Finger::Index, 1.25));
        assert_eq!(parse_bend("Thumb= 0.5").unwrap(), (Finger::Thumb, 0.5));
        assert!(parse_bend("index").is_err());
        assert!(parse_bend("wrist=1").is_err());
        assert!(parse_bend("ring=lots").is_err());
        assert!(parse_bend("index=NaN").is_err());
        assert!(parse_bend("index=inf").is_err());
        assert!(parse_swing("NaN").is_err());
        assert_eq!(parse_swing(" 1.5").unwrap(), 1.5);
    }

    fn two_finger_hand() -> Skeleton {
        let mut builder = Skeleton::builder();
        let wrist = builder.add(JointDesc::new("wrist")).unwrap();
        for names in &[["index01", "index02", "index03"], ["thumb01", "thumb02", "thumb03"]] {
            let mut parent = wrist;
            for name in names {
                parent = builder
                    .add(JointDesc::new(*name).with_parent(parent))
                    .unwrap();
            }
        }
        builder.build()
    }

    #[test]
    fn pose_arguments_are_bounded() {
        let cli = Cli::try_parse_from(&[
            "handrig", "pose", "--bend", "index=5", "--bend", "thumb=-1",
            "--swing", "10",
        ])
        .unwrap();
        let (bend, swing) = match cli.command {
            Command::Pose { bend, swing, .. } => (bend, swing),
            _ => panic!("expected pose command"),
        };

        let mut visualizer =
            Visualizer::new(two_finger_hand(), &Config::default()).unwrap();
        pose_hand(&mut visualizer, &bend, swing);

        let params = visualizer.params();
        assert_eq!(params.bend(Finger::Index), BEND_MAX);
        assert_eq!(params.bend(Finger::Thumb), 0.0);
        assert_eq!(params.thumb_swing, SWING_MAX);
    }

    #[test]
    fn closed_input_does_not_stop_cycle() {
        assert!(!wait_for_enter(std::io::Cursor::new(Vec::new())));
        assert!(wait_for_enter(std::io::Cursor::new(b"\n".to_vec())));
    }

    #[test]
    fn clear_fault_subcommand() {
        let cli = Cli::try_parse_from(&["handrig", "clear-fault"]).unwrap();
        assert!(matches!(cli.command, Command::ClearFault));
    }

    #[test]
    fn policy_arguments() {
        assert_eq!(
            parse_policy("Chained").unwrap(),
            CompositionPolicy::Chained
        );
        assert!(parse_policy("nested").is_err());
    }

    #[test]
    fn cli_is_consistent() {
        use clap::CommandFactory as _;
        Cli::command().debug_assert();
    }

    #[test]
    fn dof_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(&["handrig", "set-dof", "7", "100"]).is_err());
        let cli =
            Cli::try_parse_from(&["handrig", "set-dof", "3", "-20"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::SetDof { dof: 3, value: -20 }
        ));
    }
}
