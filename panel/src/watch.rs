use {
    color_eyre::Report,
    handrig::{
        Config, HttpBackend, LiveDrive, Panel, Poller, Update, Visualizer,
    },
    std::{
        path::PathBuf,
        sync::Arc,
        time::{Duration, Instant},
    },
};

/// Polls the hand forever, redrawing the panel when something changes.
///
/// With a model the hand is posed from live DOF positions through the
/// configured drive bindings.
pub fn run(
    config: &Config,
    backend: HttpBackend,
    model: Option<PathBuf>,
) -> Result<(), Report> {
    let drive = LiveDrive::new(config.live_drive.clone())?;
    let mut visualizer = match model.or_else(|| config.model.path.clone()) {
        Some(path) => Some(Visualizer::load(config, &path)?),
        None => None,
    };
    if visualizer.is_some() && drive.is_empty() {
        tracing::warn!("No live drive bindings configured, model stays at rest");
    }

    let mut poller = Poller::new(Arc::new(backend), &config.poll, Instant::now());
    let mut panel = Panel::new(config.panel.clone());

    let frame_time = config.model.frame_time();
    let redraw_interval = config.panel.redraw_interval();
    let mut next_frame = Instant::now();
    let mut next_redraw = Instant::now();
    let mut dirty = true;

    loop {
        let now = Instant::now();
        poller.poll(now);

        if let Some(visualizer) = &mut visualizer {
            if now >= next_frame {
                visualizer.frame(now);
                next_frame = now + frame_time;
            }
        }

        if dirty && now >= next_redraw {
            redraw(&panel, visualizer.as_ref());
            dirty = false;
            next_redraw = now + redraw_interval;
        }

        let mut deadline = poller
            .next_due()
            .unwrap_or(now + Duration::from_millis(100));
        if visualizer.is_some() {
            deadline = deadline.min(next_frame);
        }
        if dirty {
            deadline = deadline.min(next_redraw);
        }

        if let Some(update) = poller.recv_deadline(deadline) {
            let mut updates = poller.drain();
            updates.insert(0, update);

            for update in &updates {
                dirty |= panel.apply(update);
                if let (Some(visualizer), Update::Status(Ok(status))) =
                    (&mut visualizer, update)
                {
                    dirty |= visualizer.drive(&drive, status);
                }
            }
        }
    }
}

fn redraw(panel: &Panel, visualizer: Option<&Visualizer>) {
    // Clear screen and move cursor home.
    print!("\x1B[2J\x1B[H");
    println!("{}", panel);

    if let Some(visualizer) = visualizer {
        println!();
        println!("Model {:.0} fps", visualizer.fps());
        for (finger, tip) in visualizer.fingertips() {
            println!(
                "{:<7}{:>9.3}{:>9.3}{:>9.3}",
                finger.as_str(),
                tip.x,
                tip.y,
                tip.z
            );
        }
    }
}
