use {
    color_eyre::Report,
    eyre::eyre,
    handrig::Visualizer,
    handrig_animate::{Finger, BEND_MAX, SWING_MAX},
    std::{
        io::{BufRead as _, Write as _},
        str::FromStr as _,
        time::Instant,
    },
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlCommand {
    Bend(Finger, f32),
    Swing(f32),
    Reset,
    Show,
    Quit,
}

impl ControlCommand {
    /// Parses lines like `index 1.2`, `swing 0.5` or `reset`.
    /// Blank lines parse to `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, Report> {
        let mut words = line.split_whitespace();
        let head = match words.next() {
            Some(head) => head.to_ascii_lowercase(),
            None => return Ok(None),
        };

        let command = match head.as_str() {
            "reset" => ControlCommand::Reset,
            "show" => ControlCommand::Show,
            "quit" | "exit" => ControlCommand::Quit,
            "swing" => ControlCommand::Swing(value(words.next())?),
            _ => {
                let finger = Finger::from_str(&head)?;
                ControlCommand::Bend(finger, value(words.next())?)
            }
        };

        match words.next() {
            Some(extra) => Err(eyre!("Unexpected '{}'", extra)),
            None => Ok(Some(command)),
        }
    }
}

fn value(word: Option<&str>) -> Result<f32, Report> {
    let word = word.ok_or_else(|| eyre!("Missing value"))?;
    word.parse()
        .map_err(|_| eyre!("'{}' is not a number", word))
}

/// Reads control commands from stdin until EOF or `quit`.
pub fn run(mut visualizer: Visualizer) -> Result<(), Report> {
    println!(
        "Commands: <finger> 0..{}, swing 0..{}, reset, show, quit",
        BEND_MAX, SWING_MAX
    );

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let command = match ControlCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("{}", err);
                continue;
            }
        };

        match command {
            ControlCommand::Bend(finger, value) => {
                visualizer.set_bend(finger, value)
            }
            ControlCommand::Swing(value) => visualizer.set_swing(value),
            ControlCommand::Reset => visualizer.reset(),
            ControlCommand::Show => {}
            ControlCommand::Quit => break,
        }

        visualizer.frame(Instant::now());
        print_pose(&visualizer);
        std::io::stdout().flush()?;
    }

    Ok(())
}

pub fn print_pose(visualizer: &Visualizer) {
    let params = visualizer.params();
    let skeleton = visualizer.skeleton();

    for finger in Finger::ALL.iter().copied() {
        println!("{} bend {:.2}", finger, params.bend(finger));
        for &id in visualizer.chain(finger) {
            let joint = skeleton.joint(id);
            let (roll, pitch, yaw) = joint.rotation().euler_angles();
            println!(
                "  {:<12} roll {:>7.3} pitch {:>7.3} yaw {:>7.3}",
                joint.name().unwrap_or("?"),
                roll,
                pitch,
                yaw
            );
        }
    }
    println!("thumb swing {:.2}", params.thumb_swing);

    for (finger, tip) in visualizer.fingertips() {
        println!(
            "{} tip ({:.3}, {:.3}, {:.3})",
            finger, tip.x, tip.y, tip.z
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(
            ControlCommand::parse("index 1.2").unwrap(),
            Some(ControlCommand::Bend(Finger::Index, 1.2))
        );
        assert_eq!(
            ControlCommand::parse("  Pinky 0 ").unwrap(),
            Some(ControlCommand::Bend(Finger::Pinky, 0.0))
        );
        assert_eq!(
            ControlCommand::parse("swing 2.5").unwrap(),
            Some(ControlCommand::Swing(2.5))
        );
        assert_eq!(
            ControlCommand::parse("RESET").unwrap(),
            Some(ControlCommand::Reset)
        );
        assert_eq!(ControlCommand::parse("   ").unwrap(), None);
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!(ControlCommand::parse("index").is_err());
        assert!(ControlCommand::parse("index much").is_err());
        assert!(ControlCommand::parse("wrist 1.0").is_err());
        assert!(ControlCommand::parse("reset now").is_err());
    }
}
