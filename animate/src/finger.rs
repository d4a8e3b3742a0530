use std::{fmt, str::FromStr};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Finger::Thumb => "thumb",
            Finger::Index => "index",
            Finger::Middle => "middle",
            Finger::Ring => "ring",
            Finger::Pinky => "pinky",
        }
    }

    /// Joint names of the stock hand rig, proximal to distal.
    pub fn joint_names(self) -> &'static [&'static str] {
        match self {
            Finger::Thumb => &["thumb01", "thumb02", "thumb03", "thumb04"],
            Finger::Index => &["index01", "index02", "index03"],
            Finger::Middle => &["middle01", "middle02", "middle03"],
            Finger::Ring => &["ring01", "ring02", "ring03"],
            Finger::Pinky => &["pinky01", "pinky02", "pinky03"],
        }
    }
}

impl fmt::Display for Finger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("Unknown finger `{name}`")]
pub struct UnknownFinger {
    pub name: String,
}

impl FromStr for Finger {
    type Err = UnknownFinger;

    fn from_str(s: &str) -> Result<Self, UnknownFinger> {
        Finger::ALL
            .iter()
            .copied()
            .find(|finger| finger.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownFinger { name: s.to_owned() })
    }
}

/// Joint names for every finger, proximal to distal.
#[derive(Clone, Debug, PartialEq)]
pub struct FingerMap {
    names: [Vec<String>; 5],
}

impl Default for FingerMap {
    fn default() -> Self {
        let names = |finger: Finger| {
            finger
                .joint_names()
                .iter()
                .map(|&name| name.to_owned())
                .collect::<Vec<_>>()
        };

        FingerMap {
            names: [
                names(Finger::Thumb),
                names(Finger::Index),
                names(Finger::Middle),
                names(Finger::Ring),
                names(Finger::Pinky),
            ],
        }
    }
}

impl FingerMap {
    pub fn names(&self, finger: Finger) -> &[String] {
        &self.names[finger.index()]
    }

    pub fn set_names(&mut self, finger: Finger, names: Vec<String>) {
        self.names[finger.index()] = names;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumb_has_four_joints_others_three() {
        for &finger in &Finger::ALL {
            let expected = if finger == Finger::Thumb { 4 } else { 3 };
            assert_eq!(finger.joint_names().len(), expected, "{}", finger);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Pinky".parse::<Finger>().unwrap(), Finger::Pinky);
        assert_eq!(" index ".parse::<Finger>().unwrap(), Finger::Index);
        assert!("toe".parse::<Finger>().is_err());
    }

    #[test]
    fn finger_map_overrides_single_finger() {
        let mut map = FingerMap::default();
        map.set_names(Finger::Ring, vec!["Ring_1".into(), "Ring_2".into()]);

        assert_eq!(map.names(Finger::Ring).len(), 2);
        assert_eq!(map.names(Finger::Index)[2], "index03");
    }
}
