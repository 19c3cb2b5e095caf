use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlayerId {
    One = 0,
    Two = 1,
}

impl PlayerId {
    pub const BOTH: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(PlayerId::One),
            1 => Some(PlayerId::Two),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn other(self) -> PlayerId {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlayerId::One => "P1",
            PlayerId::Two => "P2",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::PlayerId;

    #[test]
    fn other_alternates() {
        assert_eq!(PlayerId::One.other(), PlayerId::Two);
        assert_eq!(PlayerId::Two.other().other(), PlayerId::Two);
    }

    #[test]
    fn index_roundtrip() {
        for (i, player) in PlayerId::BOTH.iter().enumerate() {
            assert_eq!(PlayerId::from_index(i), Some(*player));
            assert_eq!(player.index(), i);
        }
        assert_eq!(PlayerId::from_index(2), None);
    }
}
