use std::fmt::{Display, Formatter};
use std::ops::{BitOr, BitOrAssign};

/// Set of instrument kinds a fetch should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InstrumentMode(u8);

impl InstrumentMode {
    pub const NONE: Self = Self(0);
    pub const OPTIONS: Self = Self(1);
    pub const SPREADS: Self = Self(1 << 1);
    pub const CALENDAR: Self = Self(1 << 2);
    pub const ALL: Self = Self(Self::OPTIONS.0 | Self::SPREADS.0 | Self::CALENDAR.0);

    pub const fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when the mode produces output that needs a chain.
    pub const fn needs_chain(self) -> bool {
        self.contains(Self::OPTIONS) || self.contains(Self::SPREADS)
    }
}

impl BitOr for InstrumentMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl BitOrAssign for InstrumentMode {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl Display for InstrumentMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut names = Vec::with_capacity(3);
        if self.contains(Self::OPTIONS) {
            names.push("options");
        }
        if self.contains(Self::SPREADS) {
            names.push("spreads");
        }
        if self.contains(Self::CALENDAR) {
            names.push("calendar");
        }
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_the_union_of_every_flag() {
        let combined =
            InstrumentMode::OPTIONS | InstrumentMode::SPREADS | InstrumentMode::CALENDAR;
        assert_eq!(combined, InstrumentMode::ALL);
        assert!(combined.contains(InstrumentMode::SPREADS));
    }

    #[test]
    fn flags_accumulate_in_place() {
        let mut mode = InstrumentMode::NONE;
        assert!(mode.is_empty());
        mode |= InstrumentMode::OPTIONS;
        mode |= InstrumentMode::OPTIONS;
        assert_eq!(mode, InstrumentMode::OPTIONS);
        mode |= InstrumentMode::SPREADS;
        assert_eq!(mode.to_string(), "options|spreads");
    }

    #[test]
    fn calendar_alone_needs_no_chain() {
        assert!(!InstrumentMode::CALENDAR.needs_chain());
        assert!((InstrumentMode::CALENDAR | InstrumentMode::OPTIONS).needs_chain());
        assert!(!InstrumentMode::NONE.contains(InstrumentMode::NONE));
    }

    #[test]
    fn displays_flag_names() {
        assert_eq!(
            (InstrumentMode::OPTIONS | InstrumentMode::CALENDAR).to_string(),
            "options|calendar"
        );
    }
}
