use bilge::prelude::*;

/// Default content of the 16-bit status display.
#[bitsize(16)]
#[derive(DebugBits, Clone, Copy, PartialEq, FromBits)]
pub struct DebugWord {
    pub count: u8,
    pub latest: u8,
}

impl DebugWord {
    /// Counter values past 255 only show their low byte.
    pub fn compose(latest: u8, count: usize) -> DebugWord {
        DebugWord::new(count as u8, latest)
    }
}

/// What the display shows this tick. A stage diagnostic wins.
pub fn display(default: DebugWord, diagnostic: Option<u16>) -> u16 {
    diagnostic.unwrap_or(u16::from(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_is_high_byte() {
        let w = DebugWord::compose(0xAB, 3);
        assert_eq!(w.value, 0xAB03);
        assert_eq!(w.latest(), 0xAB);
        assert_eq!(w.count(), 3);
    }

    #[test]
    fn diagnostic_overrides() {
        let w = DebugWord::compose(0x12, 0x34);
        assert_eq!(display(w, None), 0x1234);
        assert_eq!(display(w, Some(0xBEEF)), 0xBEEF);
    }
}
