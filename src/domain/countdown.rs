/// Cosmetic "next update" counter. Follows its own one-second ticks, not
/// the completion of refreshes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    start: u32,
    left: u32,
}

impl Countdown {
    pub fn new(start: u32) -> Self {
        let start = start.max(1);
        Self { start, left: start }
    }

    #[cfg(test)]
    pub fn left(&self) -> u32 {
        self.left
    }

    /// One second elapsed. Wraps back to the start instead of showing zero.
    pub fn tick(&mut self) -> u32 {
        self.left -= 1;
        if self.left == 0 {
            self.left = self.start;
        }
        self.left
    }

    pub fn text(&self) -> String {
        format!("Next update in {}s", self.left)
    }
}
