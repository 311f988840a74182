/// Aggregated view of session progress, useful for a progress bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    /// 1-based number of the question on screen; `0` before the session starts.
    pub current: usize,
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    /// `current / total` as a rounded percentage.
    pub percentage: u32,
    pub is_complete: bool,
}
