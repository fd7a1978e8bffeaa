use colored::Colorize;

/// Results of pausing episode torrents.
#[derive(Debug, Default)]
pub struct PauseStats {
    total: usize,
    paused: Vec<i64>,
    failed: Vec<i64>,
    batch_fallbacks: usize,
}

impl PauseStats {
    pub const fn new(total: usize) -> Self {
        Self {
            total,
            paused: Vec::new(),
            failed: Vec::new(),
            batch_fallbacks: 0,
        }
    }

    pub fn record_paused(&mut self, ids: &[i64]) {
        self.paused.extend_from_slice(ids);
    }

    pub fn record_failed(&mut self, id: i64) {
        self.failed.push(id);
    }

    pub const fn inc_batch_fallback(&mut self) {
        self.batch_fallbacks += 1;
    }

    pub const fn paused_count(&self) -> usize {
        self.paused.len()
    }

    pub const fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn print_summary(&self) {
        println!("\n{}", "─".repeat(60));
        println!("{}", "Pause summary:".bold());
        println!("  Total:    {}", self.total);
        println!("  {}   {}", "Paused:".green(), self.paused_count());
        if self.batch_fallbacks > 0 {
            println!("  {} {}", "Fallback:".yellow(), self.batch_fallbacks);
        }
        if !self.failed.is_empty() {
            println!("  {}   {}", "Failed:".red(), self.failed_count());
            let ids = self.failed.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
            println!("  {}", format!("Failed IDs: {ids}").red());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let stats = PauseStats::new(4);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.paused_count(), 0);
        assert_eq!(stats.failed_count(), 0);
        assert_eq!(stats.batch_fallbacks, 0);
    }

    #[test]
    fn records_batches_and_failures() {
        let mut stats = PauseStats::new(5);
        stats.record_paused(&[1, 2, 3]);
        stats.inc_batch_fallback();
        stats.record_paused(&[4]);
        stats.record_failed(5);

        assert_eq!(stats.paused_count(), 4);
        assert_eq!(stats.failed_count(), 1);
        assert_eq!(stats.failed, vec![5]);
        assert_eq!(stats.batch_fallbacks, 1);
    }

    #[test]
    fn empty_batch_changes_nothing() {
        let mut stats = PauseStats::new(0);
        stats.record_paused(&[]);
        assert_eq!(stats.paused_count(), 0);
    }
}
