//! Per-day risk accounting and the entry gate.
//!
//! Counters reset at each calendar-date boundary; equity carries over. Once the
//! halt flag is raised it stays up until the next date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily limits, taken from the strategy config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyLimits {
    pub max_trades_per_day: u32,
    /// Gross realised loss that halts entries for the rest of the day.
    pub max_loss_per_day: f64,
    pub starting_equity: f64,
    /// Halt when equity falls below `starting_equity * equity_floor_fraction`. 0 disables.
    pub equity_floor_fraction: f64,
}

impl DailyLimits {
    pub fn equity_floor(&self) -> f64 {
        self.starting_equity * self.equity_floor_fraction
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HaltReason {
    MaxTrades,
    MaxDailyLoss,
    EquityFloor,
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HaltReason::MaxTrades => write!(f, "max trades per day"),
            HaltReason::MaxDailyLoss => write!(f, "max loss per day"),
            HaltReason::EquityFloor => write!(f, "equity floor"),
        }
    }
}

/// Whether a new position may be opened now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryGate {
    Open,
    Blocked(HaltReason),
}

impl EntryGate {
    pub fn is_open(&self) -> bool {
        matches!(self, EntryGate::Open)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRiskState {
    date: Option<NaiveDate>,
    trades_opened_today: u32,
    cumulative_loss_today: f64,
    equity: f64,
    max_drawdown_flag: Option<HaltReason>,
    blocked_today: bool,
}

impl DailyRiskState {
    pub fn new(starting_equity: f64) -> Self {
        Self {
            date: None,
            trades_opened_today: 0,
            cumulative_loss_today: 0.0,
            equity: starting_equity,
            max_drawdown_flag: None,
            blocked_today: false,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn trades_opened_today(&self) -> u32 {
        self.trades_opened_today
    }

    pub fn cumulative_loss_today(&self) -> f64 {
        self.cumulative_loss_today
    }

    /// Realised equity.
    pub fn equity(&self) -> f64 {
        self.equity
    }

    pub fn max_drawdown_flag(&self) -> bool {
        self.max_drawdown_flag.is_some()
    }

    /// Move to `date`. Returns true when this starts a new day (counters and flag reset).
    pub fn roll_to(&mut self, date: NaiveDate) -> bool {
        if self.date == Some(date) {
            return false;
        }
        self.date = Some(date);
        self.trades_opened_today = 0;
        self.cumulative_loss_today = 0.0;
        self.max_drawdown_flag = None;
        self.blocked_today = false;
        true
    }

    pub fn gate(&self, limits: &DailyLimits) -> EntryGate {
        if let Some(reason) = self.max_drawdown_flag {
            return EntryGate::Blocked(reason);
        }
        if self.trades_opened_today >= limits.max_trades_per_day {
            return EntryGate::Blocked(HaltReason::MaxTrades);
        }
        EntryGate::Open
    }

    pub fn record_entry(&mut self) {
        self.trades_opened_today += 1;
    }

    /// Book a closed trade. Returns the halt reason if this close raised the flag.
    pub fn record_close(&mut self, profit: f64, limits: &DailyLimits) -> Option<HaltReason> {
        self.equity += profit;
        if profit < 0.0 {
            self.cumulative_loss_today += -profit;
        }

        if self.max_drawdown_flag.is_some() {
            return None;
        }
        let reason = if self.cumulative_loss_today >= limits.max_loss_per_day {
            HaltReason::MaxDailyLoss
        } else if self.equity < limits.equity_floor() {
            HaltReason::EquityFloor
        } else {
            return None;
        };
        self.max_drawdown_flag = Some(reason);
        Some(reason)
    }

    /// Clear the halt flag without waiting for the next date.
    pub fn reset_flag(&mut self) {
        self.max_drawdown_flag = None;
    }

    /// Note a blocked entry. True the first time on a given day.
    pub fn mark_blocked(&mut self) -> bool {
        !std::mem::replace(&mut self.blocked_today, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> DailyLimits {
        DailyLimits {
            max_trades_per_day: 2,
            max_loss_per_day: 150.0,
            starting_equity: 10_000.0,
            equity_floor_fraction: 0.0,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn trade_cap_blocks_after_limit() {
        let mut state = DailyRiskState::new(10_000.0);
        state.roll_to(day(2));
        assert!(state.gate(&limits()).is_open());
        state.record_entry();
        state.record_entry();
        assert_eq!(
            state.gate(&limits()),
            EntryGate::Blocked(HaltReason::MaxTrades)
        );
    }

    #[test]
    fn loss_limit_raises_flag_once() {
        let mut state = DailyRiskState::new(10_000.0);
        state.roll_to(day(2));
        assert_eq!(state.record_close(-100.0, &limits()), None);
        assert_eq!(
            state.record_close(-60.0, &limits()),
            Some(HaltReason::MaxDailyLoss)
        );
        assert!(state.max_drawdown_flag());
        assert_eq!(state.record_close(-10.0, &limits()), None);
        assert_eq!(
            state.gate(&limits()),
            EntryGate::Blocked(HaltReason::MaxDailyLoss)
        );
        assert!((state.equity() - 9_830.0).abs() < 1e-9);
    }

    #[test]
    fn wins_do_not_offset_loss_total() {
        let mut state = DailyRiskState::new(10_000.0);
        state.roll_to(day(2));
        state.record_close(-100.0, &limits());
        state.record_close(200.0, &limits());
        assert_eq!(state.cumulative_loss_today(), 100.0);
        assert_eq!(
            state.record_close(-50.0, &limits()),
            Some(HaltReason::MaxDailyLoss)
        );
    }

    #[test]
    fn equity_floor_halts() {
        let limits = DailyLimits {
            max_loss_per_day: 1e9,
            equity_floor_fraction: 0.95,
            ..limits()
        };
        let mut state = DailyRiskState::new(10_000.0);
        state.roll_to(day(2));
        assert_eq!(
            state.record_close(-600.0, &limits),
            Some(HaltReason::EquityFloor)
        );
    }

    #[test]
    fn new_date_resets_counters_and_flag_but_keeps_equity() {
        let mut state = DailyRiskState::new(10_000.0);
        assert!(state.roll_to(day(2)));
        state.record_entry();
        state.record_close(-200.0, &limits());
        assert!(state.max_drawdown_flag());

        assert!(!state.roll_to(day(2)));
        assert!(state.max_drawdown_flag());

        assert!(state.roll_to(day(3)));
        assert!(!state.max_drawdown_flag());
        assert_eq!(state.trades_opened_today(), 0);
        assert_eq!(state.cumulative_loss_today(), 0.0);
        assert!((state.equity() - 9_800.0).abs() < 1e-9);
        assert!(state.gate(&limits()).is_open());
    }

    #[test]
    fn reset_flag_reopens_gate() {
        let mut state = DailyRiskState::new(10_000.0);
        state.roll_to(day(2));
        state.record_close(-500.0, &limits());
        state.reset_flag();
        assert!(state.gate(&limits()).is_open());
    }

    #[test]
    fn mark_blocked_reports_first_per_day() {
        let mut state = DailyRiskState::new(10_000.0);
        state.roll_to(day(2));
        assert!(state.mark_blocked());
        assert!(!state.mark_blocked());
        state.roll_to(day(3));
        assert!(state.mark_blocked());
    }
}
