//! Daily word goals and writing streaks.
//!
//! The [`ProgressCoordinator`] never holds on to a project. Each
//! [`sync_with_project`](ProgressCoordinator::sync_with_project) call reads
//! the project's current word total and derives today's progress from it;
//! between syncs the project can notify the coordinator through
//! [`change_listener`](ProgressCoordinator::change_listener).
//!
//! Words written on a day are the growth of the project total since the
//! first total seen that day. Deleting text never produces negative
//! progress.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Days, NaiveDate, TimeDelta, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::html::measure;
use crate::model::{Project, ProjectChange};

mod clock;

pub use clock::{Clock, FixedClock, SystemClock};

/// Daily target used until one is set.
pub const DEFAULT_DAILY_TARGET: u32 = 500;
/// Largest accepted daily or project target.
pub const MAX_TARGET: u32 = 50_000;

/// Sessions closer together than this count once.
const SESSION_WINDOW_MINUTES: i64 = 5;
const MEANINGFUL_WORDS: usize = 5;
const MEANINGFUL_CHARACTERS: usize = 25;

/// Word targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressGoals {
    pub daily_word_target: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_word_target: Option<u32>,
}

impl Default for ProgressGoals {
    fn default() -> Self {
        Self {
            daily_word_target: DEFAULT_DAILY_TARGET,
            project_word_target: None,
        }
    }
}

/// Progress recorded for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub words_written: usize,
    pub goal_met: bool,
    pub sessions_count: u32,
    /// Project total when the day started; unknown until the first sync.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_total: Option<usize>,
    /// Project total at the last sync of the day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_total: Option<usize>,
}

impl DailyProgress {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            words_written: 0,
            goal_met: false,
            sessions_count: 0,
            start_total: None,
            end_total: None,
        }
    }
}

/// Persistent coordinator state. The host stores this alongside the
/// project file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressState {
    pub goals: ProgressGoals,
    /// One entry per day with activity, sorted by date.
    pub daily_progress: Vec<DailyProgress>,
    pub longest_streak: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_session_at: Option<DateTime<Utc>>,
}

/// Summary statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Days on which any words were written.
    pub total_days_active: usize,
    /// Mean words over active days, rounded.
    pub average_daily_words: usize,
    /// When the project target will be reached at the current average.
    pub estimated_completion_date: Option<NaiveDate>,
}

/// One day in a progress chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataPoint {
    pub date: NaiveDate,
    pub words_written: usize,
    pub goal_target: u32,
    pub goal_met: bool,
    pub is_today: bool,
}

/// Tracks daily progress against word goals.
pub struct ProgressCoordinator {
    state: ProgressState,
    clock: Arc<dyn Clock>,
    dirty: Arc<AtomicBool>,
}

impl ProgressCoordinator {
    /// Coordinator on the system clock with default goals.
    pub fn new() -> Self {
        Self {
            state: ProgressState::default(),
            clock: Arc::new(SystemClock),
            dirty: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Resume from previously saved state.
    pub fn with_state(mut self, mut state: ProgressState) -> Self {
        state.daily_progress.sort_by_key(|day| day.date);
        state.daily_progress.dedup_by_key(|day| day.date);
        self.state = state;
        self
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn into_state(self) -> ProgressState {
        self.state
    }

    pub fn goals(&self) -> &ProgressGoals {
        &self.state.goals
    }

    pub fn daily_goal(&self) -> u32 {
        self.state.goals.daily_word_target
    }

    pub fn project_goal(&self) -> Option<u32> {
        self.state.goals.project_word_target
    }

    /// Set the daily target. Today's goal status is re-evaluated; earlier
    /// days keep the status they were recorded with.
    pub fn set_daily_goal(&mut self, target: u32) -> Result<()> {
        check_target(target)?;
        self.state.goals.daily_word_target = target;
        let today = self.clock.today();
        if let Some(day) = self.day_mut(today) {
            day.goal_met = day.words_written >= target as usize;
        }
        self.refresh_longest_streak();
        info!("daily word target set to {target}");
        Ok(())
    }

    pub fn set_project_goal(&mut self, target: u32) -> Result<()> {
        check_target(target)?;
        self.state.goals.project_word_target = Some(target);
        info!("project word target set to {target}");
        Ok(())
    }

    /// A hook for [`Project::on_change`] that marks the coordinator as
    /// needing a sync whenever the project's word total may have moved.
    pub fn change_listener(&self) -> impl Fn(&ProjectChange) + Send + Sync + 'static {
        let dirty = Arc::clone(&self.dirty);
        move |change| {
            if change.affects_word_count() {
                dirty.store(true, Ordering::Relaxed);
            }
        }
    }

    /// True when the project changed since the last sync.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Relaxed)
    }

    /// Update today's progress from the project's current word total.
    pub fn sync_with_project(&mut self, project: &Project) -> &DailyProgress {
        let today = self.clock.today();
        let total = project.total_words();
        let target = self.state.goals.daily_word_target as usize;

        let previous_total = self
            .state
            .daily_progress
            .iter()
            .rev()
            .filter(|day| day.date < today)
            .find_map(|day| day.end_total);

        let index = self.day_index_or_insert(today);
        let day = &mut self.state.daily_progress[index];
        let start = *day.start_total.get_or_insert(previous_total.unwrap_or(total));
        day.end_total = Some(total);
        day.words_written = total.saturating_sub(start);
        day.goal_met = day.words_written >= target;
        debug!(
            "progress for {today}: {} words (total {total}, baseline {start})",
            day.words_written
        );

        self.dirty.store(false, Ordering::Relaxed);
        self.refresh_longest_streak();
        &self.state.daily_progress[index]
    }

    /// Count a writing session at `at`. Returns false when a session was
    /// already counted within the last five minutes.
    pub fn record_session(&mut self, at: DateTime<Utc>) -> bool {
        if let Some(last) = self.state.last_session_at {
            let elapsed = at - last;
            if elapsed >= TimeDelta::zero()
                && elapsed < TimeDelta::minutes(SESSION_WINDOW_MINUTES)
            {
                return false;
            }
        }

        let index = self.day_index_or_insert(at.date_naive());
        self.state.daily_progress[index].sessions_count += 1;
        self.state.last_session_at = Some(at);
        true
    }

    /// Whether an edit from `old` to `new` content is large enough to be
    /// worth a progress update.
    pub fn is_meaningful_change(old: &str, new: &str) -> bool {
        let old = measure(old);
        let new = measure(new);
        old.words.abs_diff(new.words) >= MEANINGFUL_WORDS
            || old.characters.abs_diff(new.characters) >= MEANINGFUL_CHARACTERS
    }

    pub fn todays_progress(&self) -> Option<&DailyProgress> {
        self.day(self.clock.today())
    }

    /// Share of today's target reached, capped at 100.
    pub fn todays_percentage(&self) -> u32 {
        let words = self.todays_progress().map_or(0, |day| day.words_written);
        let target = self.daily_goal().max(1) as usize;
        (words.saturating_mul(100) / target).min(100) as u32
    }

    /// Consecutive goal-met days ending today, or ending yesterday while
    /// today's goal is still open.
    pub fn current_streak(&self) -> u32 {
        let today = self.clock.today();
        let mut day = if self.goal_met_on(today) {
            Some(today)
        } else {
            today.pred_opt()
        };

        let mut streak = 0;
        while let Some(date) = day.filter(|date| self.goal_met_on(*date)) {
            streak += 1;
            day = date.pred_opt();
        }
        streak
    }

    /// Longest streak ever reached.
    pub fn longest_streak(&self) -> u32 {
        self.state
            .longest_streak
            .max(longest_run(&self.state.daily_progress))
    }

    pub fn stats(&self, project: &Project) -> ProgressStats {
        let active: Vec<_> = self
            .state
            .daily_progress
            .iter()
            .filter(|day| day.words_written > 0)
            .collect();
        let total_days_active = active.len();
        let total_words: usize = active.iter().map(|day| day.words_written).sum();
        let average_daily_words = match total_days_active {
            0 => 0,
            n => (total_words + n / 2) / n,
        };

        let estimated_completion_date = self
            .state
            .goals
            .project_word_target
            .filter(|_| average_daily_words > 0)
            .and_then(|target| {
                let remaining = (target as usize).checked_sub(project.total_words())?;
                if remaining == 0 {
                    return None;
                }
                let days = remaining.div_ceil(average_daily_words);
                self.clock.today().checked_add_days(Days::new(days as u64))
            });

        ProgressStats {
            current_streak: self.current_streak(),
            longest_streak: self.longest_streak(),
            total_days_active,
            average_daily_words,
            estimated_completion_date,
        }
    }

    /// Recorded days within the last `days` days (today included), oldest
    /// first.
    pub fn daily_progress(&self, days: u32) -> Vec<&DailyProgress> {
        let Some(start) = self.window_start(days) else {
            return Vec::new();
        };
        let today = self.clock.today();
        self.state
            .daily_progress
            .iter()
            .filter(|day| day.date >= start && day.date <= today)
            .collect()
    }

    /// One point per day for the last `days` days, oldest first. Days
    /// without activity are zero.
    pub fn chart_data(&self, days: u32) -> Vec<ChartDataPoint> {
        let Some(start) = self.window_start(days) else {
            return Vec::new();
        };
        let today = self.clock.today();
        let goal_target = self.daily_goal();

        start
            .iter_days()
            .take_while(|date| *date <= today)
            .map(|date| {
                let day = self.day(date);
                ChartDataPoint {
                    date,
                    words_written: day.map_or(0, |d| d.words_written),
                    goal_target,
                    goal_met: day.is_some_and(|d| d.goal_met),
                    is_today: date == today,
                }
            })
            .collect()
    }

    /// Forget all recorded days. Goals are kept.
    pub fn reset_progress(&mut self) {
        self.state.daily_progress.clear();
        self.state.longest_streak = 0;
        self.state.last_session_at = None;
    }

    fn window_start(&self, days: u32) -> Option<NaiveDate> {
        let back = days.checked_sub(1)?;
        self.clock.today().checked_sub_days(Days::new(back.into()))
    }

    fn day(&self, date: NaiveDate) -> Option<&DailyProgress> {
        self.state
            .daily_progress
            .binary_search_by_key(&date, |day| day.date)
            .ok()
            .map(|i| &self.state.daily_progress[i])
    }

    fn day_mut(&mut self, date: NaiveDate) -> Option<&mut DailyProgress> {
        self.state
            .daily_progress
            .binary_search_by_key(&date, |day| day.date)
            .ok()
            .map(|i| &mut self.state.daily_progress[i])
    }

    fn day_index_or_insert(&mut self, date: NaiveDate) -> usize {
        let days = &mut self.state.daily_progress;
        match days.binary_search_by_key(&date, |day| day.date) {
            Ok(i) => i,
            Err(i) => {
                days.insert(i, DailyProgress::new(date));
                i
            }
        }
    }

    fn goal_met_on(&self, date: NaiveDate) -> bool {
        self.day(date).is_some_and(|day| day.goal_met)
    }

    fn refresh_longest_streak(&mut self) {
        self.state.longest_streak = self.longest_streak().max(self.current_streak());
    }
}

impl Default for ProgressCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

fn check_target(target: u32) -> Result<()> {
    if (1..=MAX_TARGET).contains(&target) {
        Ok(())
    } else {
        Err(Error::InvalidGoal(target))
    }
}

/// Longest run of consecutive goal-met days in a date-sorted list.
fn longest_run(days: &[DailyProgress]) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for day in days {
        if !day.goal_met {
            run = 0;
        } else if previous.and_then(|p| p.succ_opt()) == Some(day.date) && run > 0 {
            run += 1;
        } else {
            run = 1;
        }
        longest = longest.max(run);
        previous = Some(day.date);
    }
    longest
}
