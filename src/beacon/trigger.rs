//! When to call the beacon task early

use chrono::{Local, NaiveDateTime, TimeDelta};

use crate::config::{Config, DEFAULT_TIME};

/// Scheduler task that attacks ash beacons
pub const ASH_BEACON_TASK: &str = "OpsiAshBeacon";

/// How far ahead a scheduled run may be and still get called now
pub const PREEMPT_WINDOW_MINUTES: i64 = 30;

/// Whether `task` should be called now rather than left to its schedule
pub fn should_preempt(config: &Config, task: &str) -> bool {
    should_preempt_at(config, task, Local::now().naive_local())
}

pub fn should_preempt_at(config: &Config, task: &str, now: NaiveDateTime) -> bool {
    let next_run =
        config.cross_get_datetime(&format!("{}.Scheduler.NextRun", task), *DEFAULT_TIME);
    let until = next_run - now;
    log::debug!("{} next run {} ({} min from now)", task, next_run, until.num_minutes());
    until <= TimeDelta::minutes(PREEMPT_WINDOW_MINUTES)
}

/// Whether any feature that uses beacon attacks is turned on
pub fn beacon_attack_enabled(config: &Config) -> bool {
    config.flag("OpsiAshBeacon.OpsiAshBeacon.AshAttack")
        || config.flag("OpsiAshBeacon.OpsiDossierBeacon.Enable")
}
