//! Battle flow
//!
//! A battle runs through three phases: preparation (until the fight starts),
//! execution (while the pause button shows) and status (result screens until
//! the expected page is back). [`run_combat`] drives the phases and asks a
//! [`BattleOutcomeHandler`] what to do with each screenshot.

pub mod base;
pub mod drop;

use std::fmt;
use std::time::{Duration, Instant};

use crate::config::TimingSettings;
use crate::vision::{Screen, VisionError};

pub use base::{Combat, CombatAssets};
pub use drop::{DropImage, DropRecord};

/// Sleep before dismissing a result screen when nothing records drops
pub const RESULT_SLEEP: (f32, f32) = (0.25, 0.5);

/// Caller check that the battle is over and the expected page is showing
pub type ExpectedEnd<'a> = dyn FnMut(&mut dyn Screen) -> Result<bool, CombatError> + 'a;

/// Outcome of one preparation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preparation {
    /// Keep polling; `handled` if this step acted on the screen
    Continue { handled: bool },
    /// Nothing left to fight, the reward is already claimed
    Finished,
    /// Nothing left to fight, the target is gone
    Empty,
}

impl Preparation {
    pub const HANDLED: Self = Self::Continue { handled: true };
    pub const NOT_HANDLED: Self = Self::Continue { handled: false };

    pub fn is_handled(self) -> bool {
        !matches!(self, Self::Continue { handled: false })
    }
}

impl From<bool> for Preparation {
    fn from(handled: bool) -> Self {
        Self::Continue { handled }
    }
}

/// Why a battle could not start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalSignal {
    Finished,
    Empty,
}

impl fmt::Display for TerminalSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalSignal::Finished => write!(f, "finished"),
            TerminalSignal::Empty => write!(f, "empty"),
        }
    }
}

/// How a combat call ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatEnd {
    /// The battle was fought and its results dismissed
    Completed,
    BeaconFinished,
    BeaconEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatPhase {
    Preparation,
    Execution,
    Status,
}

impl fmt::Display for CombatPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombatPhase::Preparation => write!(f, "preparation"),
            CombatPhase::Execution => write!(f, "execution"),
            CombatPhase::Status => write!(f, "status"),
        }
    }
}

/// Per-step reactions to battle screens.
///
/// Every `handle_*` method returns whether it acted on the current
/// screenshot. Implementors that extend another handler call it first and
/// fall through when it did nothing.
pub trait BattleOutcomeHandler {
    fn timings(&self) -> &TimingSettings;

    fn is_combat_executing(&self, screen: &mut dyn Screen) -> bool;

    fn handle_battle_status(
        &mut self,
        screen: &mut dyn Screen,
        drop: Option<&mut (dyn DropRecord + '_)>,
    ) -> Result<bool, CombatError>;

    fn handle_battle_preparation(
        &mut self,
        screen: &mut dyn Screen,
    ) -> Result<Preparation, CombatError>;

    fn handle_get_items(&mut self, screen: &mut dyn Screen) -> Result<bool, CombatError>;

    fn handle_exp_info(&mut self, screen: &mut dyn Screen) -> Result<bool, CombatError>;

    /// Fight one battle
    fn combat(
        &mut self,
        screen: &mut dyn Screen,
        expected_end: Option<&mut ExpectedEnd<'_>>,
        drop: Option<&mut (dyn DropRecord + '_)>,
    ) -> Result<CombatEnd, CombatError> {
        run_combat(self, screen, expected_end, drop)
    }
}

/// Ticks a phase until it ends or its deadline passes
struct PhaseClock {
    phase: CombatPhase,
    started: Instant,
    timeout: Duration,
    poll: (f32, f32),
}

impl PhaseClock {
    fn start(phase: CombatPhase, timeout: Duration, timings: &TimingSettings) -> Self {
        let poll = timings.poll_interval().as_secs_f32();
        log::debug!("Combat {} phase", phase);
        Self {
            phase,
            started: Instant::now(),
            timeout,
            poll: (poll, poll),
        }
    }

    fn wait(&self, screen: &mut dyn Screen) -> Result<(), CombatError> {
        let elapsed = self.started.elapsed();
        if elapsed >= self.timeout {
            log::warn!("Combat {} phase timed out after {:?}", self.phase, elapsed);
            return Err(CombatError::Timeout {
                phase: self.phase,
                elapsed,
            });
        }
        screen.sleep(self.poll);
        Ok(())
    }
}

/// Drive a battle from preparation to the end of the result screens.
///
/// Without `expected_end` the battle is over once EXP info was dismissed and
/// a later screenshot shows no result screen.
pub fn run_combat<H: BattleOutcomeHandler + ?Sized>(
    handler: &mut H,
    screen: &mut dyn Screen,
    mut expected_end: Option<&mut ExpectedEnd<'_>>,
    mut drop: Option<&mut (dyn DropRecord + '_)>,
) -> Result<CombatEnd, CombatError> {
    let timings = handler.timings().clone();

    let clock = PhaseClock::start(
        CombatPhase::Preparation,
        timings.preparation_timeout(),
        &timings,
    );
    loop {
        screen.screenshot()?;
        if handler.is_combat_executing(screen) {
            break;
        }
        match handler.handle_battle_preparation(screen)? {
            Preparation::Finished => return Err(CombatError::Terminal(TerminalSignal::Finished)),
            Preparation::Empty => return Err(CombatError::Terminal(TerminalSignal::Empty)),
            Preparation::Continue { .. } => {}
        }
        clock.wait(screen)?;
    }

    let mut exp_info = false;
    let clock = PhaseClock::start(CombatPhase::Execution, timings.execution_timeout(), &timings);
    loop {
        screen.screenshot()?;
        if !handler.is_combat_executing(screen) {
            if handler.handle_battle_status(screen, drop.as_deref_mut())?
                || handler.handle_get_items(screen)?
            {
                break;
            }
            if handler.handle_exp_info(screen)? {
                exp_info = true;
                break;
            }
        }
        clock.wait(screen)?;
    }

    let clock = PhaseClock::start(CombatPhase::Status, timings.status_timeout(), &timings);
    loop {
        screen.screenshot()?;
        if let Some(end) = expected_end.as_deref_mut() {
            if end(&mut *screen)? {
                break;
            }
        }

        let handled = if handler.handle_get_items(screen)? {
            true
        } else if handler.handle_battle_status(screen, drop.as_deref_mut())? {
            true
        } else if handler.handle_exp_info(screen)? {
            exp_info = true;
            true
        } else {
            false
        };

        if expected_end.is_none() && exp_info && !handled {
            break;
        }
        clock.wait(screen)?;
    }

    log::info!("Combat end");
    Ok(CombatEnd::Completed)
}

/// Hand the result screen to the drop tracker, or give it a moment to settle
pub(crate) fn record_drop(
    screen: &mut dyn Screen,
    drop: Option<&mut (dyn DropRecord + '_)>,
) {
    match drop {
        Some(drop) => drop.handle_add(&*screen),
        None => screen.sleep(RESULT_SLEEP),
    }
}

/// Combat errors
#[derive(Debug, thiserror::Error)]
pub enum CombatError {
    #[error("Vision error: {0}")]
    Vision(#[from] VisionError),
    #[error("Combat stopped: {0}")]
    Terminal(TerminalSignal),
    #[error("Combat {phase} phase timed out after {elapsed:?}")]
    Timeout {
        phase: CombatPhase,
        elapsed: Duration,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{button, ScriptedScreen};
    use crate::vision::assets::names;

    fn combat() -> Combat {
        Combat::new(CombatAssets::scripted(), TimingSettings::default())
    }

    #[test]
    fn test_preparation_handled() {
        assert!(Preparation::HANDLED.is_handled());
        assert!(!Preparation::NOT_HANDLED.is_handled());
        assert!(Preparation::Finished.is_handled());
        assert_eq!(Preparation::from(false), Preparation::NOT_HANDLED);
    }

    #[test]
    fn test_full_battle_without_expected_end() {
        let mut screen = ScriptedScreen::new()
            .then(&[names::BATTLE_PREPARATION])
            .then(&[names::PAUSE])
            .then(&[names::PAUSE])
            .then(&[names::BATTLE_STATUS_S])
            .then(&[names::GET_ITEMS_1])
            .then(&[names::EXP_INFO_A])
            .then(&[]);
        let mut combat = combat();

        let end = combat.combat(&mut screen, None, None).unwrap();

        assert_eq!(end, CombatEnd::Completed);
        assert_eq!(
            screen.clicks,
            vec![
                names::BATTLE_PREPARATION,
                names::BATTLE_STATUS_S,
                names::GET_ITEMS_1,
                names::EXP_INFO_A,
            ]
        );
        assert!(screen.sleeps.contains(&RESULT_SLEEP));
        assert_eq!(screen.screenshots, 7);
    }

    #[test]
    fn test_expected_end_stops_status_phase() {
        let mut screen = ScriptedScreen::new()
            .then(&[names::PAUSE])
            .then(&[names::BATTLE_STATUS_B])
            .then(&[names::IN_MAP]);
        let mut combat = combat();
        let in_map = button(names::IN_MAP);
        let mut checks = 0;
        let mut end = |screen: &mut dyn Screen| -> Result<bool, CombatError> {
            checks += 1;
            Ok(screen.appear(&in_map, None, None))
        };

        let result = combat.combat(&mut screen, Some(&mut end), None).unwrap();

        assert_eq!(result, CombatEnd::Completed);
        assert_eq!(checks, 1);
        assert_eq!(screen.clicks, vec![names::BATTLE_STATUS_B]);
    }

    #[test]
    fn test_drop_record_replaces_sleep() {
        let mut screen = ScriptedScreen::new()
            .then(&[names::PAUSE])
            .then(&[names::BATTLE_STATUS_A])
            .then(&[names::EXP_INFO_S])
            .then(&[]);
        let mut drop = DropImage::new();

        combat()
            .combat(&mut screen, None, Some(&mut drop))
            .unwrap();

        assert_eq!(drop.len(), 1);
        assert!(!screen.sleeps.contains(&RESULT_SLEEP));
    }

    #[test]
    fn test_drop_record_sees_every_result_screen() {
        // One result screen ends execution, two more show in the status phase
        let mut screen = ScriptedScreen::new()
            .then(&[names::PAUSE])
            .then(&[names::BATTLE_STATUS_S])
            .then(&[names::BATTLE_STATUS_A])
            .then(&[names::BATTLE_STATUS_B])
            .then(&[names::EXP_INFO_B])
            .then(&[]);
        let mut drop = DropImage::new();

        let end = run_combat(&mut combat(), &mut screen, None, Some(&mut drop)).unwrap();

        assert_eq!(end, CombatEnd::Completed);
        assert_eq!(drop.len(), 3);
    }

    #[test]
    fn test_preparation_timeout() {
        let mut timings = TimingSettings::default();
        timings.preparation_timeout = 0;
        let mut combat = Combat::new(CombatAssets::scripted(), timings);
        let mut screen = ScriptedScreen::new();

        let err = combat.combat(&mut screen, None, None).unwrap_err();

        assert!(matches!(
            err,
            CombatError::Timeout {
                phase: CombatPhase::Preparation,
                ..
            }
        ));
    }
}
