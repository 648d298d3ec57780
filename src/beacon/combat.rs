//! Battle handling while attacking an ash beacon

use std::time::Duration;

use crate::combat::{
    record_drop, run_combat, BattleOutcomeHandler, Combat, CombatAssets, CombatEnd, CombatError,
    DropRecord, ExpectedEnd, Preparation, TerminalSignal,
};
use crate::config::{Settings, TimingSettings};
use crate::vision::assets::{names, AssetError};
use crate::vision::{AssetTable, Button, Screen, Server};

/// Buttons specific to beacon battles
#[derive(Debug, Clone)]
pub struct AshCombatAssets {
    pub battle_status: Button,
    pub battle_preparation: Button,
    pub back_arrow: Button,
    pub ash_start: Button,
    pub beacon_reward: Button,
    pub beacon_empty: Button,
}

impl AshCombatAssets {
    pub fn from_table(table: &AssetTable, server: Server) -> Result<Self, AssetError> {
        let button = |name: &str| table.button(name, server);
        Ok(Self {
            battle_status: button(names::BATTLE_STATUS)?,
            battle_preparation: button(names::BATTLE_PREPARATION)?,
            back_arrow: button(names::BACK_ARROW)?,
            ash_start: button(names::ASH_START)?,
            beacon_reward: button(names::BEACON_REWARD)?,
            beacon_empty: button(names::BEACON_EMPTY)?,
        })
    }
}

/// Beacon battles start from the beacon page instead of the usual fleet
/// preparation, and end on the map with their own result screen.
#[derive(Debug, Clone)]
pub struct AshCombat {
    base: Combat,
    assets: AshCombatAssets,
}

impl AshCombat {
    pub fn new(base: Combat, assets: AshCombatAssets) -> Self {
        Self { base, assets }
    }

    pub fn from_table(table: &AssetTable, settings: &Settings) -> Result<Self, AssetError> {
        Ok(Self::new(
            Combat::new(
                CombatAssets::from_table(table, settings.server)?,
                settings.timings.clone(),
            ),
            AshCombatAssets::from_table(table, settings.server)?,
        ))
    }
}

impl BattleOutcomeHandler for AshCombat {
    fn timings(&self) -> &TimingSettings {
        self.base.timings()
    }

    fn is_combat_executing(&self, screen: &mut dyn Screen) -> bool {
        self.base.is_combat_executing(screen)
    }

    fn handle_battle_status(
        &mut self,
        screen: &mut dyn Screen,
        mut drop: Option<&mut (dyn DropRecord + '_)>,
    ) -> Result<bool, CombatError> {
        if self.is_combat_executing(screen) {
            return Ok(true);
        }
        if self.base.handle_battle_status(screen, drop.as_deref_mut())? {
            return Ok(true);
        }
        let interval = self.timings().battle_status_click_interval();
        if screen.appear(&self.assets.battle_status, Some((20, 20)), interval) {
            record_drop(screen, drop);
            screen.click(&self.assets.battle_status)?;
            return Ok(true);
        }
        if screen.appear(
            &self.assets.battle_preparation,
            Some((30, 30)),
            Some(Duration::from_secs(3)),
        ) {
            screen.click(&self.assets.back_arrow)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn handle_battle_preparation(
        &mut self,
        screen: &mut dyn Screen,
    ) -> Result<Preparation, CombatError> {
        let base = self.base.handle_battle_preparation(screen)?;
        if base.is_handled() {
            return Ok(base);
        }
        if screen.appear_then_click(&self.assets.ash_start, Some((30, 30)), None)? {
            return Ok(Preparation::HANDLED);
        }
        if self.handle_get_items(screen)? {
            return Ok(Preparation::HANDLED);
        }
        if screen.appear(&self.assets.beacon_reward, None, None) {
            log::info!("Ash beacon already finished");
            return Ok(Preparation::Finished);
        }
        if screen.appear(&self.assets.beacon_empty, Some((20, 20)), None) {
            log::info!("Ash beacon already empty");
            return Ok(Preparation::Empty);
        }
        Ok(Preparation::NOT_HANDLED)
    }

    fn handle_get_items(&mut self, screen: &mut dyn Screen) -> Result<bool, CombatError> {
        self.base.handle_get_items(screen)
    }

    fn handle_exp_info(&mut self, screen: &mut dyn Screen) -> Result<bool, CombatError> {
        self.base.handle_exp_info(screen)
    }

    /// Fight a beacon battle.
    ///
    /// `expected_end` is also taken to mean "no stray click opened the fleet
    /// preparation page"; if one did, the page is closed again. A beacon that
    /// turns out to be finished or empty is a normal end.
    fn combat(
        &mut self,
        screen: &mut dyn Screen,
        expected_end: Option<&mut ExpectedEnd<'_>>,
        drop: Option<&mut (dyn DropRecord + '_)>,
    ) -> Result<CombatEnd, CombatError> {
        let result = match expected_end {
            Some(end) => {
                let mut end = BeaconEnd {
                    end,
                    battle_preparation: self.assets.battle_preparation.clone(),
                    back_arrow: self.assets.back_arrow.clone(),
                };
                let mut wrapped = |screen: &mut dyn Screen| end.check(screen);
                run_combat(self, screen, Some(&mut wrapped), drop)
            }
            None => run_combat(self, screen, None, drop),
        };

        match result {
            Err(CombatError::Terminal(TerminalSignal::Finished)) => Ok(CombatEnd::BeaconFinished),
            Err(CombatError::Terminal(TerminalSignal::Empty)) => Ok(CombatEnd::BeaconEmpty),
            other => other,
        }
    }
}

/// The caller's end check, plus closing the fleet preparation page a stray
/// click may have opened
struct BeaconEnd<'a, 'b> {
    end: &'a mut ExpectedEnd<'b>,
    battle_preparation: Button,
    back_arrow: Button,
}

impl BeaconEnd<'_, '_> {
    fn check(&mut self, screen: &mut dyn Screen) -> Result<bool, CombatError> {
        if (self.end)(&mut *screen)? {
            log::info!("Beacon combat finished and in correct page");
            return Ok(true);
        }
        if screen.appear(
            &self.battle_preparation,
            Some((30, 30)),
            Some(Duration::from_secs(2)),
        ) {
            log::info!("Wrong click into battle preparation page");
            screen.click(&self.back_arrow)?;
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::DropImage;
    use crate::testing::{button, ScriptedScreen};

    fn ash_combat() -> AshCombat {
        AshCombat::new(
            Combat::new(CombatAssets::scripted(), TimingSettings::default()),
            AshCombatAssets {
                battle_status: button(names::BATTLE_STATUS),
                battle_preparation: button(names::BATTLE_PREPARATION),
                back_arrow: button(names::BACK_ARROW),
                ash_start: button(names::ASH_START),
                beacon_reward: button(names::BEACON_REWARD),
                beacon_empty: button(names::BEACON_EMPTY),
            },
        )
    }

    #[test]
    fn test_status_defers_while_executing() {
        let mut screen = ScriptedScreen::new().showing(&[names::PAUSE, names::BATTLE_STATUS]);

        assert!(ash_combat().handle_battle_status(&mut screen, None).unwrap());
        assert!(screen.clicks.is_empty());
    }

    #[test]
    fn test_base_status_first() {
        let mut screen =
            ScriptedScreen::new().showing(&[names::BATTLE_STATUS_S, names::BATTLE_STATUS]);

        assert!(ash_combat().handle_battle_status(&mut screen, None).unwrap());
        assert_eq!(screen.clicks, vec![names::BATTLE_STATUS_S]);
    }

    #[test]
    fn test_beacon_status_screen() {
        let mut screen = ScriptedScreen::new().showing(&[names::BATTLE_STATUS]);

        assert!(ash_combat().handle_battle_status(&mut screen, None).unwrap());
        assert_eq!(screen.clicks, vec![names::BATTLE_STATUS]);
        assert_eq!(screen.sleeps, vec![(0.25, 0.5)]);
        assert_eq!(screen.queried(names::BATTLE_STATUS), Some((Some((20, 20)), None)));
    }

    #[test]
    fn test_beacon_status_screen_with_drop() {
        let mut screen = ScriptedScreen::new().showing(&[names::BATTLE_STATUS]);
        let mut drop = DropImage::new();

        assert!(ash_combat()
            .handle_battle_status(&mut screen, Some(&mut drop))
            .unwrap());
        assert_eq!(drop.len(), 1);
        assert!(screen.sleeps.is_empty());
    }

    fn beacon_end<'a, 'b>(end: &'a mut ExpectedEnd<'b>) -> BeaconEnd<'a, 'b> {
        BeaconEnd {
            end,
            battle_preparation: button(names::BATTLE_PREPARATION),
            back_arrow: button(names::BACK_ARROW),
        }
    }

    #[test]
    fn test_end_check_closes_preparation_page() {
        let mut screen = ScriptedScreen::new().showing(&[names::BATTLE_PREPARATION]);
        let mut not_yet = |_: &mut dyn Screen| -> Result<bool, CombatError> { Ok(false) };

        assert!(!beacon_end(&mut not_yet).check(&mut screen).unwrap());
        assert_eq!(screen.clicks, vec![names::BACK_ARROW]);
        assert_eq!(
            screen.queries(names::BATTLE_PREPARATION),
            vec![(Some((30, 30)), Some(Duration::from_secs(2)))]
        );
    }

    #[test]
    fn test_end_check_passes_through() {
        let mut screen = ScriptedScreen::new().showing(&[names::BATTLE_PREPARATION]);
        let mut done = |_: &mut dyn Screen| -> Result<bool, CombatError> { Ok(true) };
        assert!(beacon_end(&mut done).check(&mut screen).unwrap());
        assert!(screen.clicks.is_empty());
        assert!(screen.queries(names::BATTLE_PREPARATION).is_empty());

        let mut screen = ScriptedScreen::new();
        let mut not_yet = |_: &mut dyn Screen| -> Result<bool, CombatError> { Ok(false) };
        assert!(!beacon_end(&mut not_yet).check(&mut screen).unwrap());
        assert!(screen.clicks.is_empty());
    }

    #[test]
    fn test_preparation_misnavigation_goes_back() {
        let mut screen = ScriptedScreen::new().showing(&[names::BATTLE_PREPARATION]);
        assert!(ash_combat().handle_battle_status(&mut screen, None).unwrap());
        assert_eq!(screen.clicks, vec![names::BACK_ARROW]);
        assert_eq!(
            screen.queried(names::BATTLE_PREPARATION),
            Some((Some((30, 30)), Some(Duration::from_secs(3))))
        );

        let mut screen = ScriptedScreen::new().showing(&[names::BATTLE_PREPARATION]);
        let mut drop = DropImage::new();
        assert!(ash_combat()
            .handle_battle_status(&mut screen, Some(&mut drop))
            .unwrap());
        assert_eq!(screen.clicks, vec![names::BACK_ARROW]);
        assert!(drop.is_empty());
    }

    #[test]
    fn test_status_nothing_to_do() {
        let mut screen = ScriptedScreen::new();
        assert!(!ash_combat().handle_battle_status(&mut screen, None).unwrap());
    }

    #[test]
    fn test_preparation_outcomes() {
        let cases = [
            (names::ASH_START, Preparation::HANDLED, Some(names::ASH_START)),
            (names::GET_ITEMS_1, Preparation::HANDLED, Some(names::GET_ITEMS_1)),
            (names::BEACON_REWARD, Preparation::Finished, None),
            (names::BEACON_EMPTY, Preparation::Empty, None),
        ];
        for (visible, expected, click) in cases {
            let mut screen = ScriptedScreen::new().showing(&[visible]);
            let outcome = ash_combat().handle_battle_preparation(&mut screen).unwrap();
            assert_eq!(outcome, expected, "{}", visible);
            assert_eq!(screen.clicks.first().map(String::as_str), click, "{}", visible);
        }

        let mut screen = ScriptedScreen::new();
        assert_eq!(
            ash_combat().handle_battle_preparation(&mut screen).unwrap(),
            Preparation::NOT_HANDLED
        );
        assert_eq!(screen.queried(names::BEACON_EMPTY), Some((Some((20, 20)), None)));
        assert_eq!(screen.queried(names::ASH_START), Some((Some((30, 30)), None)));
    }

    #[test]
    fn test_finished_beacon_ends_combat() {
        let mut screen = ScriptedScreen::new().showing(&[names::BEACON_REWARD]);
        let mut combat = ash_combat();

        let err = run_combat(&mut combat, &mut screen, None, None).unwrap_err();
        assert!(matches!(err, CombatError::Terminal(TerminalSignal::Finished)));

        let end = combat.combat(&mut screen, None, None).unwrap();
        assert_eq!(end, CombatEnd::BeaconFinished);
    }

    #[test]
    fn test_empty_beacon_ends_combat() {
        let mut screen = ScriptedScreen::new().showing(&[names::BEACON_EMPTY]);
        let mut in_map = |_: &mut dyn Screen| -> Result<bool, CombatError> { Ok(false) };

        let end = ash_combat()
            .combat(&mut screen, Some(&mut in_map), None)
            .unwrap();
        assert_eq!(end, CombatEnd::BeaconEmpty);
    }

    #[test]
    fn test_expected_end_backs_out_of_preparation() {
        let mut screen = ScriptedScreen::new()
            .then(&[names::ASH_START])
            .then(&[names::PAUSE])
            .then(&[names::BATTLE_STATUS])
            .then(&[names::BATTLE_PREPARATION])
            .then(&[names::IN_MAP]);
        let in_map = button(names::IN_MAP);
        let mut end = |screen: &mut dyn Screen| -> Result<bool, CombatError> {
            Ok(screen.appear(&in_map, Some((200, 5)), None))
        };

        let result = ash_combat()
            .combat(&mut screen, Some(&mut end), None)
            .unwrap();

        assert_eq!(result, CombatEnd::Completed);
        // Once from the end check, once from the status handler
        assert_eq!(
            screen.clicks,
            vec![
                names::ASH_START,
                names::BATTLE_STATUS,
                names::BACK_ARROW,
                names::BACK_ARROW
            ]
        );
        assert!(screen
            .queries(names::BATTLE_PREPARATION)
            .contains(&(Some((30, 30)), Some(Duration::from_secs(2)))));
    }
}
