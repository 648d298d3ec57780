//! Generic battle handler shared by every kind of fight

use std::time::Duration;

use super::{record_drop, BattleOutcomeHandler, CombatError, DropRecord, Preparation};
use crate::config::TimingSettings;
use crate::vision::assets::{names, AssetError};
use crate::vision::{AssetTable, Button, Screen, Server};

const PREPARATION_INTERVAL: Duration = Duration::from_secs(2);

/// Buttons every battle shows
#[derive(Debug, Clone)]
pub struct CombatAssets {
    pub pause: Button,
    pub battle_preparation: Button,
    pub battle_status: [Button; 3],
    pub get_items: [Button; 2],
    pub exp_info: [Button; 3],
}

impl CombatAssets {
    pub fn from_table(table: &AssetTable, server: Server) -> Result<Self, AssetError> {
        let button = |name: &str| table.button(name, server);
        Ok(Self {
            pause: button(names::PAUSE)?,
            battle_preparation: button(names::BATTLE_PREPARATION)?,
            battle_status: [
                button(names::BATTLE_STATUS_S)?,
                button(names::BATTLE_STATUS_A)?,
                button(names::BATTLE_STATUS_B)?,
            ],
            get_items: [button(names::GET_ITEMS_1)?, button(names::GET_ITEMS_2)?],
            exp_info: [
                button(names::EXP_INFO_S)?,
                button(names::EXP_INFO_A)?,
                button(names::EXP_INFO_B)?,
            ],
        })
    }

    #[cfg(test)]
    pub(crate) fn scripted() -> Self {
        use crate::testing::button;
        Self {
            pause: button(names::PAUSE),
            battle_preparation: button(names::BATTLE_PREPARATION),
            battle_status: [
                button(names::BATTLE_STATUS_S),
                button(names::BATTLE_STATUS_A),
                button(names::BATTLE_STATUS_B),
            ],
            get_items: [button(names::GET_ITEMS_1), button(names::GET_ITEMS_2)],
            exp_info: [
                button(names::EXP_INFO_S),
                button(names::EXP_INFO_A),
                button(names::EXP_INFO_B),
            ],
        }
    }
}

/// The base battle handler
#[derive(Debug, Clone)]
pub struct Combat {
    assets: CombatAssets,
    timings: TimingSettings,
}

impl Combat {
    pub fn new(assets: CombatAssets, timings: TimingSettings) -> Self {
        Self { assets, timings }
    }

    pub fn assets(&self) -> &CombatAssets {
        &self.assets
    }

    /// Click the first of `buttons` on screen
    fn click_first(
        screen: &mut dyn Screen,
        buttons: &[Button],
        offset: Option<(i32, i32)>,
        interval: Option<Duration>,
    ) -> Result<Option<usize>, CombatError> {
        for (index, button) in buttons.iter().enumerate() {
            if screen.appear_then_click(button, offset, interval)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }
}

impl BattleOutcomeHandler for Combat {
    fn timings(&self) -> &TimingSettings {
        &self.timings
    }

    fn is_combat_executing(&self, screen: &mut dyn Screen) -> bool {
        screen.appear(&self.assets.pause, None, None)
    }

    fn handle_battle_status(
        &mut self,
        screen: &mut dyn Screen,
        drop: Option<&mut (dyn DropRecord + '_)>,
    ) -> Result<bool, CombatError> {
        let interval = self.timings.battle_status_click_interval();
        let Some(status) = self
            .assets
            .battle_status
            .iter()
            .find(|button| screen.appear(button, None, interval))
        else {
            return Ok(false);
        };

        log::info!("Battle status: {}", status);
        record_drop(screen, drop);
        screen.click(status)?;
        Ok(true)
    }

    fn handle_battle_preparation(
        &mut self,
        screen: &mut dyn Screen,
    ) -> Result<Preparation, CombatError> {
        let clicked = screen.appear_then_click(
            &self.assets.battle_preparation,
            None,
            Some(PREPARATION_INTERVAL),
        )?;
        Ok(Preparation::from(clicked))
    }

    fn handle_get_items(&mut self, screen: &mut dyn Screen) -> Result<bool, CombatError> {
        let interval = self.timings.battle_status_click_interval();
        Ok(Self::click_first(screen, &self.assets.get_items, Some((5, 5)), interval)?.is_some())
    }

    fn handle_exp_info(&mut self, screen: &mut dyn Screen) -> Result<bool, CombatError> {
        let interval = self.timings.battle_status_click_interval();
        Ok(Self::click_first(screen, &self.assets.exp_info, None, interval)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::DropImage;
    use crate::testing::ScriptedScreen;

    fn combat() -> Combat {
        Combat::new(CombatAssets::scripted(), TimingSettings::default())
    }

    #[test]
    fn test_executing_follows_pause() {
        let combat = combat();
        assert!(combat.is_combat_executing(&mut ScriptedScreen::new().showing(&[names::PAUSE])));
        assert!(!combat.is_combat_executing(&mut ScriptedScreen::new()));
    }

    #[test]
    fn test_battle_status_clicks_rank() {
        let mut screen = ScriptedScreen::new().showing(&[names::BATTLE_STATUS_A]);
        let mut drop = DropImage::new();

        assert!(combat().handle_battle_status(&mut screen, Some(&mut drop)).unwrap());
        assert_eq!(screen.clicks, vec![names::BATTLE_STATUS_A]);
        assert_eq!(drop.len(), 1);
        assert!(screen.sleeps.is_empty());
    }

    #[test]
    fn test_battle_status_sleeps_without_drop() {
        let mut screen = ScriptedScreen::new().showing(&[names::BATTLE_STATUS_S]);

        assert!(combat().handle_battle_status(&mut screen, None).unwrap());
        assert_eq!(screen.sleeps, vec![(0.25, 0.5)]);
    }

    #[test]
    fn test_nothing_to_handle() {
        let mut screen = ScriptedScreen::new();
        let mut combat = combat();

        assert!(!combat.handle_battle_status(&mut screen, None).unwrap());
        assert_eq!(
            combat.handle_battle_preparation(&mut screen).unwrap(),
            Preparation::NOT_HANDLED
        );
        assert!(!combat.handle_get_items(&mut screen).unwrap());
        assert!(!combat.handle_exp_info(&mut screen).unwrap());
        assert!(screen.clicks.is_empty());
    }

    #[test]
    fn test_get_items_uses_offset() {
        let mut screen = ScriptedScreen::new().showing(&[names::GET_ITEMS_2]);

        assert!(combat().handle_get_items(&mut screen).unwrap());
        assert_eq!(screen.clicks, vec![names::GET_ITEMS_2]);
        assert_eq!(screen.queried(names::GET_ITEMS_1), Some((Some((5, 5)), None)));
    }

    #[test]
    fn test_preparation_clicks_start() {
        let mut screen = ScriptedScreen::new().showing(&[names::BATTLE_PREPARATION]);

        assert_eq!(
            combat().handle_battle_preparation(&mut screen).unwrap(),
            Preparation::HANDLED
        );
        assert_eq!(
            screen.queried(names::BATTLE_PREPARATION),
            Some((None, Some(Duration::from_secs(2))))
        );
    }
}
