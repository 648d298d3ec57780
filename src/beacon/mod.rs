//! Operation Siren ash beacons
//!
//! While exploring the Operation Siren map, ash accumulates towards the next
//! beacon. [`OpsiAsh`] watches the indicator on the map page and, once a
//! beacon is ready, hands over to the beacon task through the scheduler.

pub mod combat;
pub mod status;
pub mod trigger;

use chrono::{Local, NaiveDateTime};

use crate::combat::{BattleOutcomeHandler, CombatEnd, CombatError, DropRecord};
use crate::config::{Config, ConfigError, Settings};
use crate::vision::assets::{names, AssetError};
use crate::vision::{AssetTable, Button, Offset, Screen};

pub use combat::{AshCombat, AshCombatAssets};
pub use status::{AshCollectStatus, Theme};
pub use trigger::{beacon_attack_enabled, should_preempt, should_preempt_at, ASH_BEACON_TASK};

/// The map header can slide sideways with the zone name
const IN_MAP_OFFSET: Offset = (200, 5);

/// Ash beacon handling on the Operation Siren map
#[derive(Debug, Clone)]
pub struct OpsiAsh {
    in_map: Button,
    status: AshCollectStatus,
    combat: AshCombat,
}

impl OpsiAsh {
    pub fn new(in_map: Button, status: AshCollectStatus, combat: AshCombat) -> Self {
        Self {
            in_map,
            status,
            combat,
        }
    }

    pub fn from_table(table: &AssetTable, settings: &Settings) -> Result<Self, AssetError> {
        Ok(Self::new(
            table.button(names::IN_MAP, settings.server)?,
            AshCollectStatus::from_table(table, settings.server)?,
            AshCombat::from_table(table, settings)?,
        ))
    }

    pub fn status(&self) -> &AshCollectStatus {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut AshCollectStatus {
        &mut self.status
    }

    pub fn is_in_map(&self, screen: &mut dyn Screen) -> bool {
        screen.appear(&self.in_map, Some(IN_MAP_OFFSET), None)
    }

    /// Call the beacon task if a beacon is ready.
    ///
    /// Returns whether the task was called. Expects the map page and leaves
    /// it showing.
    pub fn handle_ash_beacon_attack(
        &mut self,
        screen: &mut dyn Screen,
        config: &mut Config,
    ) -> Result<bool, ConfigError> {
        self.handle_ash_beacon_attack_at(screen, config, Local::now().naive_local())
    }

    pub fn handle_ash_beacon_attack_at(
        &mut self,
        screen: &mut dyn Screen,
        config: &mut Config,
        now: NaiveDateTime,
    ) -> Result<bool, ConfigError> {
        if !beacon_attack_enabled(config) {
            return Ok(false);
        }

        if self.status.estimate(screen) >= 100
            && should_preempt_at(config, ASH_BEACON_TASK, now)
        {
            config.task_call_at(ASH_BEACON_TASK, now)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Fight a beacon battle and come back to the map
    pub fn run_beacon_attack(
        &mut self,
        screen: &mut dyn Screen,
        drop: Option<&mut (dyn DropRecord + '_)>,
    ) -> Result<CombatEnd, CombatError> {
        let in_map = self.in_map.clone();
        let mut is_in_map = move |screen: &mut dyn Screen| -> Result<bool, CombatError> {
            Ok(screen.appear(&in_map, Some(IN_MAP_OFFSET), None))
        };
        let end = self.combat.combat(screen, Some(&mut is_in_map), drop)?;
        log::info!("Beacon attack end: {:?}", end);
        Ok(end)
    }
}
