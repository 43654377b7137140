//! BSP dungeon pipeline

use crate::config::Config;
use crate::passes::{
    BspPartitionPass, CarveCorridorsPass, CarveRoomsPass, ConnectivityGraphPass, CrossingScanPass,
    DecoratePass, EmitSpawnsPass, InitGridPass, PlaceDoorsPass, PlaceRoomsPass,
    ResolveCentersPass, RoomKindsPass, ValidateInvariantsPass,
};
use crate::pipeline::Pipeline;

/// Corridors tunnel fresh wall in BSP maps; re-using carved floor is
/// three times as expensive.
const FLOOR_PENALTY: f32 = 3.0;

pub fn pipeline(config: &Config) -> Pipeline {
    Pipeline::new()
        .then(InitGridPass)
        .then(BspPartitionPass)
        .then(PlaceRoomsPass)
        .then(CarveRoomsPass)
        .then(ConnectivityGraphPass)
        .then(CarveCorridorsPass {
            style: config.corridor_style,
            width: config.bsp.corridor_width,
            floor_penalty: FLOOR_PENALTY,
        })
        .then(CrossingScanPass)
        .then(PlaceDoorsPass)
        .then(RoomKindsPass)
        .then(EmitSpawnsPass)
        .then(ResolveCentersPass)
        .then(DecoratePass)
        .then(ValidateInvariantsPass)
}
