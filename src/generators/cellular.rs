//! Cellular automata cave pipeline

use crate::config::Config;
use crate::passes::{
    CaIteratePass, CavernRoomsPass, ConnectRegionsPass, CrossingScanPass, DecoratePass,
    EmitSpawnsPass, ExtractRegionsPass, KeepLargeRegionsPass, NoiseFillPass, ResolveCentersPass,
    RoomKindsPass, SynthesizeRegionRoomsPass, ValidateInvariantsPass,
};
use crate::pipeline::Pipeline;

pub fn pipeline(_config: &Config) -> Pipeline {
    Pipeline::new()
        .then(NoiseFillPass)
        .then(CaIteratePass)
        .then(ExtractRegionsPass)
        .then(KeepLargeRegionsPass)
        .then(SynthesizeRegionRoomsPass)
        .then(CavernRoomsPass)
        .then(ConnectRegionsPass { width: 2 })
        .then(CrossingScanPass)
        .then(RoomKindsPass)
        .then(EmitSpawnsPass)
        .then(ResolveCentersPass)
        .then(DecoratePass)
        .then(ValidateInvariantsPass)
}
