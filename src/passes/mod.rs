//! Reusable pipeline passes

pub mod connect;
pub mod decorate;
pub mod doors;
pub mod init;
pub mod rooms;
pub mod spawns;
pub mod validate;

pub use connect::{CarveCorridorsPass, ConnectRegionsPass, ConnectivityGraphPass, CrossingScanPass};
pub use decorate::DecoratePass;
pub use doors::PlaceDoorsPass;
pub use init::{CaIteratePass, ExtractRegionsPass, InitGridPass, KeepLargeRegionsPass, NoiseFillPass};
pub use rooms::{
    BspPartitionPass, CarveRoomsPass, CavernRoomsPass, PlaceRoomsPass, ResolveCentersPass,
    RoomKindsPass, SynthesizeRegionRoomsPass,
};
pub use spawns::EmitSpawnsPass;
pub use validate::ValidateInvariantsPass;
