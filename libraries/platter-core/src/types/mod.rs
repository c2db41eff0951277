mod ids;
mod side;

pub use ids::{SideId, TrackId};
pub use side::{Side, Track};
