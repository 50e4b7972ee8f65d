pub mod model;
pub mod view;

pub use model::{Backdrop, CardFace, State};
pub use view::draw;

pub const CARD_CORNER_RADIUS: f64 = 24.0;
pub const CARD_PADDING: f64 = 24.0;
/// Share of the card height taken by the media area.
pub const MEDIA_FRACTION: f64 = 0.55;
pub const TITLE_SIZE_FACTOR: f64 = 0.075;
pub const DESCRIPTION_SIZE_FACTOR: f64 = 0.042;
pub const PLACEHOLDER_ALPHA: f64 = 0.12;
/// Pixels of rotation input per discrete wheel notch.
pub const WHEEL_STEP: f64 = 50.0;
