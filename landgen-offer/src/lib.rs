pub mod targeting;
pub mod selection;

pub use targeting::{LocationScope, NoMatch, OfferMatch, TargetingFilter, TargetingOutcome};
pub use selection::{offers_for_location, offers_for_service};
