pub mod model;
pub mod place_id;
pub mod reconcile;
pub mod tag;

pub use model::{
    Confidence, MentionSource, Place, PlaceMap, RawMention, ResolvedMention, Sentiment,
};
pub use place_id::place_id;
pub use reconcile::{ReconcileSummary, reconcile};
pub use tag::{FALLBACK_TAG, TAXONOMY, TagRules};
