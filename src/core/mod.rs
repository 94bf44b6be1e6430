// Core algorithm exports
pub mod assembler;
pub mod distance;
pub mod error;
pub mod exclusion;
pub mod filters;
pub mod matcher;
pub mod ports;
pub mod scoring;

pub use assembler::{assemble, AssemblyInput};
pub use distance::{calculate_bounding_box, distance_km_rounded, haversine_distance, is_within_bounding_box};
pub use error::{AuthError, MatchError, ScorerError, StoreError};
pub use exclusion::{ExclusionSet, ExclusionSetBuilder};
pub use filters::{filter_by_category, matches_category, paginate};
pub use matcher::{MatchPorts, SwipeMatcher};
pub use ports::{
    CompatibilityScorer, GeoCandidateFinder, IdentityResolver, InteractionStore,
    PatternLookupGateway, PhotoAttachmentGateway, UserStore,
};
pub use scoring::{index_results, MatchUsersRequest, ScoringProfile};
