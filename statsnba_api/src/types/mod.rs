//! Wire-level types: endpoint identifiers, season types and result set payloads.

mod endpoint;
mod result_set;
mod season_type;

pub use self::endpoint::{Endpoint, ResultSetName};
pub use self::result_set::{ResultSelector, ResultSet};
pub use self::season_type::{ParseSeasonTypeError, PlayerOrTeam, SeasonType};
