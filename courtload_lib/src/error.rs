//! Run-level error for the load, scrape and export entry points.

use std::fmt;

use crate::bbref::ScrapeError;
use crate::client::ClientError;
use crate::db::DbError;
use crate::export::ExportError;
use crate::season::SeasonError;

/// Fatal errors of a run. Per-task upstream failures never surface here;
/// they are logged and their datasets come back empty.
#[derive(Debug)]
pub enum LoadError {
    /// The warehouse could not be opened, written or locked.
    Store(DbError),
    /// The stats API client could not be built.
    Client(ClientError),
    /// A scrape page failed after all retries.
    Scrape(ScrapeError),
    /// Export to files failed.
    Export(ExportError),
    /// The requested seasons were invalid.
    Season(SeasonError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "Warehouse error: {}", e),
            Self::Client(e) => write!(f, "Client error: {}", e),
            Self::Scrape(e) => write!(f, "Scrape error: {}", e),
            Self::Export(e) => write!(f, "Export error: {}", e),
            Self::Season(e) => write!(f, "Invalid season: {}", e),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Client(e) => Some(e),
            Self::Scrape(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Season(e) => Some(e),
        }
    }
}

impl From<DbError> for LoadError {
    fn from(e: DbError) -> Self {
        Self::Store(e)
    }
}

impl From<ClientError> for LoadError {
    fn from(e: ClientError) -> Self {
        Self::Client(e)
    }
}

impl From<ScrapeError> for LoadError {
    fn from(e: ScrapeError) -> Self {
        Self::Scrape(e)
    }
}

impl From<ExportError> for LoadError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

impl From<SeasonError> for LoadError {
    fn from(e: SeasonError) -> Self {
        Self::Season(e)
    }
}
