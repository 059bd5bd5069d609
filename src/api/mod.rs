// Resource endpoints
// Thin typed wrappers; every call goes through the authenticated client

mod columns;
mod portfolios;
mod reviews;

pub use columns::ColumnApi;
pub use portfolios::PortfolioApi;
pub use reviews::ReviewApi;

pub const PORTFOLIOS_ENDPOINT: &str = "/api/v1/portfolios";
pub const COLUMNS_ENDPOINT: &str = "/api/v1/columns";
pub const REVIEWS_ENDPOINT: &str = "/api/v1/reviews";
