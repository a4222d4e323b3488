mod handler;
mod model;

pub use handler::search;
pub use model::ValidatedSearchQuery;
