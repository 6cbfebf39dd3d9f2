pub mod initdb;
pub mod recalculate;
pub mod serve;
pub mod status;

pub use initdb::init_database;
pub use recalculate::recalculate;
pub use serve::serve;
pub use status::budget_status;
