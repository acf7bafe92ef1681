// Core modules implementing the record table, loading, and error modeling.
pub mod error;
pub mod loader;
pub mod rating;
pub mod record;
pub mod table;
