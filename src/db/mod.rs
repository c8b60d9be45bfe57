pub mod connection;
pub mod markup;

pub use connection::{FileGateway, Gateway, MemoryGateway};
pub use markup::TimesheetDocument;
