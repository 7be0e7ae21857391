pub mod command;
pub mod scan_event;
pub mod station_visit;
pub mod visitor;

pub use command::Command;
pub use scan_event::ScanEvent;
pub use station_visit::StationVisit;
pub use visitor::Visitor;
