mod status;

pub use status::WatchStatus;
