mod error_banner;
mod log_list;

pub use error_banner::ErrorBanner;
pub use log_list::LogList;
