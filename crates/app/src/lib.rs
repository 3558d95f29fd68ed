pub mod app;
pub mod config;
pub mod error;
pub mod feed;
pub mod services;
pub mod util;

pub use app::{AppConfig, AppState, Dashboard};
pub use config::{AgentFilter, MonitorConfig, StateFilter, ViewMode, ViewPreferences, ViewSnapshot};
pub use error::{AppError, Result};
pub use services::AppServices;
pub use util::time::{
    clamp_range, days_between_inclusive, default_range_for_period, range_from_bounds,
    shift_range, today_local,
};
