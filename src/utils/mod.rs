pub mod clock;
pub mod date;
pub mod duration;
pub mod locale;
pub mod scope;

pub use clock::{Clock, FixedClock, SystemClock};
pub use date::{compare_meta, format_date, format_day_of_week, format_week_of_year, ClockTime, Meta};
pub use duration::{duration, Minutes};
pub use locale::{translate_weekday, weekday_label};
pub use scope::{Scope, ScopeFilter};
