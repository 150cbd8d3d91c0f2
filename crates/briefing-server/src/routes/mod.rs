pub mod briefings;
pub mod dispatch;
pub mod results;
pub mod stream;
