pub mod catalog;
pub mod combat;
pub mod dispatch;
pub mod economy;
pub mod logic;
pub mod room;
pub mod session;
pub mod types;
