pub mod appointment;
pub mod enums;
pub mod message;
pub mod notification;
pub mod patient;
pub mod profile;
pub mod shift;
pub mod soin;

pub use appointment::*;
pub use message::*;
pub use notification::*;
pub use patient::*;
pub use profile::*;
pub use shift::*;
pub use soin::*;
