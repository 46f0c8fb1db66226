pub mod connection;
pub mod message;

pub use connection::{IrcConnection, IrcSession};
pub use message::Message;
