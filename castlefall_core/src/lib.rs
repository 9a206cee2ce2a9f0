pub mod deck;
pub mod error;
pub mod protocol;
pub mod room;
pub mod wordlist;

pub use error::{Error, Result, StartError};
pub use room::Room;
pub use wordlist::WordLists;
