pub mod entry;

pub use entry::{Author, Entry, EntryDate};
