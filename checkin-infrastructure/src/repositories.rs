pub mod access_book_file;

pub use access_book_file::*;
