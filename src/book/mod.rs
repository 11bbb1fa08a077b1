mod opening_book;

pub use opening_book::OpeningBook;
