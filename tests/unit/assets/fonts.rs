use super::*;

#[test]
fn in_memory_book_without_fonts_is_empty() {
    let book = FontBook::from_font_data(Vec::<Vec<u8>>::new());
    assert!(book.is_empty());
    assert_eq!(book.face_count(), 0);
}

#[test]
fn garbage_font_data_adds_no_faces() {
    let book = FontBook::from_font_data([vec![0u8; 16]]);
    assert_eq!(book.face_count(), 0);
}

#[test]
fn missing_font_dir_is_not_fatal() {
    let book = FontBook::with_dirs(["/definitely/not/a/font/dir"]);
    let system = FontBook::system();
    assert_eq!(book.face_count(), system.face_count());
}

#[test]
fn options_share_the_database() {
    let book = FontBook::system();
    let opts = book.usvg_options();
    assert_eq!(opts.fontdb.len(), book.face_count());
}
