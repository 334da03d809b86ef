use crate::entry;
use crate::SstError;

// -------------------- Encoding / splitting --------------------

#[test]
fn encode_produces_single_line() {
    assert_eq!(entry::encode("k", "v"), "k,v\n");
    assert_eq!(entry::encode("k", ""), "k,\n");
}

#[test]
fn split_on_first_comma_only() {
    assert_eq!(entry::split("k,a,b,c"), Some(("k", "a,b,c")));
    assert_eq!(entry::split("k,"), Some(("k", "")));
    assert_eq!(entry::split("no-comma"), None);
}

#[test]
fn index_line_uses_decimal_offset() {
    assert_eq!(entry::encode_index_line("k", 0), "k,0\n");
    assert_eq!(entry::encode_index_line("k", 1234), "k,1234\n");
}

// -------------------- Key validation --------------------

#[test]
fn empty_key_rejected() {
    assert!(matches!(
        entry::check_key(""),
        Err(SstError::InvalidKey(_, _))
    ));
}

#[test]
fn key_with_comma_rejected() {
    assert!(matches!(
        entry::check_key("a,b"),
        Err(SstError::InvalidKey(_, _))
    ));
}

#[test]
fn key_with_newline_rejected() {
    assert!(matches!(
        entry::check_key("a\nb"),
        Err(SstError::InvalidKey(_, _))
    ));
}

#[test]
fn plain_key_accepted() {
    assert!(entry::check_key("user:42").is_ok());
}

// -------------------- Value validation --------------------

#[test]
fn value_with_newline_rejected() {
    assert!(matches!(
        entry::check_value("k", "a\nb"),
        Err(SstError::InvalidValue(_, _))
    ));
}

#[test]
fn value_with_commas_accepted() {
    assert!(entry::check_value("k", "a,b,c").is_ok());
    assert!(entry::check_value("k", "").is_ok());
}
