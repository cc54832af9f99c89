use super::codecs::{
    decode_int_csv, decode_metadata, decode_user_list, encode_int_csv, encode_metadata,
    encode_user_list, parse_f64_opt, parse_int_or_zero, parse_leading_int,
};
use std::collections::BTreeMap;

#[test]
fn test_parse_leading_int() {
    assert_eq!(parse_leading_int("7"), 7);
    assert_eq!(parse_leading_int("7abc"), 7);
    assert_eq!(parse_leading_int("3."), 3);
    assert_eq!(parse_leading_int(""), 0);
    assert_eq!(parse_leading_int("abc"), 0);
    assert_eq!(parse_leading_int("  14h"), 14);
}

#[test]
fn test_parse_int_or_zero_tolerates_garbage() {
    assert_eq!(parse_int_or_zero("12"), 12);
    assert_eq!(parse_int_or_zero("-4"), -4);
    assert_eq!(parse_int_or_zero("x"), 0);
    assert_eq!(parse_int_or_zero(""), 0);
}

#[test]
fn test_parse_f64_opt() {
    assert_eq!(parse_f64_opt("1.5"), Some(1.5));
    assert_eq!(parse_f64_opt(""), None);
    assert_eq!(parse_f64_opt("n/a"), None);
}

#[test]
fn test_int_csv_round_trip() {
    let sizes = vec![5, 5, 3];
    let encoded = encode_int_csv(&sizes);
    assert_eq!(encoded, "5,5,3");
    assert_eq!(decode_int_csv(&encoded), sizes);
}

#[test]
fn test_int_csv_tolerant_decode() {
    assert_eq!(decode_int_csv(""), Vec::<i32>::new());
    assert_eq!(decode_int_csv("5,x,3"), vec![5, 0, 3]);
}

#[test]
fn test_metadata_round_trip() {
    let mut map = BTreeMap::new();
    map.insert("species".to_string(), "rat".to_string());
    map.insert("strain".to_string(), "Wistar".to_string());
    let encoded = encode_metadata(&map);
    assert_eq!(encoded, "species=rat;strain=Wistar");
    assert_eq!(decode_metadata(&encoded), map);
}

#[test]
fn test_metadata_keeps_entries_without_value() {
    let map = decode_metadata("flag;species=rat");
    assert_eq!(map.get("flag"), Some(&String::new()));
    assert_eq!(map.get("species"), Some(&"rat".to_string()));
}

#[test]
fn test_user_list_split_on_spaces_and_commas() {
    let users = decode_user_list("alice, bob carol");
    assert_eq!(users.len(), 3);
    assert!(users.contains("alice"));
    assert!(users.contains("bob"));
    assert!(users.contains("carol"));
    assert_eq!(encode_user_list(&users), "alice bob carol");
}

#[test]
fn test_user_list_empty() {
    assert!(decode_user_list("").is_empty());
    assert!(decode_user_list("  , ").is_empty());
}
